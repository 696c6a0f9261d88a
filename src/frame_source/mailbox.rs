// src/frame_source/mailbox.rs
//
// Latest-frame mailbox. A reader thread pulls from the wrapped source as
// fast as it delivers and keeps only the newest frame; the control loop
// takes whatever is newest when it is ready for a tick. Stale frames are
// dropped, never queued.

use super::FrameSource;
use crate::error::SourceError;
use crate::types::Frame;
use anyhow::{Context, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Back-off after the wrapped source reports itself unavailable
const RETRY_DELAY: Duration = Duration::from_millis(10);

pub struct MailboxSource {
    rx: Receiver<Frame>,
    timeout: Duration,
    name: String,
    stop: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    reader: Option<JoinHandle<()>>,
}

impl MailboxSource {
    pub fn spawn<S>(source: S, timeout: Duration) -> Result<Self>
    where
        S: FrameSource + 'static,
    {
        let name = format!("mailbox({})", source.name());
        let (tx, rx) = bounded::<Frame>(1);
        let stop = Arc::new(AtomicBool::new(false));
        let dropped = Arc::new(AtomicU64::new(0));

        let reader = {
            let drain = rx.clone();
            let stop = Arc::clone(&stop);
            let dropped = Arc::clone(&dropped);
            thread::Builder::new()
                .name("frame-reader".to_owned())
                .spawn(move || read_frames(source, tx, drain, stop, dropped))
                .context("Failed to spawn frame reader thread")?
        };

        info!("Started {}", name);

        Ok(Self {
            rx,
            timeout,
            name,
            stop,
            dropped,
            reader: Some(reader),
        })
    }

    /// Frames overwritten before the loop got to them
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

fn read_frames<S: FrameSource>(
    mut source: S,
    tx: Sender<Frame>,
    drain: Receiver<Frame>,
    stop: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
) {
    while !stop.load(Ordering::Relaxed) {
        match source.next_frame() {
            Ok(frame) => publish(&tx, &drain, frame, &dropped),
            Err(SourceError::Exhausted) => {
                info!("{} exhausted, reader stopping", source.name());
                break;
            }
            Err(SourceError::Unavailable(reason)) => {
                debug!("Reader: {}", reason);
                thread::sleep(RETRY_DELAY);
            }
        }
    }
    // Dropping `tx` here lets the consumer see the disconnect
}

/// Replace whatever is waiting in the slot with `frame`.
fn publish(tx: &Sender<Frame>, drain: &Receiver<Frame>, frame: Frame, dropped: &AtomicU64) {
    let mut frame = frame;
    loop {
        match tx.try_send(frame) {
            Ok(()) => return,
            Err(TrySendError::Full(f)) => {
                if drain.try_recv().is_ok() {
                    dropped.fetch_add(1, Ordering::Relaxed);
                }
                frame = f;
            }
            Err(TrySendError::Disconnected(_)) => return,
        }
    }
}

impl FrameSource for MailboxSource {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        match self.rx.recv_timeout(self.timeout) {
            Ok(frame) => Ok(frame),
            Err(RecvTimeoutError::Timeout) => Err(SourceError::unavailable(format!(
                "no frame within {} ms",
                self.timeout.as_millis()
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(SourceError::Exhausted),
        }
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

impl Drop for MailboxSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        info!(
            "Stopped {} ({} stale frames dropped)",
            self.name,
            self.dropped_frames()
        );
        if let Some(reader) = self.reader.take() {
            // The reader may be parked in a blocking read; only join if it is done
            if reader.is_finished() && reader.join().is_err() {
                warn!("Frame reader thread panicked");
            }
        }
    }
}
