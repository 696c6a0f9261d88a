// src/frame_source/mod.rs
//
// Where frames come from. Every source hands out fully buffered BGR frames
// stamped with a monotonically increasing id and a capture time.

#[cfg(feature = "opencv")]
mod capture;
mod image_dir;
mod mailbox;
mod raw_stream;

#[cfg(feature = "opencv")]
pub use capture::CaptureSource;
pub use image_dir::ImageDirSource;
pub use mailbox::MailboxSource;
pub use raw_stream::RawStreamSource;

use crate::error::SourceError;
use crate::types::Frame;
use std::time::Instant;

/// Blocking supplier of one frame per tick.
pub trait FrameSource: Send {
    /// Wait for the next complete frame.
    fn next_frame(&mut self) -> Result<Frame, SourceError>;

    /// Short description for logs
    fn name(&self) -> String;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        (**self).next_frame()
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

/// Assigns frame ids and timestamps relative to when the source opened.
#[derive(Debug)]
pub(crate) struct FrameStamper {
    next_id: u64,
    started: Instant,
}

impl FrameStamper {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            started: Instant::now(),
        }
    }

    pub(crate) fn stamp(&mut self, data: Vec<u8>, width: usize, height: usize) -> Frame {
        let frame_id = self.next_id;
        self.next_id += 1;
        Frame {
            data,
            width,
            height,
            frame_id,
            timestamp_ms: self.started.elapsed().as_secs_f64() * 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamper_ids_and_timestamps_increase() {
        let mut stamper = FrameStamper::new();
        let a = stamper.stamp(vec![0; 3], 1, 1);
        let b = stamper.stamp(vec![0; 3], 1, 1);
        assert_eq!(a.frame_id, 0);
        assert_eq!(b.frame_id, 1);
        assert!(b.timestamp_ms >= a.timestamp_ms);
    }
}
