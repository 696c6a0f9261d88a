// src/frame_source/raw_stream.rs

use super::{FrameSource, FrameStamper};
use crate::error::SourceError;
use crate::types::Frame;
use std::io::{ErrorKind, Read};

/// Fixed-size raw `bgr24` frames read back to back from a byte stream,
/// typically an external decoder piped into stdin.
pub struct RawStreamSource<R> {
    reader: R,
    width: usize,
    height: usize,
    stamper: FrameStamper,
}

impl<R: Read + Send> RawStreamSource<R> {
    pub fn new(reader: R, width: usize, height: usize) -> Self {
        Self {
            reader,
            width,
            height,
            stamper: FrameStamper::new(),
        }
    }

    fn frame_len(&self) -> usize {
        self.width * self.height * Frame::CHANNELS
    }
}

impl<R: Read + Send> FrameSource for RawStreamSource<R> {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        let mut data = vec![0u8; self.frame_len()];
        match self.reader.read_exact(&mut data) {
            Ok(()) => Ok(self.stamper.stamp(data, self.width, self.height)),
            // A partial trailing frame is dropped along with the stream
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(SourceError::Exhausted),
            Err(e) => Err(SourceError::unavailable(format!("read failed: {}", e))),
        }
    }

    fn name(&self) -> String {
        format!("raw bgr24 stream {}x{}", self.width, self.height)
    }
}
