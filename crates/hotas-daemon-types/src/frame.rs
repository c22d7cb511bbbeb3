use std::io::{self, BufRead, BufReader, Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Largest accepted frame, excluding the terminating newline.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Errors raised while reading or writing frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The peer sent more than the frame limit without a newline.
    #[error("frame exceeds {limit} bytes")]
    Oversized {
        /// Frame limit in bytes.
        limit: usize,
    },
    /// The stream ended part-way through a frame.
    #[error("stream ended after {received} bytes of an unterminated frame")]
    Truncated {
        /// Bytes received before end-of-stream.
        received: usize,
    },
    /// The frame was not a valid JSON document of the expected shape.
    #[error("undecodable frame: {0}")]
    Decode(#[source] serde_json::Error),
    /// A value could not be encoded.
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
    /// The underlying stream failed.
    #[error("frame IO failed: {0}")]
    Io(#[from] io::Error),
}

impl FrameError {
    /// Reports whether the failure was a read timeout on an idle stream.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Io(error)
                if matches!(error.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
        )
    }
}

/// Reads newline-terminated frames from a byte stream.
///
/// Bytes after a newline stay buffered, so back-to-back frames sent in one
/// write are returned one at a time.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: BufReader<R>,
    limit: usize,
}

impl<R: Read> FrameReader<R> {
    /// Wraps `reader` with the default [`MAX_FRAME_BYTES`] limit.
    pub fn new(reader: R) -> Self {
        Self::with_limit(reader, MAX_FRAME_BYTES)
    }

    /// Wraps `reader` with a custom frame limit.
    pub fn with_limit(reader: R, limit: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            limit,
        }
    }

    /// Reads the next frame without its newline.
    ///
    /// Returns `Ok(None)` on a clean end-of-stream between frames.
    ///
    /// # Errors
    ///
    /// Fails with [`FrameError::Oversized`] or [`FrameError::Truncated`] on
    /// malformed framing and with [`FrameError::Io`] when the stream fails.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        let allowance = u64::try_from(self.limit)
            .unwrap_or(u64::MAX)
            .saturating_add(1);
        let mut frame = Vec::new();
        let read = (&mut self.inner)
            .take(allowance)
            .read_until(b'\n', &mut frame)?;
        if read == 0 {
            return Ok(None);
        }
        if frame.last() == Some(&b'\n') {
            frame.pop();
            if frame.last() == Some(&b'\r') {
                frame.pop();
            }
            return Ok(Some(frame));
        }
        if frame.len() > self.limit {
            Err(FrameError::Oversized { limit: self.limit })
        } else {
            Err(FrameError::Truncated {
                received: frame.len(),
            })
        }
    }

    /// Borrows the wrapped reader.
    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }
}

/// Serialises `value` as one frame and flushes the writer.
///
/// # Errors
///
/// Fails when encoding or writing fails.
pub fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), FrameError>
where
    W: Write + ?Sized,
    T: Serialize + ?Sized,
{
    let mut encoded = serde_json::to_vec(value).map_err(FrameError::Encode)?;
    encoded.push(b'\n');
    writer.write_all(&encoded)?;
    writer.flush()?;
    Ok(())
}

/// Decodes one frame into `T`.
///
/// # Errors
///
/// Fails with [`FrameError::Decode`] when the bytes are not a JSON
/// document of the expected shape.
pub fn decode_frame<T: DeserializeOwned>(frame: &[u8]) -> Result<T, FrameError> {
    serde_json::from_slice(frame).map_err(FrameError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Request, Response};
    use std::io::Cursor;

    #[test]
    fn reads_back_to_back_frames() {
        let mut reader = FrameReader::new(Cursor::new(b"{\"a\":1}\n{\"b\":2}\r\n".to_vec()));
        assert_eq!(
            reader.read_frame().expect("first").as_deref(),
            Some(&b"{\"a\":1}"[..])
        );
        assert_eq!(
            reader.read_frame().expect("second").as_deref(),
            Some(&b"{\"b\":2}"[..])
        );
        assert!(reader.read_frame().expect("eof").is_none());
    }

    #[test]
    fn rejects_oversized_frames() {
        let mut reader = FrameReader::with_limit(Cursor::new(vec![b'x'; 32]), 8);
        let error = reader.read_frame().expect_err("frame too large");
        assert!(matches!(error, FrameError::Oversized { limit: 8 }));
    }

    #[test]
    fn accepts_frame_at_limit() {
        let mut bytes = vec![b'x'; 8];
        bytes.push(b'\n');
        let mut reader = FrameReader::with_limit(Cursor::new(bytes), 8);
        let frame = reader.read_frame().expect("frame").expect("present");
        assert_eq!(frame.len(), 8);
    }

    #[test]
    fn reports_truncated_frames() {
        let mut reader = FrameReader::new(Cursor::new(b"{\"command\":".to_vec()));
        let error = reader.read_frame().expect_err("unterminated");
        assert!(matches!(error, FrameError::Truncated { received: 11 }));
    }

    #[test]
    fn embedded_newlines_stay_escaped() {
        let request = Request::new("set-mfd").with_argument("text", "two\nlines");
        let mut buffer = Vec::new();
        write_frame(&mut buffer, &request).expect("write");
        assert_eq!(buffer.iter().filter(|byte| **byte == b'\n').count(), 1);

        let mut reader = FrameReader::new(Cursor::new(buffer));
        let frame = reader.read_frame().expect("read").expect("present");
        let decoded: Request = decode_frame(&frame).expect("decode");
        assert_eq!(decoded, request);
    }

    #[test]
    fn decode_rejects_wrong_shape() {
        let error = decode_frame::<Response>(b"[1,2,3]").expect_err("not a response");
        assert!(matches!(error, FrameError::Decode(_)));
    }
}
