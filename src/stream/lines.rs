//! Terminal line reconstruction.
//!
//! Turns raw terminal output into discrete lines the way a terminal would
//! render them: `\n` ends a line, `\r` returns to column zero and later
//! bytes overwrite what was already written. Progress bars rely on the
//! latter to redraw a single line in place.

use std::num::NonZeroUsize;

use super::{StreamError, StreamTransform};

/// Default maximum line length, including the terminator.
pub const DEFAULT_LINE_CAPACITY: usize = 1024;

const LINE_FEED: u8 = b'\n';
const CARRIAGE_RETURN: u8 = b'\r';

/// Reassembles terminal lines from a raw byte stream.
///
/// State is kept across calls to [`LineReconstructor::push`], so a line
/// split over several chunks comes out whole.
#[derive(Debug, Clone)]
pub struct LineReconstructor {
    buf: Vec<u8>,
    /// Write cursor.
    pos: usize,
    /// High-water mark of written bytes since the last emitted line.
    len: usize,
}

impl LineReconstructor {
    /// Create a reconstructor that force-emits a line once it reaches
    /// `capacity` bytes.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            buf: vec![0; capacity.get() - 1],
            pos: 0,
            len: 0,
        }
    }

    /// Create a reconstructor from an unchecked capacity.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::ZeroCapacity` if `capacity` is zero.
    pub fn try_new(capacity: usize) -> Result<Self, StreamError> {
        NonZeroUsize::new(capacity)
            .map(Self::new)
            .ok_or(StreamError::ZeroCapacity)
    }

    /// Maximum emitted line length, terminator included.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len() + 1
    }

    /// Bytes of the line currently being assembled.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Feed a chunk, returning every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == LINE_FEED || self.len == self.buf.len() {
                let mut line = Vec::with_capacity(self.len + 1);
                line.extend_from_slice(&self.buf[..self.len]);
                line.push(byte);
                lines.push(line);
                self.reset();
            } else if byte == CARRIAGE_RETURN {
                self.pos = 0;
            } else {
                self.buf[self.pos] = byte;
                self.pos += 1;
                self.len = self.len.max(self.pos);
            }
        }
        lines
    }

    /// Emit the unterminated remainder, if any, and reset.
    pub fn flush(&mut self) -> Option<Vec<u8>> {
        if self.len == 0 {
            return None;
        }
        let line = self.buf[..self.len].to_vec();
        self.reset();
        Some(line)
    }

    fn reset(&mut self) {
        self.pos = 0;
        self.len = 0;
    }
}

impl Default for LineReconstructor {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_LINE_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl StreamTransform for LineReconstructor {
    type Output = Vec<u8>;

    fn push(&mut self, chunk: &[u8]) -> Vec<Self::Output> {
        LineReconstructor::push(self, chunk)
    }

    fn finish(mut self) -> Option<Self::Output> {
        self.flush()
    }
}
