//! Bounded tail buffer.
//!
//! Retains only the most recent `capacity` bytes of an unbounded byte
//! stream. Used to keep a diagnostic tail of git output without holding the
//! whole stream in memory.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use super::{StreamError, StreamTransform};

/// Accumulator that keeps the last `capacity` bytes pushed into it.
///
/// Chunks are stored as received and trimmed from the front when the total
/// exceeds the capacity, so memory stays bounded by `capacity` plus the
/// largest single chunk.
#[derive(Debug, Clone)]
pub struct TailBuffer {
    capacity: usize,
    chunks: VecDeque<Vec<u8>>,
    total_len: usize,
}

impl TailBuffer {
    /// Create a tail buffer holding at most `capacity` bytes.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity: capacity.get(),
            chunks: VecDeque::new(),
            total_len: 0,
        }
    }

    /// Create a tail buffer from an unchecked capacity.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::ZeroCapacity` if `capacity` is zero.
    pub fn try_new(capacity: usize) -> Result<Self, StreamError> {
        NonZeroUsize::new(capacity)
            .map(Self::new)
            .ok_or(StreamError::ZeroCapacity)
    }

    /// Maximum number of bytes retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.total_len
    }

    /// Check whether nothing is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_len == 0
    }

    /// Append a chunk, evicting the oldest bytes beyond capacity.
    pub fn push(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        self.chunks.push_back(chunk.to_vec());
        self.total_len += chunk.len();

        while self.total_len > self.capacity {
            let overrun = self.total_len - self.capacity;
            let Some(oldest) = self.chunks.front_mut() else {
                break;
            };
            if overrun >= oldest.len() {
                self.total_len -= oldest.len();
                self.chunks.pop_front();
            } else {
                oldest.drain(..overrun);
                self.total_len -= overrun;
            }
        }

        debug_assert_eq!(
            self.chunks.iter().map(Vec::len).sum::<usize>(),
            self.total_len
        );
    }

    /// Consume the buffer, returning the retained tail.
    ///
    /// Returns `None` if nothing was ever retained.
    #[must_use]
    pub fn finish(self) -> Option<Vec<u8>> {
        if self.chunks.is_empty() {
            return None;
        }
        let mut out = Vec::with_capacity(self.total_len);
        for chunk in self.chunks {
            out.extend_from_slice(&chunk);
        }
        Some(out)
    }
}

impl StreamTransform for TailBuffer {
    type Output = Vec<u8>;

    fn push(&mut self, chunk: &[u8]) -> Vec<Self::Output> {
        TailBuffer::push(self, chunk);
        Vec::new()
    }

    fn finish(self) -> Option<Self::Output> {
        TailBuffer::finish(self)
    }
}
