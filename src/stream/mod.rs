//! Streaming transforms over raw process output.
//!
//! Both transforms are plain state machines: feed chunks with `push`, take
//! the remainder with `finish`. The async helpers here drive them from any
//! [`AsyncRead`].

mod lines;
mod tail;

pub use lines::{LineReconstructor, DEFAULT_LINE_CAPACITY};
pub use tail::TailBuffer;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Size of the scratch buffer used when reading from a stream.
pub const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Error type for stream transform construction.
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    /// A transform was configured with a zero capacity.
    #[error("Stream capacity must be greater than zero")]
    ZeroCapacity,
}

/// A byte-stream transform with explicit state.
pub trait StreamTransform {
    /// Item emitted by the transform.
    type Output;

    /// Feed the next chunk, returning whatever became complete.
    fn push(&mut self, chunk: &[u8]) -> Vec<Self::Output>;

    /// Consume the transform, returning any buffered remainder.
    fn finish(self) -> Option<Self::Output>;
}

/// Drive a transform to completion over a reader.
///
/// # Errors
///
/// Returns any I/O error raised by the reader.
pub async fn run_transform<R, T>(
    mut reader: R,
    mut transform: T,
) -> std::io::Result<Vec<T::Output>>
where
    R: AsyncRead + Unpin,
    T: StreamTransform,
{
    let mut out = Vec::new();
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        out.extend(transform.push(&buf[..n]));
    }
    out.extend(transform.finish());
    Ok(out)
}

/// Drain a reader, keeping only its last `capacity` bytes.
///
/// # Errors
///
/// Returns any I/O error raised by the reader.
pub async fn read_tail<R>(reader: R, tail: TailBuffer) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut out = run_transform(reader, tail).await?;
    Ok(out.pop().unwrap_or_default())
}

/// Stream reconstructed terminal lines from a reader as they complete.
///
/// The unterminated remainder, if any, is yielded last.
pub fn line_stream<R>(
    reader: R,
    lines: LineReconstructor,
) -> impl futures_core::Stream<Item = std::io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    struct State<R> {
        reader: R,
        lines: LineReconstructor,
        ready: std::collections::VecDeque<Vec<u8>>,
        buf: Vec<u8>,
        done: bool,
    }

    let state = State {
        reader,
        lines,
        ready: std::collections::VecDeque::new(),
        buf: vec![0u8; READ_CHUNK_SIZE],
        done: false,
    };

    futures_util::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.ready.pop_front() {
                return Some((Ok(line), state));
            }
            if state.done {
                return None;
            }
            match state.reader.read(&mut state.buf).await {
                Ok(0) => {
                    state.done = true;
                    state.ready.extend(state.lines.flush());
                }
                Ok(n) => {
                    let completed = state.lines.push(&state.buf[..n]);
                    state.ready.extend(completed);
                }
                Err(e) => {
                    state.done = true;
                    return Some((Err(e), state));
                }
            }
        }
    })
}
