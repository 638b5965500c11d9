//! Image fetch-and-stream reader
//!
//! Pulls one compressed still from the camera endpoint into the
//! [`StreamBuffer`](crate::buffer::StreamBuffer). The HTTP collaborator is
//! abstracted behind [`CameraClient`]/[`ByteStream`] so the copy loop can
//! be exercised on the host with scripted streams.
//!
//! The contract is all-or-nothing: on success the buffer holds exactly the
//! declared body length (or everything until disconnect for chunked
//! responses); on any error the buffer is left empty and the cycle is
//! abandoned. The caller retries on the next loop iteration.

use core::fmt;

use thiserror::Error;

use crate::buffer::StreamBuffer;

/// One blocking HTTP exchange against the camera endpoint
pub trait CameraClient {
    /// Response body stream, live for one fetch cycle
    type Stream: ByteStream<Error = Self::Error>;
    /// Transport-level failure
    type Error: fmt::Debug + fmt::Display;

    /// Issue a GET and return the response status with its body stream
    fn get(&mut self, url: &str) -> Result<(u16, Self::Stream), Self::Error>;
}

/// Byte delivery side of an open HTTP response
pub trait ByteStream {
    type Error: fmt::Debug + fmt::Display;

    /// Declared body length, `None` for chunked/unknown-length responses
    fn declared_len(&self) -> Option<usize>;

    /// True while the underlying connection is open
    fn connected(&self) -> bool;

    /// Copy available bytes into `buf`. `Ok(0)` means nothing is available
    /// right now; it is not end-of-stream, which is signalled by
    /// [`connected`](Self::connected) going false.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Tuning for the copy loop
#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    /// Consecutive empty polls tolerated while the connection stays open.
    /// Bounds the stall window on links that stop delivering without
    /// disconnecting.
    pub max_idle_polls: u32,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            max_idle_polls: 10_000,
        }
    }
}

/// Fetch cycle failures. All are non-fatal; the cycle is abandoned and the
/// next loop iteration re-fetches independently.
#[derive(Debug, Error)]
pub enum FetchError<E: fmt::Debug + fmt::Display> {
    /// Request or connection failure below HTTP
    #[error("transport: {0}")]
    Transport(E),
    /// Response status was not 200 OK
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    /// Declared content length of zero
    #[error("empty response body")]
    EmptyBody,
    /// Connection closed before the declared length arrived
    #[error("connection closed after {received} of {expected} bytes")]
    Truncated { expected: usize, received: usize },
    /// Connection stayed open but stopped delivering bytes
    #[error("stream stalled after {received} bytes")]
    Stalled { received: usize },
    /// Declared length exceeds the streaming buffer capacity
    #[error("declared length {declared} exceeds buffer capacity {capacity}")]
    Overflow { declared: usize, capacity: usize },
    /// Unknown-length body filled the buffer with bytes still arriving
    #[error("unsized body exceeds buffer capacity {capacity}")]
    BufferFull { capacity: usize },
}

/// Fetch one image into `buffer`.
///
/// On success the buffer's valid region holds the complete body and its
/// length is returned. On error the buffer is reset and holds nothing.
pub fn fetch_image<C: CameraClient>(
    client: &mut C,
    url: &str,
    buffer: &mut StreamBuffer,
    limits: &FetchLimits,
) -> Result<usize, FetchError<C::Error>> {
    buffer.reset();

    let (status, mut stream) = client.get(url).map_err(FetchError::Transport)?;
    if status != 200 {
        return Err(FetchError::Status(status));
    }

    let declared = stream.declared_len();
    if declared == Some(0) {
        return Err(FetchError::EmptyBody);
    }
    if let Some(expected) = declared {
        if expected > buffer.capacity() {
            return Err(FetchError::Overflow {
                declared: expected,
                capacity: buffer.capacity(),
            });
        }
    }

    match copy_body(&mut stream, buffer, declared, limits) {
        Ok(len) => Ok(len),
        Err(e) => {
            // Partial data must not be observable by the decoder
            buffer.reset();
            Err(e)
        }
    }
}

/// The copy loop: take the lesser of (bytes available, remaining room) per
/// iteration until the expected length is reached or the connection closes.
fn copy_body<S: ByteStream>(
    stream: &mut S,
    buffer: &mut StreamBuffer,
    declared: Option<usize>,
    limits: &FetchLimits,
) -> Result<usize, FetchError<S::Error>> {
    let mut idle_polls = 0u32;

    loop {
        let done = match declared {
            Some(expected) => buffer.len() >= expected,
            None => false,
        };
        if done {
            break;
        }
        if !stream.connected() {
            // Chunked responses end exactly here; sized responses that
            // close early are truncated.
            match declared {
                Some(expected) => {
                    return Err(FetchError::Truncated {
                        expected,
                        received: buffer.len(),
                    })
                }
                None => break,
            }
        }
        if buffer.remaining() == 0 {
            // Sized responses were bounds-checked up front, so only an
            // unknown-length body can land here.
            return Err(FetchError::BufferFull {
                capacity: buffer.capacity(),
            });
        }

        let n = stream
            .read(buffer.spare_mut())
            .map_err(FetchError::Transport)?;
        if n == 0 {
            idle_polls += 1;
            if idle_polls > limits.max_idle_polls {
                return Err(FetchError::Stalled {
                    received: buffer.len(),
                });
            }
            continue;
        }
        idle_polls = 0;
        buffer.advance(n);
    }

    if buffer.is_empty() {
        return Err(FetchError::EmptyBody);
    }
    Ok(buffer.len())
}
