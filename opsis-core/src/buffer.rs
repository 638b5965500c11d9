//! Fixed streaming buffer
//!
//! One process-wide byte arena stages the in-flight camera image. It is
//! filled by the fetch reader, read by the decoder, and overwritten in
//! place every cycle. There is never more than one fetch in flight, so
//! the single-writer rule is enforced by loop sequencing alone.

/// Buffer capacity in bytes. Sized for the largest expected compressed
/// still from the camera endpoint.
pub const STREAM_CAPACITY: usize = 20_000;

/// Fixed-capacity byte arena for one compressed image
pub struct StreamBuffer {
    storage: Box<[u8]>,
    len: usize,
}

impl Default for StreamBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamBuffer {
    /// Create an empty buffer with [`STREAM_CAPACITY`] bytes of storage
    pub fn new() -> Self {
        Self {
            storage: vec![0u8; STREAM_CAPACITY].into_boxed_slice(),
            len: 0,
        }
    }

    /// Total capacity in bytes
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Length of the valid region
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no valid bytes are staged
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Room left for the current fill
    pub fn remaining(&self) -> usize {
        self.storage.len() - self.len
    }

    /// Discard the valid region. Called at the start of every fetch cycle
    /// and whenever a cycle is abandoned, so a failed fetch can never leak
    /// a stale length to the decoder.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Append a chunk, copying at most the remaining room. Returns the
    /// number of bytes actually copied; excess bytes are dropped, the
    /// buffer never grows.
    pub fn write(&mut self, chunk: &[u8]) -> usize {
        let n = chunk.len().min(self.remaining());
        self.storage[self.len..self.len + n].copy_from_slice(&chunk[..n]);
        self.len += n;
        n
    }

    /// The valid region staged by the last successful fill
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[..self.len]
    }

    /// Mutable view of the unfilled tail, for readers that copy directly
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.len..]
    }

    /// Mark `n` bytes of the spare tail as valid after a direct read
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.remaining());
        self.len += n.min(self.remaining());
    }
}
