//! File-backed byte sink and source.
//!
//! Both adapters are bound to a path at construction, hold no file handle
//! until [`open`](ByteSink::open) is called, and release it on
//! [`close`](ByteSink::close) or when dropped. They move raw bytes only; the
//! codec layers on top by encoding a value and writing the buffer, or by
//! reading exactly the bytes the next field declares and decoding them.

#[cfg(feature = "writer")]
mod sink;
#[cfg(feature = "reader")]
mod source;

#[cfg(feature = "writer")]
pub use sink::ByteSink;
#[cfg(feature = "reader")]
pub use source::ByteSource;

/// 64KiB buffer for the underlying file handle.
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Options shared by [ByteSink] and [ByteSource].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub buffer_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl StreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the buffer size used for the file handle.
    pub fn with_buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = buffer_capacity;
        self
    }
}
