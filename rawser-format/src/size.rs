use crate::DecodeError;

/// What a decode step reports besides the value itself.
///
/// `consumed` is the exact number of bytes read from the source buffer and is
/// the only thing a caller may use to advance its cursor. `logical_size` is
/// informational: the element count of a container, the byte length of a text
/// or the width of a scalar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EncodedSize {
    pub consumed: usize,
    pub logical_size: usize,
}

impl EncodedSize {
    #[inline]
    pub const fn new(consumed: usize, logical_size: usize) -> Self {
        Self {
            consumed,
            logical_size,
        }
    }

    /// Size of a fixed-width scalar, which consumes exactly its width.
    #[inline]
    pub const fn scalar(width: usize) -> Self {
        Self::new(width, width)
    }
}

pub type DecodeResult<T> = Result<(T, EncodedSize), DecodeError>;

/// Check that `len` bytes are available at `offset`.
#[inline]
pub(crate) fn ensure_available(data: &[u8], offset: usize, len: usize) -> Result<(), DecodeError> {
    let available = data.len().saturating_sub(offset);
    if available < len {
        return Err(DecodeError::TruncatedInput {
            offset,
            needed: len - available,
        });
    }
    Ok(())
}
