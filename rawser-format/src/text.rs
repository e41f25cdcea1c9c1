use crate::scalar::encode_scalar;
use crate::{Decode, DecodeCursor, DecodeError, DecodeResult, Encode};

#[cfg(feature = "reader")]
use crate::scalar::read_scalar;
#[cfg(feature = "reader")]
use crate::{ByteSource, StreamError};

/// Encode a `usize` byte length followed by the bytes themselves.
pub(crate) fn encode_raw(bytes: &[u8], buf: &mut Vec<u8>) {
    encode_scalar(bytes.len(), buf);
    buf.extend_from_slice(bytes);
}

/// Decode a length-prefixed run of bytes, borrowing from `data`.
///
/// `logical_size` is the content length, `consumed` includes the prefix.
pub(crate) fn decode_raw(data: &[u8], offset: usize) -> DecodeResult<&[u8]> {
    let mut cursor = DecodeCursor::new(data, offset);
    let len: usize = cursor.decode()?;
    let bytes = cursor.take(len)?;
    Ok((bytes, cursor.finish(len)))
}

impl Encode for str {
    #[inline]
    fn encode_into(&self, buf: &mut Vec<u8>) {
        encode_raw(self.as_bytes(), buf)
    }
}

impl Encode for String {
    #[inline]
    fn encode_into(&self, buf: &mut Vec<u8>) {
        self.as_str().encode_into(buf)
    }
}

impl Decode for String {
    fn from_bytes(data: &[u8], offset: usize) -> DecodeResult<Self> {
        let (bytes, size) = decode_raw(data, offset)?;
        let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
        Ok((text.to_owned(), size))
    }

    #[cfg(feature = "reader")]
    fn read_from(source: &mut ByteSource) -> Result<Self, StreamError> {
        let len: usize = read_scalar(source)?;
        let bytes = source.read_vec(len)?;
        String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8.into())
    }
}
