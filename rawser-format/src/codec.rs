use crate::size::ensure_available;
use crate::{DecodeError, DecodeResult, EncodedSize};

#[cfg(feature = "reader")]
use crate::{ByteSource, StreamError};
#[cfg(feature = "writer")]
use crate::ByteSink;
#[cfg(all(feature = "writer", not(feature = "reader")))]
use crate::StreamError;

/// A value that can append its own byte layout to a buffer.
///
/// Implement this (together with [Decode]) to make a type usable anywhere a
/// built-in scalar, text, sequence or map is: as a top-level value, as a
/// sequence element, or as a map key or value. Fields are usually written by
/// calling `encode_into` on each of them in turn.
pub trait Encode {
    /// Append the encoding of `self` to `buf`.
    fn encode_into(&self, buf: &mut Vec<u8>);

    /// Encode `self` into a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf);
        buf
    }

    /// Encode `self` and push the bytes through `sink`.
    #[cfg(feature = "writer")]
    fn write_to(&self, sink: &mut ByteSink) -> Result<(), StreamError> {
        sink.write(&self.to_bytes())
    }
}

/// A value that can rebuild itself from a byte buffer.
pub trait Decode: Sized {
    /// Decode a value starting at the absolute position `offset` of `data`.
    ///
    /// On success the returned [EncodedSize::consumed] is exactly the number
    /// of bytes read, so the next value starts at `offset + consumed`. When
    /// the buffer ends early this must fail with
    /// [DecodeError::TruncatedInput] carrying the number of missing bytes.
    fn from_bytes(data: &[u8], offset: usize) -> DecodeResult<Self>;

    /// Decode exactly one value spanning the whole of `data`.
    fn decode_exact(data: &[u8]) -> Result<Self, DecodeError> {
        let (value, size) = Self::from_bytes(data, 0)?;
        match data.len().saturating_sub(size.consumed) {
            0 => Ok(value),
            left => Err(DecodeError::TrailingBytes(left)),
        }
    }

    /// Pull one value out of `source`.
    ///
    /// The default gathers bytes incrementally, reading only as many as
    /// [Decode::from_bytes] reports missing, so it never reads past the end of
    /// the value.
    #[cfg(feature = "reader")]
    fn read_from(source: &mut ByteSource) -> Result<Self, StreamError> {
        source.read_decoded(Self::from_bytes)
    }
}

/// Position tracker for decoding several fields back to back.
///
/// ```
/// use rawser_format::{Decode, DecodeCursor, DecodeResult, Encode};
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Decode for Point {
///     fn from_bytes(data: &[u8], offset: usize) -> DecodeResult<Self> {
///         let mut cursor = DecodeCursor::new(data, offset);
///         let x = cursor.decode()?;
///         let y = cursor.decode()?;
///         Ok((Point { x, y }, cursor.finish(2)))
///     }
/// }
///
/// let mut buf = 3i32.to_bytes();
/// 4i32.encode_into(&mut buf);
/// let point = Point::decode_exact(&buf).unwrap();
/// assert_eq!((point.x, point.y), (3, 4));
/// ```
#[derive(Debug, Clone)]
pub struct DecodeCursor<'a> {
    data: &'a [u8],
    start: usize,
    offset: usize,
}

impl<'a> DecodeCursor<'a> {
    pub fn new(data: &'a [u8], offset: usize) -> Self {
        Self {
            data,
            start: offset,
            offset,
        }
    }

    /// Decode the next value and advance past it.
    pub fn decode<T: Decode>(&mut self) -> Result<T, DecodeError> {
        self.decode_with(T::from_bytes)
    }

    /// Decode the next value with an explicit decode function and advance
    /// past the bytes it reports consumed.
    pub fn decode_with<T, F>(&mut self, decode: F) -> Result<T, DecodeError>
    where
        F: FnOnce(&'a [u8], usize) -> DecodeResult<T>,
    {
        let (value, size) = decode(self.data, self.offset)?;
        self.offset += size.consumed;
        Ok(value)
    }

    /// Borrow the next `len` raw bytes and advance past them.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        ensure_available(self.data, self.offset, len)?;
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    /// Absolute position of the next byte to read.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes read since the cursor was created.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.offset - self.start
    }

    /// Bytes left in the buffer after the current position.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    pub fn finish(self, logical_size: usize) -> EncodedSize {
        EncodedSize::new(self.consumed(), logical_size)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    #[inline]
    fn encode_into(&self, buf: &mut Vec<u8>) {
        (**self).encode_into(buf)
    }
}

impl<T: Encode + ?Sized> Encode for &mut T {
    #[inline]
    fn encode_into(&self, buf: &mut Vec<u8>) {
        (**self).encode_into(buf)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    #[inline]
    fn encode_into(&self, buf: &mut Vec<u8>) {
        (**self).encode_into(buf)
    }
}

impl<T: Decode> Decode for Box<T> {
    fn from_bytes(data: &[u8], offset: usize) -> DecodeResult<Self> {
        let (value, size) = T::from_bytes(data, offset)?;
        Ok((Box::new(value), size))
    }

    #[cfg(feature = "reader")]
    fn read_from(source: &mut ByteSource) -> Result<Self, StreamError> {
        T::read_from(source).map(Box::new)
    }
}
