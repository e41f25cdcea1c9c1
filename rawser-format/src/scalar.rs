//! Fixed-width scalars, written as their raw in-memory image.
//!
//! The byte order is the host's own, so encoded bytes only travel between
//! processes of the same architecture.

use byteorder::{ByteOrder, NativeEndian};

use crate::size::ensure_available;
use crate::{Decode, DecodeError, DecodeResult, Encode, EncodedSize};

#[cfg(feature = "reader")]
use crate::{ByteSource, StreamError};

/// Widest scalar supported (`u128`/`i128`).
#[cfg(feature = "reader")]
const MAX_WIDTH: usize = 16;

/// A value with a fixed byte width and a raw native-order image.
pub trait FixedWidth: Sized + Copy {
    const WIDTH: usize;

    /// Write the raw image into `out`, which is exactly `WIDTH` bytes long.
    fn write_native(&self, out: &mut [u8]);

    /// Rebuild a value from exactly `WIDTH` raw bytes.
    fn read_native(raw: &[u8]) -> Result<Self, DecodeError>;
}

/// Append the raw image of `value` to `buf`.
pub fn encode_scalar<T: FixedWidth>(value: T, buf: &mut Vec<u8>) {
    let start = buf.len();
    buf.resize(start + T::WIDTH, 0);
    value.write_native(&mut buf[start..]);
}

/// Decode a scalar at `offset`, consuming exactly `T::WIDTH` bytes.
pub fn decode_scalar<T: FixedWidth>(data: &[u8], offset: usize) -> DecodeResult<T> {
    ensure_available(data, offset, T::WIDTH)?;
    let value = T::read_native(&data[offset..offset + T::WIDTH])?;
    Ok((value, EncodedSize::scalar(T::WIDTH)))
}

/// Read exactly `T::WIDTH` bytes from `source` and decode them.
#[cfg(feature = "reader")]
pub(crate) fn read_scalar<T: FixedWidth>(source: &mut ByteSource) -> Result<T, StreamError> {
    let mut raw = [0u8; MAX_WIDTH];
    let raw = &mut raw[..T::WIDTH];
    source.read(raw)?;
    Ok(T::read_native(raw)?)
}

macro_rules! fixed_width_via_byteorder {
    ($($ty:ty => $read:ident, $write:ident;)*) => {$(
        impl FixedWidth for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            #[inline]
            fn write_native(&self, out: &mut [u8]) {
                NativeEndian::$write(out, *self)
            }

            #[inline]
            fn read_native(raw: &[u8]) -> Result<Self, DecodeError> {
                Ok(NativeEndian::$read(raw))
            }
        }
    )*};
}

fixed_width_via_byteorder! {
    u16 => read_u16, write_u16;
    u32 => read_u32, write_u32;
    u64 => read_u64, write_u64;
    u128 => read_u128, write_u128;
    i16 => read_i16, write_i16;
    i32 => read_i32, write_i32;
    i64 => read_i64, write_i64;
    i128 => read_i128, write_i128;
    f32 => read_f32, write_f32;
    f64 => read_f64, write_f64;
}

// Pointer-sized integers have no `ByteOrder` entry point.
macro_rules! fixed_width_pointer_sized {
    ($($ty:ty),*) => {$(
        impl FixedWidth for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            #[inline]
            fn write_native(&self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_ne_bytes())
            }

            #[inline]
            fn read_native(raw: &[u8]) -> Result<Self, DecodeError> {
                let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                bytes.copy_from_slice(raw);
                Ok(<$ty>::from_ne_bytes(bytes))
            }
        }
    )*};
}

fixed_width_pointer_sized!(usize, isize);

impl FixedWidth for u8 {
    const WIDTH: usize = 1;

    #[inline]
    fn write_native(&self, out: &mut [u8]) {
        out[0] = *self;
    }

    #[inline]
    fn read_native(raw: &[u8]) -> Result<Self, DecodeError> {
        Ok(raw[0])
    }
}

impl FixedWidth for i8 {
    const WIDTH: usize = 1;

    #[inline]
    fn write_native(&self, out: &mut [u8]) {
        out[0] = *self as u8;
    }

    #[inline]
    fn read_native(raw: &[u8]) -> Result<Self, DecodeError> {
        Ok(raw[0] as i8)
    }
}

impl FixedWidth for bool {
    const WIDTH: usize = 1;

    #[inline]
    fn write_native(&self, out: &mut [u8]) {
        out[0] = *self as u8;
    }

    fn read_native(raw: &[u8]) -> Result<Self, DecodeError> {
        match raw[0] {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(DecodeError::InvalidBool(byte)),
        }
    }
}

impl FixedWidth for char {
    const WIDTH: usize = 4;

    #[inline]
    fn write_native(&self, out: &mut [u8]) {
        NativeEndian::write_u32(out, *self as u32)
    }

    fn read_native(raw: &[u8]) -> Result<Self, DecodeError> {
        let value = NativeEndian::read_u32(raw);
        char::from_u32(value).ok_or(DecodeError::InvalidChar(value))
    }
}

macro_rules! scalar_codec {
    ($($ty:ty),*) => {$(
        impl Encode for $ty {
            #[inline]
            fn encode_into(&self, buf: &mut Vec<u8>) {
                encode_scalar(*self, buf)
            }
        }

        impl Decode for $ty {
            #[inline]
            fn from_bytes(data: &[u8], offset: usize) -> DecodeResult<Self> {
                decode_scalar(data, offset)
            }

            #[cfg(feature = "reader")]
            fn read_from(source: &mut ByteSource) -> Result<Self, StreamError> {
                read_scalar(source)
            }
        }
    )*};
}

scalar_codec!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool, char);
