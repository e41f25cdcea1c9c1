//! Herein lies the brains of the `rawser` value encoding.
//!
//! Values are turned into a flat, host-native byte layout by [Encode] and
//! rebuilt by [Decode]. Scalars are written as their raw memory image, text and
//! sequences carry a `usize` length prefix, and maps are written as a key
//! sequence followed by a value sequence. The layout holds no type tags: the
//! reader must ask for the same shapes, in the same order, as the writer used.
//!
//! Use [ByteSink] to persist encoded values to a file, and [ByteSource] to read
//! them back.

mod codec;
mod counting;
mod error;
mod map;
mod scalar;
mod seq;
pub mod shape;
mod size;
pub mod stream;
mod text;

pub use codec::{Decode, DecodeCursor, Encode};
pub use error::{DecodeError, StreamError};
pub use scalar::{decode_scalar, encode_scalar, FixedWidth};
pub use shape::{Shape, ShapeError, ShapeParseError};
pub use size::{DecodeResult, EncodedSize};
pub use stream::StreamConfig;
#[cfg(feature = "reader")]
pub use stream::ByteSource;
#[cfg(feature = "writer")]
pub use stream::ByteSink;
