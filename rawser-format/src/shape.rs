//! Shape-described decoding and encoding to and from JSON values.
//!
//! The byte layout carries no type information, so tools that do not know the
//! Rust types at compile time describe the expected layout with a [Shape]
//! instead, e.g. `map<text, seq<i32>>`. Leaves reuse the typed codecs, so a
//! shape reads and writes exactly the bytes the matching Rust type would.

use std::fmt;
use std::str::FromStr;

use serde_json::{Number, Value};

use crate::{Decode, DecodeCursor, DecodeError, DecodeResult, Encode};

#[cfg(feature = "reader")]
use crate::{ByteSource, StreamError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    Bool,
    Char,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    F32,
    F64,
    Text,
    Seq(Box<Shape>),
    Map(Box<Shape>, Box<Shape>),
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Seq(element) => write!(f, "seq<{}>", element),
            Shape::Map(key, value) => write!(f, "map<{}, {}>", key, value),
            leaf => f.write_str(leaf.leaf_name().unwrap_or("?")),
        }
    }
}

impl Shape {
    fn leaf_name(&self) -> Option<&'static str> {
        let name = match self {
            Shape::Bool => "bool",
            Shape::Char => "char",
            Shape::U8 => "u8",
            Shape::U16 => "u16",
            Shape::U32 => "u32",
            Shape::U64 => "u64",
            Shape::U128 => "u128",
            Shape::Usize => "usize",
            Shape::I8 => "i8",
            Shape::I16 => "i16",
            Shape::I32 => "i32",
            Shape::I64 => "i64",
            Shape::I128 => "i128",
            Shape::Isize => "isize",
            Shape::F32 => "f32",
            Shape::F64 => "f64",
            Shape::Text => "text",
            Shape::Seq(_) | Shape::Map(..) => return None,
        };
        Some(name)
    }

    fn leaf_by_name(name: &str) -> Option<Shape> {
        let shape = match name {
            "bool" => Shape::Bool,
            "char" => Shape::Char,
            "u8" => Shape::U8,
            "u16" => Shape::U16,
            "u32" => Shape::U32,
            "u64" => Shape::U64,
            "u128" => Shape::U128,
            "usize" => Shape::Usize,
            "i8" => Shape::I8,
            "i16" => Shape::I16,
            "i32" => Shape::I32,
            "i64" => Shape::I64,
            "i128" => Shape::I128,
            "isize" => Shape::Isize,
            "f32" => Shape::F32,
            "f64" => Shape::F64,
            "text" | "string" | "str" => Shape::Text,
            _ => return None,
        };
        Some(shape)
    }

    /// Decode one value of this shape at `offset`.
    pub fn decode(&self, data: &[u8], offset: usize) -> DecodeResult<Value> {
        match self {
            Shape::Bool => leaf(data, offset, Value::Bool),
            Shape::Char => leaf(data, offset, |c: char| Value::String(c.to_string())),
            Shape::U8 => leaf(data, offset, |n: u8| Value::from(n)),
            Shape::U16 => leaf(data, offset, |n: u16| Value::from(n)),
            Shape::U32 => leaf(data, offset, |n: u32| Value::from(n)),
            Shape::U64 => leaf(data, offset, |n: u64| Value::from(n)),
            Shape::U128 => leaf(data, offset, unsigned_value),
            Shape::Usize => leaf(data, offset, |n: usize| Value::from(n)),
            Shape::I8 => leaf(data, offset, |n: i8| Value::from(n)),
            Shape::I16 => leaf(data, offset, |n: i16| Value::from(n)),
            Shape::I32 => leaf(data, offset, |n: i32| Value::from(n)),
            Shape::I64 => leaf(data, offset, |n: i64| Value::from(n)),
            Shape::I128 => leaf(data, offset, signed_value),
            Shape::Isize => leaf(data, offset, |n: isize| Value::from(n)),
            Shape::F32 => leaf(data, offset, |n: f32| float_value(n as f64)),
            Shape::F64 => leaf(data, offset, float_value),
            Shape::Text => leaf(data, offset, Value::String),
            Shape::Seq(element) => {
                let (items, size) = element.decode_elements(data, offset)?;
                Ok((Value::Array(items), size))
            }
            Shape::Map(key, value) => {
                let mut cursor = DecodeCursor::new(data, offset);
                let keys = cursor.decode_with(|d, o| key.decode_elements(d, o))?;
                let values = cursor.decode_with(|d, o| value.decode_elements(d, o))?;
                let count = keys.len();
                let pairs = pair_up(keys, values)?;
                Ok((Value::Array(pairs), cursor.finish(count)))
            }
        }
    }

    fn decode_elements(&self, data: &[u8], offset: usize) -> DecodeResult<Vec<Value>> {
        let mut cursor = DecodeCursor::new(data, offset);
        let count: usize = cursor.decode()?;
        let mut items = Vec::with_capacity(count.min(cursor.remaining()));
        for index in 0..count {
            let item = cursor
                .decode_with(|d, o| self.decode(d, o))
                .map_err(|e| DecodeError::element(index, e))?;
            items.push(item);
        }
        Ok((items, cursor.finish(count)))
    }

    /// Read one value of this shape from `source`, field by field.
    #[cfg(feature = "reader")]
    pub fn read_from(&self, source: &mut ByteSource) -> Result<Value, StreamError> {
        match self {
            Shape::Bool => read_leaf(source, Value::Bool),
            Shape::Char => read_leaf(source, |c: char| Value::String(c.to_string())),
            Shape::U8 => read_leaf(source, |n: u8| Value::from(n)),
            Shape::U16 => read_leaf(source, |n: u16| Value::from(n)),
            Shape::U32 => read_leaf(source, |n: u32| Value::from(n)),
            Shape::U64 => read_leaf(source, |n: u64| Value::from(n)),
            Shape::U128 => read_leaf(source, unsigned_value),
            Shape::Usize => read_leaf(source, |n: usize| Value::from(n)),
            Shape::I8 => read_leaf(source, |n: i8| Value::from(n)),
            Shape::I16 => read_leaf(source, |n: i16| Value::from(n)),
            Shape::I32 => read_leaf(source, |n: i32| Value::from(n)),
            Shape::I64 => read_leaf(source, |n: i64| Value::from(n)),
            Shape::I128 => read_leaf(source, signed_value),
            Shape::Isize => read_leaf(source, |n: isize| Value::from(n)),
            Shape::F32 => read_leaf(source, |n: f32| float_value(n as f64)),
            Shape::F64 => read_leaf(source, float_value),
            Shape::Text => read_leaf(source, Value::String),
            Shape::Seq(element) => element.read_elements(source).map(Value::Array),
            Shape::Map(key, value) => {
                let keys = key.read_elements(source)?;
                let values = value.read_elements(source)?;
                Ok(Value::Array(pair_up(keys, values)?))
            }
        }
    }

    #[cfg(feature = "reader")]
    fn read_elements(&self, source: &mut ByteSource) -> Result<Vec<Value>, StreamError> {
        let count: usize = source.get()?;
        let mut items = Vec::new();
        for index in 0..count {
            let item = self
                .read_from(source)
                .map_err(|e| StreamError::element(index, e))?;
            items.push(item);
        }
        Ok(items)
    }

    /// Append the encoding of `value`, interpreted as this shape, to `buf`.
    ///
    /// `buf` may hold a partial encoding when this fails.
    pub fn encode(&self, value: &Value, buf: &mut Vec<u8>) -> Result<(), ShapeError> {
        match self {
            Shape::Bool => value
                .as_bool()
                .ok_or_else(|| self.mismatch(value))?
                .encode_into(buf),
            Shape::Char => self.char(value)?.encode_into(buf),
            Shape::U8 => self.narrow::<u8>(value)?.encode_into(buf),
            Shape::U16 => self.narrow::<u16>(value)?.encode_into(buf),
            Shape::U32 => self.narrow::<u32>(value)?.encode_into(buf),
            Shape::U64 => self.narrow::<u64>(value)?.encode_into(buf),
            Shape::U128 => self.wide_unsigned(value)?.encode_into(buf),
            Shape::Usize => self.narrow::<usize>(value)?.encode_into(buf),
            Shape::I8 => self.narrow::<i8>(value)?.encode_into(buf),
            Shape::I16 => self.narrow::<i16>(value)?.encode_into(buf),
            Shape::I32 => self.narrow::<i32>(value)?.encode_into(buf),
            Shape::I64 => self.narrow::<i64>(value)?.encode_into(buf),
            Shape::I128 => self.narrow::<i128>(value)?.encode_into(buf),
            Shape::Isize => self.narrow::<isize>(value)?.encode_into(buf),
            Shape::F32 => (self.float(value)? as f32).encode_into(buf),
            Shape::F64 => self.float(value)?.encode_into(buf),
            Shape::Text => value
                .as_str()
                .ok_or_else(|| self.mismatch(value))?
                .encode_into(buf),
            Shape::Seq(element) => {
                let items = value.as_array().ok_or_else(|| self.mismatch(value))?;
                element.encode_elements(items.iter(), buf)?;
            }
            Shape::Map(key, val) => match value {
                Value::Object(object) if **key == Shape::Text => {
                    let keys: Vec<Value> = object.keys().cloned().map(Value::String).collect();
                    key.encode_elements(keys.iter(), buf)?;
                    val.encode_elements(object.values(), buf)?;
                }
                value => {
                    let (keys, values) = self.pairs(value)?;
                    key.encode_elements(keys.into_iter(), buf)?;
                    val.encode_elements(values.into_iter(), buf)?;
                }
            },
        }
        Ok(())
    }

    fn encode_elements<'v, I>(&self, items: I, buf: &mut Vec<u8>) -> Result<(), ShapeError>
    where
        I: ExactSizeIterator<Item = &'v Value>,
    {
        items.len().encode_into(buf);
        for (index, item) in items.enumerate() {
            self.encode(item, buf).map_err(|e| ShapeError::Element {
                index,
                source: Box::new(e),
            })?;
        }
        Ok(())
    }

    /// Split an array of `[key, value]` pairs into parallel key and value
    /// lists.
    fn pairs<'v>(&self, value: &'v Value) -> Result<(Vec<&'v Value>, Vec<&'v Value>), ShapeError> {
        let pairs = value.as_array().ok_or_else(|| self.mismatch(value))?;
        let mut keys = Vec::with_capacity(pairs.len());
        let mut values = Vec::with_capacity(pairs.len());
        for pair in pairs {
            match pair.as_array().map(Vec::as_slice) {
                Some([k, v]) => {
                    keys.push(k);
                    values.push(v);
                }
                _ => {
                    return Err(ShapeError::Mismatch {
                        expected: format!("a [key, value] pair for {}", self),
                        found: describe(pair),
                    })
                }
            }
        }
        Ok((keys, values))
    }

    fn narrow<T: TryFrom<i128>>(&self, value: &Value) -> Result<T, ShapeError> {
        let n: i128 = match value {
            Value::Number(n) => n
                .as_i64()
                .map(i128::from)
                .or_else(|| n.as_u64().map(i128::from))
                .ok_or_else(|| self.out_of_range(value))?,
            Value::String(s) => s.trim().parse().map_err(|_| self.mismatch(value))?,
            _ => return Err(self.mismatch(value)),
        };
        T::try_from(n).map_err(|_| self.out_of_range(value))
    }

    fn wide_unsigned(&self, value: &Value) -> Result<u128, ShapeError> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .map(u128::from)
                .ok_or_else(|| self.out_of_range(value)),
            Value::String(s) => s.trim().parse().map_err(|_| self.out_of_range(value)),
            _ => Err(self.mismatch(value)),
        }
    }

    fn float(&self, value: &Value) -> Result<f64, ShapeError> {
        match value {
            Value::Null => Ok(f64::NAN),
            value => value.as_f64().ok_or_else(|| self.mismatch(value)),
        }
    }

    fn char(&self, value: &Value) -> Result<char, ShapeError> {
        let mut chars = value.as_str().ok_or_else(|| self.mismatch(value))?.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(self.mismatch(value)),
        }
    }

    fn mismatch(&self, value: &Value) -> ShapeError {
        ShapeError::Mismatch {
            expected: self.to_string(),
            found: describe(value),
        }
    }

    fn out_of_range(&self, value: &Value) -> ShapeError {
        ShapeError::OutOfRange {
            shape: self.clone(),
            value: value.to_string(),
        }
    }
}

fn leaf<T: Decode>(
    data: &[u8],
    offset: usize,
    to_value: impl FnOnce(T) -> Value,
) -> DecodeResult<Value> {
    let (value, size) = T::from_bytes(data, offset)?;
    Ok((to_value(value), size))
}

#[cfg(feature = "reader")]
fn read_leaf<T: Decode>(
    source: &mut ByteSource,
    to_value: impl FnOnce(T) -> Value,
) -> Result<Value, StreamError> {
    source.get::<T>().map(to_value)
}

fn pair_up(keys: Vec<Value>, values: Vec<Value>) -> Result<Vec<Value>, DecodeError> {
    if keys.len() != values.len() {
        return Err(DecodeError::LengthMismatch {
            keys: keys.len(),
            values: values.len(),
        });
    }
    Ok(keys
        .into_iter()
        .zip(values)
        .map(|(k, v)| Value::Array(vec![k, v]))
        .collect())
}

fn unsigned_value(n: u128) -> Value {
    match u64::try_from(n) {
        Ok(n) => Value::from(n),
        Err(_) => Value::String(n.to_string()),
    }
}

fn signed_value(n: i128) -> Value {
    match i64::try_from(n) {
        Ok(n) => Value::from(n),
        Err(_) => Value::String(n.to_string()),
    }
}

fn float_value(n: f64) -> Value {
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(_) => "a string".into(),
        Value::Array(items) => format!("an array of {} items", items.len()),
        Value::Object(_) => "an object".into(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },

    #[error("{value} is out of range for {shape}")]
    OutOfRange { shape: Shape, value: String },

    #[error("cannot encode element {index}")]
    Element {
        index: usize,
        #[source]
        source: Box<ShapeError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeParseError {
    #[error("unknown type `{0}`")]
    UnknownType(String),

    #[error("expected {expected} at position {position}")]
    Expected {
        expected: &'static str,
        position: usize,
    },

    #[error("unexpected input `{0}` after shape")]
    TrailingInput(String),
}

impl FromStr for Shape {
    type Err = ShapeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser { input: s, pos: 0 };
        let shape = parser.shape()?;
        parser.skip_whitespace();
        match &s[parser.pos..] {
            "" => Ok(shape),
            rest => Err(ShapeParseError::TrailingInput(rest.to_string())),
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn shape(&mut self) -> Result<Shape, ShapeParseError> {
        let name = self.ident()?;
        match name {
            "seq" | "vec" | "list" | "set" => {
                self.expect('<', "`<`")?;
                let element = self.shape()?;
                self.expect('>', "`>`")?;
                Ok(Shape::Seq(Box::new(element)))
            }
            "map" => {
                self.expect('<', "`<`")?;
                let key = self.shape()?;
                self.expect(',', "`,`")?;
                let value = self.shape()?;
                self.expect('>', "`>`")?;
                Ok(Shape::Map(Box::new(key), Box::new(value)))
            }
            name => {
                Shape::leaf_by_name(name).ok_or_else(|| ShapeParseError::UnknownType(name.into()))
            }
        }
    }

    fn ident(&mut self) -> Result<&'a str, ShapeParseError> {
        self.skip_whitespace();
        let input = self.input;
        let rest = &input[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(ShapeParseError::Expected {
                expected: "a type name",
                position: self.pos,
            });
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn expect(&mut self, c: char, expected: &'static str) -> Result<(), ShapeParseError> {
        self.skip_whitespace();
        if self.input[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(ShapeParseError::Expected {
                expected,
                position: self.pos,
            })
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::EncodedSize;

    fn shape(s: &str) -> Shape {
        s.parse().unwrap()
    }

    #[test]
    fn parses_nested_shapes_and_aliases() {
        assert_eq!(shape("i32"), Shape::I32);
        assert_eq!(shape(" string "), Shape::Text);
        assert_eq!(
            shape("map<str, vec< u8 >>"),
            Shape::Map(Box::new(Shape::Text), Box::new(Shape::Seq(Box::new(Shape::U8))))
        );
        assert_eq!(shape("list<set<bool>>").to_string(), "seq<seq<bool>>");
        assert_eq!(shape("map<text,f64>").to_string(), "map<text, f64>");
    }

    #[test]
    fn rejects_malformed_shapes() {
        assert_eq!(
            "i33".parse::<Shape>(),
            Err(ShapeParseError::UnknownType("i33".into()))
        );
        assert_eq!(
            "seq<i32".parse::<Shape>(),
            Err(ShapeParseError::Expected {
                expected: "`>`",
                position: 7
            })
        );
        assert_eq!(
            "map<i32>".parse::<Shape>(),
            Err(ShapeParseError::Expected {
                expected: "`,`",
                position: 7
            })
        );
        assert_eq!(
            "u8 u8".parse::<Shape>(),
            Err(ShapeParseError::TrailingInput("u8".into()))
        );
        assert!(matches!(
            "".parse::<Shape>(),
            Err(ShapeParseError::Expected { position: 0, .. })
        ));
    }

    #[test]
    fn decodes_the_typed_layout() {
        let bytes = vec![vec![1i32, -2], vec![]].to_bytes();
        let (value, size) = shape("seq<seq<i32>>").decode(&bytes, 0).unwrap();
        assert_eq!(value, json!([[1, -2], []]));
        assert_eq!(size, EncodedSize::new(bytes.len(), 2));

        let (value, _) = shape("text").decode(&"héllo".to_bytes(), 0).unwrap();
        assert_eq!(value, json!("héllo"));
    }

    #[test]
    fn maps_decode_to_pairs_in_stored_order() {
        let map: BTreeMap<String, u16> = [("a".to_string(), 1), ("b".to_string(), 2)]
            .into_iter()
            .collect();
        let bytes = map.to_bytes();
        let (value, size) = shape("map<text, u16>").decode(&bytes, 0).unwrap();
        assert_eq!(value, json!([["a", 1], ["b", 2]]));
        assert_eq!(size.consumed, bytes.len());
        assert_eq!(size.logical_size, 2);
    }

    #[test]
    fn wide_and_non_finite_values() {
        let (value, _) = shape("u128").decode(&u128::MAX.to_bytes(), 0).unwrap();
        assert_eq!(value, json!(u128::MAX.to_string()));
        let (value, _) = shape("i128").decode(&(-5i128).to_bytes(), 0).unwrap();
        assert_eq!(value, json!(-5));
        let (value, _) = shape("f64").decode(&f64::INFINITY.to_bytes(), 0).unwrap();
        assert_eq!(value, Value::Null);
        let (value, _) = shape("char").decode(&'ß'.to_bytes(), 0).unwrap();
        assert_eq!(value, json!("ß"));
    }

    #[test]
    fn encodes_like_the_typed_codecs() {
        let mut buf = Vec::new();
        shape("seq<i64>").encode(&json!([3, -4]), &mut buf).unwrap();
        assert_eq!(buf, vec![3i64, -4].to_bytes());

        let mut buf = Vec::new();
        shape("u128")
            .encode(&json!(u128::MAX.to_string()), &mut buf)
            .unwrap();
        assert_eq!(buf, u128::MAX.to_bytes());

        let mut buf = Vec::new();
        shape("map<u8, text>")
            .encode(&json!([[1, "one"], [2, "two"]]), &mut buf)
            .unwrap();
        let decoded = BTreeMap::<u8, String>::decode_exact(&buf).unwrap();
        assert_eq!(decoded[&2], "two");
    }

    #[test]
    fn text_keyed_maps_accept_objects() {
        let mut buf = Vec::new();
        shape("map<text, bool>")
            .encode(&json!({"on": true, "off": false}), &mut buf)
            .unwrap();
        let decoded = BTreeMap::<String, bool>::decode_exact(&buf).unwrap();
        assert_eq!(decoded.len(), 2);
        assert!(decoded["on"]);
        assert!(!decoded["off"]);

        let err = shape("map<u8, bool>")
            .encode(&json!({"1": true}), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, ShapeError::Mismatch { .. }));
    }

    #[test]
    fn encode_rejects_unsuitable_json() {
        let mut buf = Vec::new();
        assert!(matches!(
            shape("u8").encode(&json!(256), &mut buf),
            Err(ShapeError::OutOfRange { .. })
        ));
        assert!(matches!(
            shape("i16").encode(&json!(-1.5), &mut buf),
            Err(ShapeError::OutOfRange { .. })
        ));
        assert!(matches!(
            shape("char").encode(&json!("ab"), &mut buf),
            Err(ShapeError::Mismatch { .. })
        ));
        assert!(matches!(
            shape("text").encode(&json!(1), &mut buf),
            Err(ShapeError::Mismatch { .. })
        ));
        match shape("seq<bool>").encode(&json!([true, 0]), &mut buf) {
            Err(ShapeError::Element { index, source }) => {
                assert_eq!(index, 1);
                assert!(matches!(*source, ShapeError::Mismatch { .. }));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn decode_reports_mismatched_map_lengths() {
        let mut bytes = vec![1u8, 2].to_bytes();
        vec![true].encode_into(&mut bytes);
        let err = shape("map<u8, bool>").decode(&bytes, 0).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::LengthMismatch { keys: 2, values: 1 }
        ));
    }

    #[test]
    fn decode_reports_truncation_and_element_errors() {
        let bytes = vec![7u32, 8].to_bytes();
        let err = shape("seq<u32>")
            .decode(&bytes[..bytes.len() - 1], 0)
            .unwrap_err();
        assert_eq!(err.needed(), Some(1));

        let bytes = vec![0u8, 1, 2].to_bytes();
        match shape("seq<bool>").decode(&bytes, 0) {
            Err(DecodeError::Element { index, source }) => {
                assert_eq!(index, 2);
                assert!(matches!(*source, DecodeError::InvalidBool(2)));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
