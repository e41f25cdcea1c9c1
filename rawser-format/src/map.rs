//! Key/value collections, written as a key sequence immediately followed by a
//! value sequence of the same length. The i-th key pairs with the i-th value.
//!
//! Entry order is whatever the map iterates in: sorted for `BTreeMap`, hash
//! order for `HashMap`. Readers must not rely on it.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use crate::{Decode, DecodeCursor, DecodeError, DecodeResult, Encode};

#[cfg(feature = "reader")]
use crate::seq::read_elements;
#[cfg(feature = "reader")]
use crate::{ByteSource, StreamError};

fn encode_entries<'a, K, V, I>(entries: I, buf: &mut Vec<u8>)
where
    K: Encode + 'a,
    V: Encode + 'a,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    let (keys, values): (Vec<&K>, Vec<&V>) = entries.unzip();
    keys.encode_into(buf);
    values.encode_into(buf);
}

fn pair_up<K, V>(keys: Vec<K>, values: Vec<V>) -> Result<impl Iterator<Item = (K, V)>, DecodeError> {
    if keys.len() != values.len() {
        return Err(DecodeError::LengthMismatch {
            keys: keys.len(),
            values: values.len(),
        });
    }
    Ok(keys.into_iter().zip(values))
}

fn decode_entries<K, V, M>(data: &[u8], offset: usize) -> DecodeResult<M>
where
    K: Decode,
    V: Decode,
    M: FromIterator<(K, V)>,
{
    let mut cursor = DecodeCursor::new(data, offset);
    let keys: Vec<K> = cursor.decode()?;
    let values: Vec<V> = cursor.decode()?;

    let count = keys.len();
    let map = pair_up(keys, values)?.collect();
    Ok((map, cursor.finish(count)))
}

#[cfg(feature = "reader")]
fn read_entries<K, V, M>(source: &mut ByteSource) -> Result<M, StreamError>
where
    K: Decode,
    V: Decode,
    M: FromIterator<(K, V)>,
{
    let keys = read_elements::<K>(source)?;
    let values = read_elements::<V>(source)?;
    Ok(pair_up(keys, values)?.collect())
}

impl<K: Encode, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode_into(&self, buf: &mut Vec<u8>) {
        encode_entries(self.iter(), buf)
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode_into(&self, buf: &mut Vec<u8>) {
        encode_entries(self.iter(), buf)
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: Decode + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default,
{
    fn from_bytes(data: &[u8], offset: usize) -> DecodeResult<Self> {
        let (map, mut size) = decode_entries::<K, V, Self>(data, offset)?;
        size.logical_size = map.len();
        Ok((map, size))
    }

    #[cfg(feature = "reader")]
    fn read_from(source: &mut ByteSource) -> Result<Self, StreamError> {
        read_entries::<K, V, Self>(source)
    }
}

impl<K, V> Decode for BTreeMap<K, V>
where
    K: Decode + Ord,
    V: Decode,
{
    fn from_bytes(data: &[u8], offset: usize) -> DecodeResult<Self> {
        let (map, mut size) = decode_entries::<K, V, Self>(data, offset)?;
        size.logical_size = map.len();
        Ok((map, size))
    }

    #[cfg(feature = "reader")]
    fn read_from(source: &mut ByteSource) -> Result<Self, StreamError> {
        read_entries::<K, V, Self>(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EncodedSize;

    const WORD: usize = std::mem::size_of::<usize>();

    fn sample() -> HashMap<String, i32> {
        [("a".to_string(), 1), ("b".to_string(), 2)]
            .into_iter()
            .collect()
    }

    #[test]
    fn keys_then_values_in_matching_order() {
        let map = sample();
        let bytes = map.to_bytes();

        let (keys, key_size) = Vec::<String>::from_bytes(&bytes, 0).unwrap();
        let (values, value_size) = Vec::<i32>::from_bytes(&bytes, key_size.consumed).unwrap();
        assert_eq!(key_size.consumed + value_size.consumed, bytes.len());
        assert_eq!(keys.len(), 2);

        for (key, value) in keys.iter().zip(values.iter()) {
            assert_eq!(map[key], *value);
        }
    }

    #[test]
    fn hash_map_round_trip() {
        let map = sample();
        let bytes = map.to_bytes();
        let (decoded, size) = HashMap::<String, i32>::from_bytes(&bytes, 0).unwrap();
        assert_eq!(decoded, map);
        assert_eq!(size, EncodedSize::new(bytes.len(), 2));
    }

    #[test]
    fn btree_map_writes_sorted_keys() {
        let map: BTreeMap<u8, String> = [(3, "c".into()), (1, "a".into()), (2, "b".into())]
            .into_iter()
            .collect();
        let bytes = map.to_bytes();
        let (keys, _) = Vec::<u8>::from_bytes(&bytes, 0).unwrap();
        assert_eq!(keys, vec![1, 2, 3]);
        assert_eq!(BTreeMap::<u8, String>::decode_exact(&bytes).unwrap(), map);
    }

    #[test]
    fn empty_map_is_two_zero_counts() {
        let map: BTreeMap<i32, i32> = BTreeMap::new();
        let bytes = map.to_bytes();
        assert_eq!(bytes.len(), 2 * WORD);
        assert!(BTreeMap::<i32, i32>::decode_exact(&bytes).unwrap().is_empty());
    }

    #[test]
    fn nested_map_values() {
        let mut map: BTreeMap<String, Vec<BTreeMap<u8, bool>>> = BTreeMap::new();
        map.insert("flags".into(), vec![[(1, true), (2, false)].into_iter().collect()]);
        map.insert("none".into(), vec![]);
        let decoded = BTreeMap::<String, Vec<BTreeMap<u8, bool>>>::decode_exact(&map.to_bytes());
        assert_eq!(decoded.unwrap(), map);
    }

    #[test]
    fn key_value_count_mismatch() {
        let mut bytes = vec![1u32, 2, 3].to_bytes();
        vec![10u32, 20].encode_into(&mut bytes);

        let err = HashMap::<u32, u32>::from_bytes(&bytes, 0).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::LengthMismatch { keys: 3, values: 2 }
        ));
    }

    #[test]
    fn missing_value_bytes_are_truncated() {
        let bytes = sample().to_bytes();
        let err = HashMap::<String, i32>::from_bytes(&bytes[..bytes.len() - 1], 0).unwrap_err();
        assert_eq!(err.needed(), Some(1));
    }
}
