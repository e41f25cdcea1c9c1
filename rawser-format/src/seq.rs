//! Homogeneous collections: a `usize` element count followed by each element's
//! own encoding, in iteration order.

use std::collections::{BTreeSet, HashSet, LinkedList, VecDeque};
use std::hash::{BuildHasher, Hash};

use crate::scalar::encode_scalar;
use crate::{Decode, DecodeCursor, DecodeError, DecodeResult, Encode};

#[cfg(feature = "reader")]
use crate::scalar::read_scalar;
#[cfg(feature = "reader")]
use crate::{ByteSource, StreamError};

/// Upper bound on elements reserved up front when reading from a stream, where
/// the remaining length is unknown.
#[cfg(feature = "reader")]
const STREAM_PREALLOC_LIMIT: usize = 1024;

pub(crate) fn encode_seq<'a, T, I>(len: usize, items: I, buf: &mut Vec<u8>)
where
    T: Encode + 'a,
    I: IntoIterator<Item = &'a T>,
{
    encode_scalar(len, buf);
    for item in items {
        item.encode_into(buf);
    }
}

/// Decode a count and then exactly that many elements.
pub(crate) fn decode_elements<T: Decode>(data: &[u8], offset: usize) -> DecodeResult<Vec<T>> {
    let mut cursor = DecodeCursor::new(data, offset);
    let count: usize = cursor.decode()?;
    // Every element takes at least one byte, except in a pathological user
    // type, so the remaining length bounds a sane reservation.
    let mut items = Vec::with_capacity(count.min(cursor.remaining()));
    for index in 0..count {
        let item = cursor
            .decode::<T>()
            .map_err(|e| DecodeError::element(index, e))?;
        items.push(item);
    }
    let size = cursor.finish(count);
    tracing::trace!(
        offset,
        consumed = size.consumed,
        count,
        "decoded sequence"
    );
    Ok((items, size))
}

#[cfg(feature = "reader")]
pub(crate) fn read_elements<T: Decode>(source: &mut ByteSource) -> Result<Vec<T>, StreamError> {
    let count: usize = read_scalar(source)?;
    let mut items = Vec::with_capacity(count.min(STREAM_PREALLOC_LIMIT));
    for index in 0..count {
        let item = T::read_from(source).map_err(|e| StreamError::element(index, e))?;
        items.push(item);
    }
    tracing::trace!(count, "read sequence");
    Ok(items)
}

fn collect_elements<T: Decode, C: FromIterator<T>>(data: &[u8], offset: usize) -> DecodeResult<C> {
    let (items, size) = decode_elements::<T>(data, offset)?;
    Ok((items.into_iter().collect(), size))
}

impl<T: Encode> Encode for [T] {
    fn encode_into(&self, buf: &mut Vec<u8>) {
        encode_seq(self.len(), self, buf)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode_into(&self, buf: &mut Vec<u8>) {
        self.as_slice().encode_into(buf)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode_into(&self, buf: &mut Vec<u8>) {
        self.as_slice().encode_into(buf)
    }
}

impl<T: Encode> Encode for VecDeque<T> {
    fn encode_into(&self, buf: &mut Vec<u8>) {
        encode_seq(self.len(), self, buf)
    }
}

impl<T: Encode> Encode for LinkedList<T> {
    fn encode_into(&self, buf: &mut Vec<u8>) {
        encode_seq(self.len(), self, buf)
    }
}

impl<T: Encode> Encode for BTreeSet<T> {
    fn encode_into(&self, buf: &mut Vec<u8>) {
        encode_seq(self.len(), self, buf)
    }
}

impl<T: Encode, S> Encode for HashSet<T, S> {
    fn encode_into(&self, buf: &mut Vec<u8>) {
        encode_seq(self.len(), self, buf)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn from_bytes(data: &[u8], offset: usize) -> DecodeResult<Self> {
        decode_elements(data, offset)
    }

    #[cfg(feature = "reader")]
    fn read_from(source: &mut ByteSource) -> Result<Self, StreamError> {
        read_elements(source)
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn from_bytes(data: &[u8], offset: usize) -> DecodeResult<Self> {
        let (items, size) = decode_elements::<T>(data, offset)?;
        Ok((into_array(items)?, size))
    }

    #[cfg(feature = "reader")]
    fn read_from(source: &mut ByteSource) -> Result<Self, StreamError> {
        Ok(into_array(read_elements::<T>(source)?)?)
    }
}

fn into_array<T, const N: usize>(items: Vec<T>) -> Result<[T; N], DecodeError> {
    items
        .try_into()
        .map_err(|items: Vec<T>| DecodeError::CountMismatch {
            expected: N,
            found: items.len(),
        })
}

impl<T: Decode> Decode for VecDeque<T> {
    fn from_bytes(data: &[u8], offset: usize) -> DecodeResult<Self> {
        let (items, size) = decode_elements::<T>(data, offset)?;
        Ok((items.into(), size))
    }

    #[cfg(feature = "reader")]
    fn read_from(source: &mut ByteSource) -> Result<Self, StreamError> {
        read_elements::<T>(source).map(VecDeque::from)
    }
}

impl<T: Decode> Decode for LinkedList<T> {
    fn from_bytes(data: &[u8], offset: usize) -> DecodeResult<Self> {
        collect_elements(data, offset)
    }

    #[cfg(feature = "reader")]
    fn read_from(source: &mut ByteSource) -> Result<Self, StreamError> {
        Ok(read_elements::<T>(source)?.into_iter().collect())
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn from_bytes(data: &[u8], offset: usize) -> DecodeResult<Self> {
        collect_elements(data, offset)
    }

    #[cfg(feature = "reader")]
    fn read_from(source: &mut ByteSource) -> Result<Self, StreamError> {
        Ok(read_elements::<T>(source)?.into_iter().collect())
    }
}

impl<T, S> Decode for HashSet<T, S>
where
    T: Decode + Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_bytes(data: &[u8], offset: usize) -> DecodeResult<Self> {
        collect_elements(data, offset)
    }

    #[cfg(feature = "reader")]
    fn read_from(source: &mut ByteSource) -> Result<Self, StreamError> {
        Ok(read_elements::<T>(source)?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EncodedSize;

    const WORD: usize = std::mem::size_of::<usize>();

    #[test]
    fn empty_sequence_is_just_the_count() {
        let bytes = Vec::<i32>::new().to_bytes();
        assert_eq!(bytes, 0usize.to_ne_bytes());

        let (items, size) = Vec::<i32>::from_bytes(&bytes, 0).unwrap();
        assert!(items.is_empty());
        assert_eq!(size, EncodedSize::new(WORD, 0));
    }

    #[test]
    fn three_integers() {
        let bytes = vec![1i32, 2, 3].to_bytes();

        let mut expected = 3usize.to_ne_bytes().to_vec();
        for n in [1i32, 2, 3] {
            expected.extend_from_slice(&n.to_ne_bytes());
        }
        assert_eq!(bytes, expected);

        let (items, size) = Vec::<i32>::from_bytes(&bytes, 0).unwrap();
        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(size, EncodedSize::new(WORD + 12, 3));
    }

    #[test]
    fn nested_sequences() {
        let nested = vec![vec![1i64, 2], vec![3]];
        let decoded = Vec::<Vec<i64>>::decode_exact(&nested.to_bytes()).unwrap();
        assert_eq!(decoded, nested);
    }

    #[test]
    fn sequence_of_text() {
        let words = vec!["alpha".to_string(), String::new(), "γ".to_string()];
        let decoded = Vec::<String>::decode_exact(&words.to_bytes()).unwrap();
        assert_eq!(decoded, words);
    }

    #[test]
    fn containers_share_layout() {
        let vec = vec![4u16, 5, 6];
        let deque: VecDeque<u16> = vec.iter().copied().collect();
        let list: LinkedList<u16> = vec.iter().copied().collect();
        let array = [4u16, 5, 6];

        assert_eq!(deque.to_bytes(), vec.to_bytes());
        assert_eq!(list.to_bytes(), vec.to_bytes());
        assert_eq!(array.to_bytes(), vec.to_bytes());

        let decoded: LinkedList<u16> = LinkedList::decode_exact(&vec.to_bytes()).unwrap();
        assert_eq!(decoded, list);
        let decoded: VecDeque<u16> = VecDeque::decode_exact(&vec.to_bytes()).unwrap();
        assert_eq!(decoded, deque);
    }

    #[test]
    fn sets_rebuild_membership() {
        let btree: BTreeSet<u32> = [10, 3, 7].into_iter().collect();
        assert_eq!(BTreeSet::<u32>::decode_exact(&btree.to_bytes()).unwrap(), btree);

        let hash: HashSet<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        assert_eq!(HashSet::<String>::decode_exact(&hash.to_bytes()).unwrap(), hash);
    }

    #[test]
    fn array_count_must_match() {
        let bytes = vec![1u8, 2].to_bytes();
        assert_eq!(<[u8; 2]>::decode_exact(&bytes).unwrap(), [1, 2]);
        let err = <[u8; 3]>::decode_exact(&bytes).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::CountMismatch {
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn missing_element_bytes_are_truncated() {
        let bytes = vec![100u32, 200, 300].to_bytes();
        for cut in 1..=4 {
            let err = Vec::<u32>::from_bytes(&bytes[..bytes.len() - cut], 0).unwrap_err();
            assert_eq!(err.needed(), Some(cut));
        }
    }

    #[test]
    fn corrupt_count_does_not_overallocate() {
        let mut bytes = usize::MAX.to_bytes();
        bytes.push(1);
        let err = Vec::<u8>::from_bytes(&bytes, 0).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn element_errors_carry_their_index() {
        let mut bytes = 3usize.to_bytes();
        bytes.extend_from_slice(&[1, 0, 9]);
        let err = Vec::<bool>::decode_exact(&bytes).unwrap_err();
        match err {
            DecodeError::Element { index, source } => {
                assert_eq!(index, 2);
                assert!(matches!(*source, DecodeError::InvalidBool(9)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
