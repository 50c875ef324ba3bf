//! Helpers to compare, copy and concatenate raw byte buffers.

use bytes::{BufMut, Bytes, BytesMut};
use std::cmp::Ordering;

/// Returns true if both buffers contain the same bytes.
#[inline]
pub fn equal(a: &[u8], b: &[u8]) -> bool {
    a == b
}

/// Compares two buffers lexically.
///
/// Bytes are compared as unsigned values from the front. If one buffer is a prefix of the
/// other, the shorter one orders first.
pub fn compare(a: &[u8], b: &[u8]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Concatenates `chunks` into a single, newly allocated buffer.
pub fn concat<I, B>(chunks: I) -> Bytes
where
    I: IntoIterator<Item = B>,
    I::IntoIter: Clone,
    B: AsRef<[u8]>,
{
    let chunks = chunks.into_iter();
    let len = chunks.clone().map(|c| c.as_ref().len()).sum();
    let mut out = BytesMut::with_capacity(len);
    for chunk in chunks {
        out.put_slice(chunk.as_ref());
    }
    out.freeze()
}

/// Copies `src` into a buffer that does not share storage with it.
pub fn copy(src: &[u8]) -> Bytes {
    Bytes::copy_from_slice(src)
}
