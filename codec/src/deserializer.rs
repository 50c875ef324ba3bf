//! Bounds-checked cursor over a range of bytes.
//!
//! # Overview
//!
//! A [`Deserializer`] reads fixed-width values off the front of a byte range. Every read
//! either advances the cursor by exactly the width it consumed or fails without moving it,
//! so a failed read can always be retried once more data is available.
//!
//! The underlying storage is a reference-counted [`Bytes`]. Forks share that storage with an
//! independent cursor, and views returned by [`Deserializer::view`] are zero-copy windows into
//! it.
//!
//! # Example
//!
//! ```
//! use bytecraft_codec::Deserializer;
//!
//! let mut d = Deserializer::new(&[0x01, 0x02, 0x03, b'f', b'o', b'o'][..]);
//! assert_eq!(d.u8().unwrap(), 0x01);
//! assert_eq!(d.u16().unwrap(), 0x0203);
//! assert_eq!(d.utf8(3).unwrap(), "foo");
//! assert_eq!(d.bytes_available(), 0);
//! assert!(d.u8().unwrap_err().is_end_of_data());
//! ```

use crate::{
    config::{LengthPrefix, RangeCfg},
    primitive::{Endian, Primitive},
    Error,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of buffer identities. Every buffer installed in a [`Deserializer`] gets a new one.
static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(0);

fn next_buffer_id() -> u64 {
    NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Saved cursor position of a [`Deserializer`].
///
/// A checkpoint is tied to the buffer it was taken on. Once the buffer is replaced (see
/// [`Deserializer::push`]), the offset it captured no longer refers to the same bytes and
/// [`Deserializer::restore`] refuses it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Checkpoint {
    buffer: u64,
    offset: usize,
}

impl Checkpoint {
    /// Offset captured by this checkpoint.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Cursor over a fixed range of bytes.
#[derive(Debug)]
pub struct Deserializer {
    buf: Bytes,
    offset: usize,
    end: usize,
    id: u64,
}

macro_rules! impl_read {
    ($($type:ident),*) => {
        paste::paste! {
            $(
                #[doc = concat!("Reads a big-endian `", stringify!($type), "`.")]
                #[inline]
                pub fn $type(&mut self) -> Result<$type, Error> {
                    self.read(Endian::Big)
                }

                #[doc = concat!("Reads a little-endian `", stringify!($type), "`.")]
                #[inline]
                pub fn [<$type _le>](&mut self) -> Result<$type, Error> {
                    self.read(Endian::Little)
                }
            )*
        }
    };
}

impl Deserializer {
    /// Creates a deserializer over all bytes of `buf`.
    pub fn new(buf: impl Into<Bytes>) -> Self {
        let buf = buf.into();
        let end = buf.len();
        Self {
            buf,
            offset: 0,
            end,
            id: next_buffer_id(),
        }
    }

    /// Creates a deserializer over a copy of `buf`.
    pub fn from_slice(buf: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(buf))
    }

    /// Creates a deserializer over `len` bytes of `buf`, starting at `offset`.
    ///
    /// Fails if the range does not fit within `buf`.
    pub fn with_range(buf: impl Into<Bytes>, offset: usize, len: usize) -> Result<Self, Error> {
        let buf = buf.into();
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= buf.len())
            .ok_or_else(|| {
                Error::OutOfRange(format!(
                    "range {}..{}+{} exceeds buffer of {} bytes",
                    offset,
                    offset,
                    len,
                    buf.len()
                ))
            })?;
        Ok(Self {
            buf,
            offset,
            end,
            id: next_buffer_id(),
        })
    }

    /// The underlying buffer, including bytes outside of the readable range.
    pub fn buffer(&self) -> &Bytes {
        &self.buf
    }

    /// Current cursor position within [`Self::buffer`].
    pub fn byte_offset(&self) -> usize {
        self.offset
    }

    /// Exclusive end of the readable range within [`Self::buffer`].
    pub fn end_offset(&self) -> usize {
        self.end
    }

    /// Number of bytes between the cursor and the end of the readable range.
    pub fn bytes_available(&self) -> usize {
        self.end - self.offset
    }

    /// Fails unless at least `len` bytes are available. Does not move the cursor.
    #[inline]
    fn ensure(&self, len: usize) -> Result<(), Error> {
        let available = self.bytes_available();
        if len > available {
            return Err(Error::EndOfData {
                needed: len,
                available,
            });
        }
        Ok(())
    }

    /// Advances the cursor by `len` bytes and returns the offset before the advance.
    #[inline]
    fn mark(&mut self, len: usize) -> Result<usize, Error> {
        self.ensure(len)?;
        let start = self.offset;
        self.offset += len;
        Ok(start)
    }

    /// Reads a fixed-width value in the given byte order.
    #[inline]
    pub fn read<T: Primitive>(&mut self, endian: Endian) -> Result<T, Error> {
        let start = self.mark(T::SIZE)?;
        Ok(T::read(&self.buf[start..start + T::SIZE], endian))
    }

    /// Reads an unsigned byte.
    #[inline]
    pub fn u8(&mut self) -> Result<u8, Error> {
        self.read(Endian::Big)
    }

    impl_read!(u16, u32, u64, f32, f64);

    /// Reads a boolean.
    ///
    /// `0x00` is `false` and `0x01` is `true`. Any other byte is rejected and left unread.
    pub fn boolean(&mut self) -> Result<bool, Error> {
        self.ensure(1)?;
        let value = match self.buf[self.offset] {
            0 => false,
            1 => true,
            other => return Err(Error::InvalidBool(other)),
        };
        self.offset += 1;
        Ok(value)
    }

    /// Reads the presence flag of an optional value.
    pub fn is_some(&mut self) -> Result<bool, Error> {
        self.boolean()
    }

    /// Reads an optional value: a presence flag, followed by the value if present.
    ///
    /// If `read` fails, the cursor is moved back before the presence flag.
    pub fn option<T, E>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<Option<T>, E>
    where
        E: From<Error>,
    {
        let start = self.offset;
        if !self.is_some()? {
            return Ok(None);
        }
        match read(self) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                self.offset = start;
                Err(err)
            }
        }
    }

    /// Returns a zero-copy view of the next `len` bytes.
    ///
    /// The view shares storage with this deserializer. After [`Self::push`] it keeps the old
    /// storage alive instead of following the new buffer.
    pub fn view(&mut self, len: usize) -> Result<Bytes, Error> {
        let start = self.mark(len)?;
        Ok(self.buf.slice(start..start + len))
    }

    /// Returns a copy of the next `len` bytes that does not share storage with this
    /// deserializer.
    pub fn copy(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let start = self.mark(len)?;
        Ok(self.buf[start..start + len].to_vec())
    }

    /// Decodes the next `len` bytes as UTF-8.
    ///
    /// Invalid UTF-8 is rejected and left unread.
    pub fn utf8(&mut self, len: usize) -> Result<String, Error> {
        self.ensure(len)?;
        let text = std::str::from_utf8(&self.buf[self.offset..self.offset + len])?.to_owned();
        self.offset += len;
        Ok(text)
    }

    /// Skips the next `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.mark(len).map(|_| ())
    }

    /// Reads a length encoded with `prefix`.
    pub fn length(&mut self, prefix: LengthPrefix) -> Result<usize, Error> {
        self.ensure(prefix.width())?;
        let start = self.offset;
        let len = match prefix {
            LengthPrefix::U8 => u64::from(self.u8()?),
            LengthPrefix::U16 => u64::from(self.u16()?),
            LengthPrefix::U16Le => u64::from(self.u16_le()?),
            LengthPrefix::U32 => u64::from(self.u32()?),
            LengthPrefix::U32Le => u64::from(self.u32_le()?),
            LengthPrefix::U64 => self.u64()?,
            LengthPrefix::U64Le => self.u64_le()?,
        };
        usize::try_from(len).map_err(|_| {
            self.offset = start;
            Error::OutOfRange(format!("length does not fit in usize: {len}"))
        })
    }

    /// Reads a length prefix followed by that many bytes (zero-copy).
    ///
    /// Lengths outside of `range` are rejected before any payload is touched. On failure the
    /// cursor is moved back before the prefix.
    pub fn prefixed_bytes(
        &mut self,
        prefix: LengthPrefix,
        range: impl Into<RangeCfg>,
    ) -> Result<Bytes, Error> {
        let start = self.offset;
        let result = self.prefixed_len(prefix, range.into()).and_then(|len| self.view(len));
        if result.is_err() {
            self.offset = start;
        }
        result
    }

    /// Reads a length prefix followed by that many bytes of UTF-8 text.
    ///
    /// On failure the cursor is moved back before the prefix.
    pub fn prefixed_utf8(
        &mut self,
        prefix: LengthPrefix,
        range: impl Into<RangeCfg>,
    ) -> Result<String, Error> {
        let start = self.offset;
        let result = self.prefixed_len(prefix, range.into()).and_then(|len| self.utf8(len));
        if result.is_err() {
            self.offset = start;
        }
        result
    }

    fn prefixed_len(&mut self, prefix: LengthPrefix, range: RangeCfg) -> Result<usize, Error> {
        let len = self.length(prefix)?;
        if !range.contains(len) {
            return Err(Error::InvalidLength(len));
        }
        Ok(len)
    }

    /// Creates an independent cursor over the same storage, starting at the current offset.
    pub fn fork(&self) -> Self {
        Self {
            buf: self.buf.clone(),
            offset: self.offset,
            end: self.end,
            id: self.id,
        }
    }

    /// Saves the current cursor position.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            buffer: self.id,
            offset: self.offset,
        }
    }

    /// Moves the cursor back to `checkpoint`.
    ///
    /// Fails if the buffer was replaced since the checkpoint was taken.
    pub fn restore(&mut self, checkpoint: Checkpoint) -> Result<(), Error> {
        if checkpoint.buffer != self.id || checkpoint.offset > self.end {
            return Err(Error::StaleCheckpoint);
        }
        self.offset = checkpoint.offset;
        Ok(())
    }

    /// Replaces the buffer with the unread bytes followed by `chunks`.
    ///
    /// The new buffer is freshly allocated and the cursor moves to its start. Checkpoints
    /// taken before the push can no longer be restored.
    pub fn push<I, B>(&mut self, chunks: I)
    where
        I: IntoIterator<Item = B>,
        I::IntoIter: Clone,
        B: AsRef<[u8]>,
    {
        let chunks = chunks.into_iter();
        let remainder = &self.buf[self.offset..self.end];
        let len = remainder.len() + chunks.clone().map(|c| c.as_ref().len()).sum::<usize>();
        let mut buf = BytesMut::with_capacity(len);
        buf.put_slice(remainder);
        for chunk in chunks {
            buf.put_slice(chunk.as_ref());
        }
        self.buf = buf.freeze();
        self.offset = 0;
        self.end = len;
        self.id = next_buffer_id();
    }
}

impl Default for Deserializer {
    fn default() -> Self {
        Self::new(Bytes::new())
    }
}

impl Buf for Deserializer {
    fn remaining(&self) -> usize {
        self.bytes_available()
    }

    fn chunk(&self) -> &[u8] {
        &self.buf[self.offset..self.end]
    }

    fn advance(&mut self, cnt: usize) {
        assert!(
            cnt <= self.bytes_available(),
            "cannot advance past the end of the readable range"
        );
        self.offset += cnt;
    }
}
