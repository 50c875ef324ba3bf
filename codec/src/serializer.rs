//! Two-phase binary writer.
//!
//! # Overview
//!
//! A [`Serializer`] records an ordered list of parts, each with a fixed byte length and a
//! write function. Nothing is written until [`Serializer::serialize`] (or one of its variants)
//! is called: at that point the total length is known, a single buffer is obtained and every
//! part is written at the offset following the previous one.
//!
//! Values are validated when they are queued. A queueing method that fails leaves the
//! serializer exactly as it was before the call.
//!
//! The part list is not consumed by serialization, so the same serializer can be replayed
//! into any number of buffers.
//!
//! # Example
//!
//! ```
//! use bytecraft_codec::{LengthPrefix, Serializer};
//!
//! let mut s = Serializer::new();
//! s.u8(0x42).u16(0x1234);
//! s.prefixed_utf8(LengthPrefix::U8, "hi").unwrap();
//! assert_eq!(s.byte_len(), 6);
//! assert_eq!(&s.serialize()[..], &[0x42, 0x12, 0x34, 0x02, b'h', b'i']);
//! ```

use crate::{
    alloc::{Allocator, Unique},
    config::LengthPrefix,
    primitive::{Endian, Primitive},
    Error,
};
use bytes::{Bytes, BytesMut};
use paste::paste;
use std::fmt;

/// Write function of a single part.
type WriteFn = Box<dyn Fn(&mut Context<'_>) + Send + Sync>;

struct Part {
    len: usize,
    write: WriteFn,
}

/// View of the output buffer handed to the write function of a part.
pub struct Context<'a> {
    buf: &'a mut [u8],
    offset: usize,
    len: usize,
}

impl Context<'_> {
    /// Offset of the current part within [`Self::buffer`].
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Declared length of the current part.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the current part is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The whole output buffer.
    ///
    /// Bytes before [`Self::offset`] have already been written. Bytes after it have not.
    pub fn buffer(&self) -> &[u8] {
        self.buf
    }

    /// The bytes reserved for the current part.
    pub fn part(&mut self) -> &mut [u8] {
        &mut self.buf[self.offset..self.offset + self.len]
    }
}

/// A value that knows how to queue itself onto a [`Serializer`].
///
/// Implemented for every closure `Fn(&mut Serializer) -> Result<(), Error>`, so both
/// dedicated types and ad-hoc functions can be passed to [`Serializer::apply`].
pub trait Serialize {
    /// Queues the parts of `self`.
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), Error>;
}

impl<F> Serialize for F
where
    F: Fn(&mut Serializer) -> Result<(), Error>,
{
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), Error> {
        self(serializer)
    }
}

/// Writer of the length prefix in front of a variable-length value.
///
/// Implemented by [`LengthPrefix`] and by closures that queue the prefix themselves.
pub trait Prefix {
    /// Queues a prefix for a payload of `len` bytes.
    fn write_len(self, serializer: &mut Serializer, len: usize) -> Result<(), Error>;
}

impl Prefix for LengthPrefix {
    fn write_len(self, s: &mut Serializer, len: usize) -> Result<(), Error> {
        match self {
            LengthPrefix::U8 => s.try_u8(len),
            LengthPrefix::U16 => s.try_u16(len),
            LengthPrefix::U16Le => s.try_u16_le(len),
            LengthPrefix::U32 => s.try_u32(len),
            LengthPrefix::U32Le => s.try_u32_le(len),
            LengthPrefix::U64 => s.try_u64(len),
            LengthPrefix::U64Le => s.try_u64_le(len),
        }
        .map(|_| ())
    }
}

impl<F> Prefix for F
where
    F: FnOnce(&mut Serializer, usize) -> Result<(), Error>,
{
    fn write_len(self, serializer: &mut Serializer, len: usize) -> Result<(), Error> {
        self(serializer, len)
    }
}

/// Accumulates parts and writes them into a single contiguous buffer.
#[derive(Default)]
pub struct Serializer {
    parts: Vec<Part>,
    len: usize,
}

macro_rules! impl_write {
    ($($type:ident),*) => {
        paste! {
            $(
                #[doc = concat!("Queues a big-endian `", stringify!($type), "`.")]
                #[inline]
                pub fn $type(&mut self, value: $type) -> &mut Self {
                    self.put(value, Endian::Big)
                }

                #[doc = concat!("Queues a little-endian `", stringify!($type), "`.")]
                #[inline]
                pub fn [<$type _le>](&mut self, value: $type) -> &mut Self {
                    self.put(value, Endian::Little)
                }
            )*
        }
    };
}

macro_rules! impl_try_write {
    ($($type:ident),*) => {
        paste! {
            $(
                #[doc = concat!(
                    "Queues a big-endian `",
                    stringify!($type),
                    "`, failing if `value` does not fit."
                )]
                pub fn [<try_ $type>]<V>(&mut self, value: V) -> Result<&mut Self, Error>
                where
                    V: TryInto<$type> + fmt::Display + Copy,
                {
                    let value = Self::narrow::<$type, V>(value)?;
                    Ok(self.$type(value))
                }

                #[doc = concat!(
                    "Queues a little-endian `",
                    stringify!($type),
                    "`, failing if `value` does not fit."
                )]
                pub fn [<try_ $type _le>]<V>(&mut self, value: V) -> Result<&mut Self, Error>
                where
                    V: TryInto<$type> + fmt::Display + Copy,
                {
                    let value = Self::narrow::<$type, V>(value)?;
                    Ok(self.[<$type _le>](value))
                }
            )*
        }
    };
}

impl Serializer {
    /// Creates an empty serializer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty serializer with room for `parts` parts.
    pub fn with_capacity(parts: usize) -> Self {
        Self {
            parts: Vec::with_capacity(parts),
            len: 0,
        }
    }

    /// Total length of all queued parts.
    pub fn byte_len(&self) -> usize {
        self.len
    }

    /// Returns true if no bytes are queued.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of queued parts.
    pub fn parts(&self) -> usize {
        self.parts.len()
    }

    /// Removes all queued parts.
    pub fn clear(&mut self) {
        self.parts.clear();
        self.len = 0;
    }

    /// Queues a part of `len` bytes written by `write`.
    ///
    /// `write` must fill [`Context::part`]. It is called once per serialization.
    pub fn append<F>(&mut self, len: usize, write: F) -> &mut Self
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.parts.push(Part {
            len,
            write: Box::new(write),
        });
        self.len += len;
        self
    }

    /// Queues a part of `len` bytes written by `write` from `value`.
    pub fn append_value<V>(
        &mut self,
        len: usize,
        write: fn(&mut Context<'_>, &V),
        value: V,
    ) -> &mut Self
    where
        V: Send + Sync + 'static,
    {
        self.append(len, move |ctx| write(ctx, &value))
    }

    /// Queues a fixed-width value in the given byte order.
    #[inline]
    pub fn put<T: Primitive>(&mut self, value: T, endian: Endian) -> &mut Self {
        self.append(T::SIZE, move |ctx| value.write(ctx.part(), endian))
    }

    /// Queues an unsigned byte.
    #[inline]
    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.put(value, Endian::Big)
    }

    impl_write!(u16, u32, u64, f32, f64);

    /// Queues an unsigned byte, failing if `value` does not fit.
    pub fn try_u8<V>(&mut self, value: V) -> Result<&mut Self, Error>
    where
        V: TryInto<u8> + fmt::Display + Copy,
    {
        let value = Self::narrow::<u8, V>(value)?;
        Ok(self.u8(value))
    }

    impl_try_write!(u16, u32, u64);

    fn narrow<T, V>(value: V) -> Result<T, Error>
    where
        V: TryInto<T> + fmt::Display + Copy,
    {
        value.try_into().map_err(|_| {
            Error::OutOfRange(format!(
                "{} does not fit in {}",
                value,
                std::any::type_name::<T>()
            ))
        })
    }

    /// Queues a boolean as `0x00` or `0x01`.
    pub fn boolean(&mut self, value: bool) -> &mut Self {
        self.u8(value as u8)
    }

    /// Queues the presence flag of an absent optional value.
    pub fn none(&mut self) -> &mut Self {
        self.boolean(false)
    }

    /// Queues the presence flag of a present optional value.
    pub fn some(&mut self) -> &mut Self {
        self.boolean(true)
    }

    /// Queues raw bytes.
    ///
    /// `data` is captured as is: a [`Bytes`] is shared rather than copied.
    pub fn bytes(&mut self, data: impl Into<Bytes>) -> &mut Self {
        let data = data.into();
        self.append(data.len(), move |ctx| ctx.part().copy_from_slice(&data))
    }

    /// Queues raw bytes, failing if `data` is not exactly `expected` bytes long.
    pub fn bytes_exact(
        &mut self,
        data: impl Into<Bytes>,
        expected: usize,
    ) -> Result<&mut Self, Error> {
        let data = data.into();
        if data.len() != expected {
            return Err(Error::OutOfRange(format!(
                "expected {} bytes, got {}",
                expected,
                data.len()
            )));
        }
        Ok(self.bytes(data))
    }

    /// Queues the UTF-8 bytes of `text` (without a length prefix).
    pub fn utf8(&mut self, text: &str) -> &mut Self {
        self.bytes(Bytes::copy_from_slice(text.as_bytes()))
    }

    /// Queues the UTF-8 bytes of `text`, failing if they are not exactly `expected` bytes long.
    pub fn utf8_exact(&mut self, text: &str, expected: usize) -> Result<&mut Self, Error> {
        self.bytes_exact(Bytes::copy_from_slice(text.as_bytes()), expected)
    }

    /// Queues a length prefix written by `prefix`, followed by `data`.
    pub fn prefixed_bytes(
        &mut self,
        prefix: impl Prefix,
        data: impl Into<Bytes>,
    ) -> Result<&mut Self, Error> {
        let data = data.into();
        self.atomic(|s| prefix.write_len(s, data.len()))?;
        Ok(self.bytes(data))
    }

    /// Queues a length prefix written by `prefix`, followed by the UTF-8 bytes of `text`.
    pub fn prefixed_utf8(&mut self, prefix: impl Prefix, text: &str) -> Result<&mut Self, Error> {
        self.prefixed_bytes(prefix, Bytes::copy_from_slice(text.as_bytes()))
    }

    /// Queues a presence flag followed, if `value` is present, by whatever `write` queues.
    pub fn option<T>(
        &mut self,
        value: Option<T>,
        write: impl FnOnce(&mut Self, T) -> Result<(), Error>,
    ) -> Result<&mut Self, Error> {
        self.atomic(|s| match value {
            None => {
                s.none();
                Ok(())
            }
            Some(value) => write(s.some(), value),
        })?;
        Ok(self)
    }

    /// Queues the parts of `value`.
    pub fn apply<S: Serialize + ?Sized>(&mut self, value: &S) -> Result<&mut Self, Error> {
        self.atomic(|s| value.serialize(s))?;
        Ok(self)
    }

    /// Queues a presence flag followed, if present, by the parts of `value`.
    pub fn apply_option<S: Serialize + ?Sized>(
        &mut self,
        value: Option<&S>,
    ) -> Result<&mut Self, Error> {
        self.option(value, |s, value| value.serialize(s))
    }

    /// Runs `f`, dropping every part it queued if it fails.
    fn atomic(&mut self, f: impl FnOnce(&mut Self) -> Result<(), Error>) -> Result<(), Error> {
        let (parts, len) = (self.parts.len(), self.len);
        let result = f(self);
        if result.is_err() {
            self.parts.truncate(parts);
            self.len = len;
        }
        result
    }

    fn write(&self, buf: &mut [u8], mut offset: usize) {
        for part in &self.parts {
            let mut ctx = Context {
                buf: &mut *buf,
                offset,
                len: part.len,
            };
            (part.write)(&mut ctx);
            offset += part.len;
        }
    }

    /// Writes all parts into a new buffer of exactly [`Self::byte_len`] bytes.
    pub fn serialize(&self) -> BytesMut {
        self.serialize_with(&Unique)
    }

    /// Writes all parts into a buffer obtained from `alloc`.
    pub fn serialize_with(&self, alloc: &impl Allocator) -> BytesMut {
        let mut buf = alloc.allocate_unique(self.len);
        self.write(&mut buf, 0);
        buf
    }

    /// Writes all parts into `buf`, starting at `offset`, and returns the number of bytes
    /// written.
    ///
    /// Fails without writing anything if `buf` is too small.
    pub fn serialize_into(&self, buf: &mut [u8], offset: usize) -> Result<usize, Error> {
        let fits = offset
            .checked_add(self.len)
            .is_some_and(|end| end <= buf.len());
        if !fits {
            return Err(Error::OutOfRange(format!(
                "{} bytes at offset {} exceed buffer of {} bytes",
                self.len,
                offset,
                buf.len()
            )));
        }
        self.write(buf, offset);
        Ok(self.len)
    }

    /// Serializes `value` into a new buffer.
    pub fn to_bytes<S: Serialize + ?Sized>(value: &S) -> Result<BytesMut, Error> {
        let mut s = Self::new();
        s.apply(value)?;
        Ok(s.serialize())
    }

    /// Serializes `value` into `buf`, starting at `offset`, and returns the number of bytes
    /// written.
    pub fn to_slice<S: Serialize + ?Sized>(
        value: &S,
        buf: &mut [u8],
        offset: usize,
    ) -> Result<usize, Error> {
        let mut s = Self::new();
        s.apply(value)?;
        s.serialize_into(buf, offset)
    }
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field("parts", &self.parts.len())
            .field("byte_len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Deserializer;

    struct Point {
        x: u16,
        y: u16,
    }

    impl Serialize for Point {
        fn serialize(&self, s: &mut Serializer) -> Result<(), Error> {
            s.u16(self.x).u16_le(self.y);
            Ok(())
        }
    }

    #[test]
    fn test_big_endian_default() {
        let mut s = Serializer::new();
        s.u8(0x42).u16(0x1234);
        assert_eq!(s.byte_len(), 3);
        assert_eq!(&s.serialize()[..], &[0x42, 0x12, 0x34]);
    }

    #[test]
    fn test_numbers() {
        let mut s = Serializer::new();
        s.u16_le(0x0102)
            .u32(0x01020304)
            .u32_le(0x01020304)
            .u64(0x0102030405060708)
            .u64_le(u64::MAX)
            .f32(1.0)
            .f64_le(-42.7);
        let buf = s.serialize();
        assert_eq!(buf.len(), 2 + 4 + 4 + 8 + 8 + 4 + 8);

        let mut d = Deserializer::new(buf.freeze());
        assert_eq!(d.u16_le().unwrap(), 0x0102);
        assert_eq!(d.u32().unwrap(), 0x01020304);
        assert_eq!(d.u32_le().unwrap(), 0x01020304);
        assert_eq!(d.u64().unwrap(), 0x0102030405060708);
        assert_eq!(d.u64_le().unwrap(), u64::MAX);
        assert_eq!(d.f32().unwrap(), 1.0);
        assert_eq!(d.f64_le().unwrap(), -42.7);
        assert_eq!(d.bytes_available(), 0);
    }

    #[test]
    fn test_special_floats_bit_exact() {
        let values = [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.0];
        let mut s = Serializer::new();
        for value in values {
            s.f64(value).f64_le(value);
        }
        let mut d = Deserializer::new(s.serialize().freeze());
        for value in values {
            assert_eq!(d.f64().unwrap().to_bits(), value.to_bits());
            assert_eq!(d.f64_le().unwrap().to_bits(), value.to_bits());
        }

        let nan = f32::from_bits(0x7fc0_0001);
        let mut s = Serializer::new();
        s.f32(nan).f32_le(nan);
        assert_eq!(
            &s.serialize()[..],
            &[0x7f, 0xc0, 0x00, 0x01, 0x01, 0x00, 0xc0, 0x7f]
        );
    }

    #[test]
    fn test_replay() {
        let mut s = Serializer::new();
        s.u32(7).utf8("abc").boolean(true);
        let first = s.serialize();
        let second = s.serialize();
        assert_eq!(first, second);
        assert_ne!(first.as_ptr(), second.as_ptr());

        let mut buf = [0xffu8; 10];
        assert_eq!(s.serialize_into(&mut buf, 2).unwrap(), 8);
        assert_eq!(&buf[..2], &[0xff, 0xff]);
        assert_eq!(&buf[2..], &first[..]);
    }

    #[test]
    fn test_try_range() {
        let mut s = Serializer::new();
        s.try_u8(255u32).unwrap();
        s.try_u16_le(0x1234u64).unwrap();
        assert_eq!(
            s.try_u8(256u32).unwrap_err(),
            Error::OutOfRange("256 does not fit in u8".into())
        );
        assert!(matches!(s.try_u16(-1i32), Err(Error::OutOfRange(_))));
        assert!(matches!(s.try_u32(1u64 << 32), Err(Error::OutOfRange(_))));
        assert!(matches!(s.try_u64_le(-5i64), Err(Error::OutOfRange(_))));

        // Failed calls queue nothing.
        assert_eq!(s.parts(), 2);
        assert_eq!(&s.serialize()[..], &[0xff, 0x34, 0x12]);
    }

    #[test]
    fn test_boolean_and_presence() {
        let mut s = Serializer::new();
        s.boolean(false).boolean(true).none().some();
        assert_eq!(&s.serialize()[..], &[0x00, 0x01, 0x00, 0x01]);
    }

    #[test]
    fn test_bytes() {
        let mut s = Serializer::new();
        s.bytes(vec![0x01, 0x02]);
        s.bytes_exact(Bytes::from_static(&[0x03]), 1).unwrap();
        assert!(matches!(
            s.bytes_exact(vec![0x04, 0x05], 3),
            Err(Error::OutOfRange(_))
        ));
        s.utf8("é");
        assert!(s.utf8_exact("é", 1).is_err());
        s.utf8_exact("ok", 2).unwrap();
        assert_eq!(
            &s.serialize()[..],
            &[0x01, 0x02, 0x03, 0xc3, 0xa9, b'o', b'k']
        );
    }

    #[test]
    fn test_prefixed() {
        let mut s = Serializer::new();
        s.prefixed_utf8(LengthPrefix::U16, "foo").unwrap();
        s.prefixed_bytes(LengthPrefix::U32Le, vec![0xaa]).unwrap();
        s.prefixed_utf8(
            |s: &mut Serializer, len: usize| s.try_u8(len + 1).map(|_| ()),
            "x",
        )
        .unwrap();
        assert_eq!(
            &s.serialize()[..],
            &[0x00, 0x03, b'f', b'o', b'o', 0x01, 0x00, 0x00, 0x00, 0xaa, 0x02, b'x']
        );

        let mut d = Deserializer::new(s.serialize().freeze());
        assert_eq!(d.prefixed_utf8(LengthPrefix::U16, ..).unwrap(), "foo");
        assert_eq!(
            &d.prefixed_bytes(LengthPrefix::U32Le, ..).unwrap()[..],
            &[0xaa]
        );
    }

    #[test]
    fn test_prefixed_too_long() {
        let mut s = Serializer::new();
        let data = vec![0u8; 256];
        assert!(matches!(
            s.prefixed_bytes(LengthPrefix::U8, data),
            Err(Error::OutOfRange(_))
        ));
        assert!(s.is_empty());
        assert_eq!(s.parts(), 0);
    }

    #[test]
    fn test_option() {
        let mut s = Serializer::new();
        s.option(Some(0x0102u16), |s, v| {
            s.u16(v);
            Ok(())
        })
        .unwrap();
        s.option(None::<u16>, |s, v| {
            s.u16(v);
            Ok(())
        })
        .unwrap();

        // A failing writer drops the presence flag too.
        assert!(s.option(Some(300u32), |s, v| s.try_u8(v).map(|_| ())).is_err());
        assert_eq!(&s.serialize()[..], &[0x01, 0x01, 0x02, 0x00]);

        let mut d = Deserializer::new(s.serialize().freeze());
        assert_eq!(d.option(|d| d.u16()).unwrap(), Some(0x0102));
        assert_eq!(d.option(|d| d.u16()).unwrap(), None);
    }

    #[test]
    fn test_apply() {
        let point = Point { x: 1, y: 2 };
        let mut s = Serializer::new();
        s.apply(&point).unwrap();
        s.apply(&|s: &mut Serializer| -> Result<(), Error> {
            s.u8(9);
            Ok(())
        })
        .unwrap();
        s.apply_option(Some(&point)).unwrap();
        s.apply_option(None::<&Point>).unwrap();
        assert_eq!(
            &s.serialize()[..],
            &[0x00, 0x01, 0x02, 0x00, 0x09, 0x01, 0x00, 0x01, 0x02, 0x00, 0x00]
        );
    }

    #[test]
    fn test_apply_failure_rolls_back() {
        let mut s = Serializer::new();
        s.u8(1);
        let failing = |s: &mut Serializer| -> Result<(), Error> {
            s.u32(5);
            s.try_u8(1000u32)?;
            Ok(())
        };
        assert!(s.apply(&failing).is_err());
        assert_eq!(s.byte_len(), 1);
        assert!(s.apply_option(Some(&failing)).is_err());
        assert_eq!(&s.serialize()[..], &[0x01]);
    }

    #[test]
    fn test_static_helpers() {
        let point = Point { x: 0x0a0b, y: 0x0c0d };
        assert_eq!(
            &Serializer::to_bytes(&point).unwrap()[..],
            &[0x0a, 0x0b, 0x0d, 0x0c]
        );

        let mut buf = [0u8; 5];
        assert_eq!(Serializer::to_slice(&point, &mut buf, 1).unwrap(), 4);
        assert_eq!(buf, [0x00, 0x0a, 0x0b, 0x0d, 0x0c]);
        assert!(matches!(
            Serializer::to_slice(&point, &mut buf, 2),
            Err(Error::OutOfRange(_))
        ));
        assert!(Serializer::to_slice(&point, &mut buf, usize::MAX).is_err());
    }

    #[test]
    fn test_append_context() {
        fn write_pair(ctx: &mut Context<'_>, value: &(u8, u8)) {
            let part = ctx.part();
            part[0] = value.0;
            part[1] = value.1;
        }

        let mut s = Serializer::new();
        s.append_value(2, write_pair, (0x10, 0x20));
        // Checksum over everything written so far.
        s.append(1, |ctx| {
            let sum = ctx.buffer()[..ctx.offset()]
                .iter()
                .fold(0u8, |acc, b| acc ^ b);
            ctx.part()[0] = sum;
        });
        s.append(0, |ctx| assert!(ctx.is_empty()));
        assert_eq!(&s.serialize()[..], &[0x10, 0x20, 0x30]);
    }

    #[test]
    fn test_serialize_with_allocator() {
        struct Counting(std::sync::atomic::AtomicUsize);

        impl Allocator for Counting {
            fn allocate_unique(&self, len: usize) -> BytesMut {
                self.0.fetch_add(len, std::sync::atomic::Ordering::Relaxed);
                BytesMut::zeroed(len)
            }

            fn with_scratch<R>(&self, min_len: usize, f: impl FnOnce(&mut [u8]) -> R) -> R {
                Unique.with_scratch(min_len, f)
            }
        }

        let alloc = Counting(Default::default());
        let mut s = Serializer::new();
        s.u32(1).u16(2);
        assert_eq!(&s.serialize_with(&alloc)[..], &[0, 0, 0, 1, 0, 2]);
        assert_eq!(alloc.0.load(std::sync::atomic::Ordering::Relaxed), 6);
    }

    #[test]
    fn test_clear() {
        let mut s = Serializer::with_capacity(4);
        s.u64(1);
        assert_eq!(format!("{s:?}"), "Serializer { parts: 1, byte_len: 8 }");
        s.clear();
        assert!(s.is_empty());
        assert!(s.serialize().is_empty());
    }
}
