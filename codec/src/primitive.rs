//! Fixed-width numeric values and their byte order.
//!
//! Integers are unsigned and floats are IEEE-754 binary32/binary64. Every value is read and
//! written with an explicit [`Endian`]: there is no implicit host byte order.

use bytes::{Buf, BufMut};

/// Byte order of a fixed-width value.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Endian {
    #[default]
    Big,
    Little,
}

/// A fixed-width value with a bit-exact binary representation.
pub trait Primitive: Copy + Send + Sync + 'static {
    /// Number of bytes occupied by the value.
    const SIZE: usize;

    /// Decodes a value from exactly [`Self::SIZE`] bytes.
    fn read(src: &[u8], endian: Endian) -> Self;

    /// Encodes a value into exactly [`Self::SIZE`] bytes.
    fn write(self, dst: &mut [u8], endian: Endian);
}

macro_rules! impl_primitive {
    ($type:ty, $get:ident, $get_le:ident, $put:ident, $put_le:ident) => {
        impl Primitive for $type {
            const SIZE: usize = std::mem::size_of::<$type>();

            #[inline]
            fn read(mut src: &[u8], endian: Endian) -> Self {
                debug_assert_eq!(src.len(), Self::SIZE);
                match endian {
                    Endian::Big => src.$get(),
                    Endian::Little => src.$get_le(),
                }
            }

            #[inline]
            fn write(self, mut dst: &mut [u8], endian: Endian) {
                debug_assert_eq!(dst.len(), Self::SIZE);
                match endian {
                    Endian::Big => dst.$put(self),
                    Endian::Little => dst.$put_le(self),
                }
            }
        }
    };
}

impl_primitive!(u8, get_u8, get_u8, put_u8, put_u8);
impl_primitive!(u16, get_u16, get_u16_le, put_u16, put_u16_le);
impl_primitive!(u32, get_u32, get_u32_le, put_u32, put_u32_le);
impl_primitive!(u64, get_u64, get_u64_le, put_u64, put_u64_le);
impl_primitive!(f32, get_f32, get_f32_le, put_f32, put_f32_le);
impl_primitive!(f64, get_f64, get_f64_le, put_f64, put_f64_le);

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<T: Primitive>(value: T, endian: Endian) -> Vec<u8> {
        let mut buf = vec![0u8; T::SIZE];
        value.write(&mut buf, endian);
        buf
    }

    #[test]
    fn test_endianness() {
        assert_eq!(encode(0x0102u16, Endian::Big), [0x01, 0x02]);
        assert_eq!(encode(0x0102u16, Endian::Little), [0x02, 0x01]);
        assert_eq!(
            encode(0x01020304u32, Endian::Big),
            [0x01, 0x02, 0x03, 0x04]
        );
        assert_eq!(
            encode(0x0102030405060708u64, Endian::Little),
            [0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
        assert_eq!(encode(1.0f32, Endian::Big), [0x3F, 0x80, 0x00, 0x00]);
        assert_eq!(encode(0xABu8, Endian::Little), [0xAB]);
    }

    #[test]
    fn test_float_bits_preserved() {
        let nan = f32::from_bits(0x7fc0_0001);
        let decoded = f32::read(&encode(nan, Endian::Big), Endian::Big);
        assert_eq!(decoded.to_bits(), nan.to_bits());

        let nan = f64::from_bits(0xfff8_0000_0000_0001);
        let decoded = f64::read(&encode(nan, Endian::Little), Endian::Little);
        assert_eq!(decoded.to_bits(), nan.to_bits());
    }
}
