//! Base16 (hexadecimal) encoding.
//!
//! Encoders emit two characters per byte, either all lowercase or all uppercase. The decoder
//! accepts both cases, mixed freely.

use super::{ascii, digit, reverse, Error};
use bytecraft_codec::{Allocator, Unique};
use bytes::BytesMut;

const LOWER: &[u8; 16] = b"0123456789abcdef";
const UPPER: &[u8; 16] = b"0123456789ABCDEF";

const DECODE: [u16; 256] = {
    let mut table = reverse(LOWER);
    let upper = reverse(UPPER);
    let mut i = 0;
    while i < 256 {
        if upper[i] != 0 {
            table[i] = upper[i];
        }
        i += 1;
    }
    table
};

/// Encodes `data` as lowercase hex.
pub fn encode(data: &[u8]) -> String {
    encode_with(data, false, &Unique)
}

/// Encodes `data` as uppercase hex.
pub fn encode_upper(data: &[u8]) -> String {
    encode_with(data, true, &Unique)
}

/// Encodes `data` as hex, staging the ASCII output in a scratch buffer from `alloc`.
pub fn encode_with(data: &[u8], upper: bool, alloc: &impl Allocator) -> String {
    let table = if upper { UPPER } else { LOWER };
    alloc.with_scratch(data.len() * 2, |buf| {
        for (pair, byte) in buf.chunks_exact_mut(2).zip(data) {
            pair[0] = table[(byte >> 4) as usize];
            pair[1] = table[(byte & 0x0f) as usize];
        }
        ascii(buf)
    })
}

/// Decodes hex text of either case.
pub fn decode(text: &str) -> Result<Vec<u8>, Error> {
    decode_with(text, &Unique).map(|buf| buf.to_vec())
}

/// Decodes hex text into a buffer from `alloc`.
pub fn decode_with(text: &str, alloc: &impl Allocator) -> Result<BytesMut, Error> {
    let text = text.as_bytes();
    if text.len() % 2 != 0 {
        return Err(Error::InvalidLength(text.len()));
    }
    let mut out = alloc.allocate_unique(text.len() / 2);
    for (i, (byte, pair)) in out.iter_mut().zip(text.chunks_exact(2)).enumerate() {
        let hi = digit(&DECODE, 2 * i, pair[0])?;
        let lo = digit(&DECODE, 2 * i + 1, pair[1])?;
        *byte = (hi << 4) | lo;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_encode() {
        assert_eq!(encode(&[]), "");
        assert_eq!(encode(&[0x00, 0x01, 0xab, 0xff]), "0001abff");
        assert_eq!(encode_upper(&[0x00, 0x01, 0xab, 0xff]), "0001ABFF");
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
        assert_eq!(decode("0001abff").unwrap(), vec![0x00, 0x01, 0xab, 0xff]);
        assert_eq!(decode("0001ABFF").unwrap(), vec![0x00, 0x01, 0xab, 0xff]);
        assert_eq!(decode("aBcD").unwrap(), vec![0xab, 0xcd]);
    }

    #[test]
    fn test_decode_invalid() {
        assert_eq!(decode("abc"), Err(Error::InvalidLength(3)));
        assert_eq!(
            decode("0g"),
            Err(Error::InvalidCharacter {
                index: 1,
                byte: b'g'
            })
        );
        assert_eq!(
            decode("zz00"),
            Err(Error::InvalidCharacter {
                index: 0,
                byte: b'z'
            })
        );
        // Multi-byte characters are rejected byte by byte.
        assert_eq!(
            decode("ä"),
            Err(Error::InvalidCharacter {
                index: 0,
                byte: 0xc3
            })
        );
    }

    #[test]
    fn test_random_data() {
        let mut rng = StdRng::seed_from_u64(0);
        for len in 0..64 {
            let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            assert_eq!(decode(&encode(&data)).unwrap(), data);
            assert_eq!(decode(&encode_upper(&data)).unwrap(), data);
        }
    }

    #[test]
    fn test_every_byte() {
        for byte in 0..=255u8 {
            let text = encode(&[byte]);
            assert_eq!(text, format!("{byte:02x}"));
            assert_eq!(decode(&text.to_uppercase()).unwrap(), vec![byte]);
        }
    }
}
