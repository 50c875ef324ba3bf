//! Base32 encoding with the RFC 4648 alphabet (`A-Z`, `2-7`).

use super::{ascii, digit, padding, reverse, Error};

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const DECODE: [u16; 256] = reverse(ALPHABET);

fn encode_inner(data: &[u8], pad: bool) -> String {
    let len = if pad {
        data.len().div_ceil(5) * 8
    } else {
        (data.len() * 8).div_ceil(5)
    };
    let mut out = Vec::with_capacity(len);
    let mut acc = 0u32;
    let mut bits = 0u32;
    for byte in data {
        acc = (acc << 8) | u32::from(*byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((acc >> bits) & 0x1f) as usize]);
        }
        acc &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(ALPHABET[((acc << (5 - bits)) & 0x1f) as usize]);
    }
    out.resize(len, b'=');
    ascii(&out)
}

/// Encodes `data` without padding.
pub fn encode(data: &[u8]) -> String {
    encode_inner(data, false)
}

/// Encodes `data`, padding the output to a multiple of 8 characters with `=`.
pub fn encode_padded(data: &[u8]) -> String {
    encode_inner(data, true)
}

/// Decodes uppercase base32 text. Trailing padding is ignored.
pub fn decode(text: &str) -> Result<Vec<u8>, Error> {
    let text = text.as_bytes();
    let data = &text[..text.len() - padding(text)];
    if matches!(data.len() % 8, 1 | 3 | 6) {
        return Err(Error::InvalidLength(text.len()));
    }
    let mut out = Vec::with_capacity(data.len() * 5 / 8);
    let mut acc = 0u32;
    let mut bits = 0u32;
    for (i, byte) in data.iter().enumerate() {
        acc = (acc << 5) | u32::from(digit(&DECODE, i, *byte)?);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
            acc &= (1 << bits) - 1;
        }
    }
    Ok(out)
}
