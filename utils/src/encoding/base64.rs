//! Base64 and base64url encoding (RFC 4648).
//!
//! Decoders ignore trailing padding but do not accept concatenated encodings.

use super::{ascii, digit, padding, reverse, Error};

const STANDARD: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const URL: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

const DECODE_STANDARD: [u16; 256] = reverse(STANDARD);
const DECODE_URL: [u16; 256] = reverse(URL);

fn encode_inner(data: &[u8], alphabet: &[u8; 64], pad: bool) -> String {
    let len = if pad {
        data.len().div_ceil(3) * 4
    } else {
        (data.len() * 4).div_ceil(3)
    };
    let mut out = Vec::with_capacity(len);
    for chunk in data.chunks(3) {
        let a = chunk[0];
        let b = chunk.get(1).copied().unwrap_or(0);
        let c = chunk.get(2).copied().unwrap_or(0);
        out.push(alphabet[(a >> 2) as usize]);
        out.push(alphabet[(((a & 0x03) << 4) | (b >> 4)) as usize]);
        if chunk.len() > 1 {
            out.push(alphabet[(((b & 0x0f) << 2) | (c >> 6)) as usize]);
        }
        if chunk.len() > 2 {
            out.push(alphabet[(c & 0x3f) as usize]);
        }
    }
    out.resize(len, b'=');
    ascii(&out)
}

fn decode_inner(text: &str, table: &[u16; 256]) -> Result<Vec<u8>, Error> {
    let text = text.as_bytes();
    let data = &text[..text.len() - padding(text)];
    if data.len() % 4 == 1 {
        return Err(Error::InvalidLength(text.len()));
    }
    let mut out = Vec::with_capacity(data.len() * 3 / 4);
    let mut acc = 0u32;
    let mut bits = 0u32;
    for (i, byte) in data.iter().enumerate() {
        acc = (acc << 6) | u32::from(digit(table, i, *byte)?);
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
            acc &= (1 << bits) - 1;
        }
    }
    Ok(out)
}

/// Encodes `data` with the standard alphabet and padding.
pub fn encode(data: &[u8]) -> String {
    encode_inner(data, STANDARD, true)
}

/// Encodes `data` with the standard alphabet, without padding.
pub fn encode_unpadded(data: &[u8]) -> String {
    encode_inner(data, STANDARD, false)
}

/// Encodes `data` with the URL-safe alphabet, without padding.
pub fn encode_url(data: &[u8]) -> String {
    encode_inner(data, URL, false)
}

/// Encodes `data` with the URL-safe alphabet and padding.
pub fn encode_url_padded(data: &[u8]) -> String {
    encode_inner(data, URL, true)
}

/// Decodes text encoded with the standard alphabet.
pub fn decode(text: &str) -> Result<Vec<u8>, Error> {
    decode_inner(text, &DECODE_STANDARD)
}

/// Decodes text encoded with the URL-safe alphabet.
pub fn decode_url(text: &str) -> Result<Vec<u8>, Error> {
    decode_inner(text, &DECODE_URL)
}
