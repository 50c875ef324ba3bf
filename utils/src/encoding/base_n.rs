//! Encoding in an arbitrary base using a custom alphabet.
//!
//! # Overview
//!
//! The input bytes are read as one big-endian number, which is then written out in the base
//! of the [`Alphabet`]. Both directions run in `O(n²)` time, so input sizes are capped by a
//! byte limit ([`BYTE_LIMIT`] unless specified).
//!
//! A number does not remember its leading zero bytes. Padded encodings therefore prepend the
//! zero digit until the output has `ceil(8 * len / log2(base))` digits, which is what the
//! decoder expects to recover the original length: it produces
//! `floor(ceil(digits * log2(base)) / 8)` bytes.
//!
//! # Example
//!
//! ```
//! use bytecraft_utils::encoding::base_n::{decode, encode, BASE58};
//!
//! let text = encode(&[0x00, 0x01, 0x02], &BASE58).unwrap();
//! assert_eq!(text, "1115T");
//! assert_eq!(decode(&text, &BASE58).unwrap(), vec![0x00, 0x01, 0x02]);
//! ```

use super::{ascii, digit, reverse, Error};

/// Default maximum number of bytes to encode or decode.
pub const BYTE_LIMIT: usize = 256;

/// Digits of a base-N encoding, in ascending order of value.
#[derive(Clone, Debug)]
pub struct Alphabet {
    chars: &'static [u8],
    values: [u16; 256],
}

/// `0-9A-Za-z`
pub static BASE62: Alphabet =
    Alphabet::from_static(b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz");

/// Bitcoin alphabet: `1-9A-Za-z` without `0`, `I`, `O` and `l`.
pub static BASE58: Alphabet =
    Alphabet::from_static(b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz");

impl Alphabet {
    const fn from_static(chars: &'static [u8]) -> Self {
        Self {
            chars,
            values: reverse(chars),
        }
    }

    /// Creates an alphabet from ASCII digits.
    ///
    /// Bases that are a power of two are rejected unless `allow_binary` is set: those are
    /// better served by a bitwise encoding such as hex, base32 or base64.
    pub fn new(chars: &'static str, allow_binary: bool) -> Result<Self, Error> {
        let bytes = chars.as_bytes();
        if !chars.is_ascii() {
            return Err(Error::InvalidAlphabet("non-ascii characters are not supported"));
        }
        if bytes.len() < 2 {
            return Err(Error::InvalidAlphabet("at least two characters are required"));
        }
        if !allow_binary && bytes.len().is_power_of_two() {
            return Err(Error::InvalidAlphabet("binary based alphabets should not be used"));
        }
        let alphabet = Self::from_static(bytes);
        let distinct = alphabet.values.iter().filter(|v| **v != 0).count();
        if distinct < bytes.len() {
            return Err(Error::InvalidAlphabet("alphabet contains duplicate characters"));
        }
        Ok(alphabet)
    }

    /// Number of digits.
    pub fn base(&self) -> usize {
        self.chars.len()
    }

    /// The digit characters, in ascending order of value.
    pub fn chars(&self) -> &str {
        // Only constructed from `&str` or from ASCII literals.
        std::str::from_utf8(self.chars).unwrap_or_default()
    }

    fn bits_per_digit(&self) -> f64 {
        (self.base() as f64).log2()
    }

    /// Number of digits a padded encoding of `len` bytes has.
    pub fn encoded_len(&self, len: usize) -> usize {
        ((len * 8) as f64 / self.bits_per_digit()).ceil() as usize
    }

    /// Number of bytes `digits` digits decode to.
    pub fn decoded_len(&self, digits: usize) -> usize {
        (digits as f64 * self.bits_per_digit()).ceil() as usize / 8
    }
}

/// Converts big-endian digits of `from` into little-endian digits of `to`.
fn convert(input: impl Iterator<Item = u32>, from: u32, to: u32) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    for value in input {
        let mut carry = value;
        for digit in out.iter_mut() {
            carry += u32::from(*digit) * from;
            *digit = (carry % to) as u8;
            carry /= to;
        }
        while carry > 0 {
            out.push((carry % to) as u8);
            carry /= to;
        }
    }
    out
}

/// Encodes `data` with padding and the default byte limit.
pub fn encode(data: &[u8], alphabet: &Alphabet) -> Result<String, Error> {
    encode_with_limit(data, alphabet, true, BYTE_LIMIT)
}

/// Encodes `data` without padding and the default byte limit.
///
/// Leading zero bytes are lost: the output is only the number `data` represents.
pub fn encode_unpadded(data: &[u8], alphabet: &Alphabet) -> Result<String, Error> {
    encode_with_limit(data, alphabet, false, BYTE_LIMIT)
}

/// Encodes `data`, failing if it is longer than `limit` bytes.
pub fn encode_with_limit(
    data: &[u8],
    alphabet: &Alphabet,
    padding: bool,
    limit: usize,
) -> Result<String, Error> {
    if data.len() > limit {
        return Err(Error::LimitExceeded(data.len(), limit));
    }
    let mut digits = convert(
        data.iter().map(|b| u32::from(*b)),
        256,
        alphabet.base() as u32,
    );
    if padding {
        let len = alphabet.encoded_len(data.len());
        if digits.len() < len {
            digits.resize(len, 0);
        }
    }
    let out: Vec<u8> = digits
        .iter()
        .rev()
        .map(|d| alphabet.chars[*d as usize])
        .collect();
    Ok(ascii(&out))
}

/// Encodes a number without padding.
///
/// Zero encodes to the empty string.
pub fn encode_number(value: u64, alphabet: &Alphabet) -> String {
    let base = alphabet.base() as u64;
    let mut out = Vec::new();
    let mut value = value;
    while value > 0 {
        out.push(alphabet.chars[(value % base) as usize]);
        value /= base;
    }
    out.reverse();
    ascii(&out)
}

/// Decodes text with the default byte limit.
pub fn decode(text: &str, alphabet: &Alphabet) -> Result<Vec<u8>, Error> {
    decode_with_limit(text, alphabet, BYTE_LIMIT)
}

/// Decodes text, failing if it would produce more than `limit` bytes.
///
/// The first digit is assumed to be only partially used, as it is in padded encodings. Text
/// whose value does not fit in the expected number of bytes is rejected.
pub fn decode_with_limit(text: &str, alphabet: &Alphabet, limit: usize) -> Result<Vec<u8>, Error> {
    let text = text.as_bytes();
    let len = alphabet.decoded_len(text.len());
    if len > limit {
        return Err(Error::LimitExceeded(len, limit));
    }
    let digits = text
        .iter()
        .enumerate()
        .map(|(i, b)| digit(&alphabet.values, i, *b).map(u32::from))
        .collect::<Result<Vec<_>, _>>()?;
    let mut bytes = convert(digits.into_iter(), alphabet.base() as u32, 256);
    if bytes.len() > len {
        return Err(Error::InvalidLength(text.len()));
    }
    bytes.resize(len, 0);
    bytes.reverse();
    Ok(bytes)
}
