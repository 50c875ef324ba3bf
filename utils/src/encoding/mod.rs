//! Text encodings for binary data.
//!
//! Every encoder produces ASCII and every decoder rejects characters outside of its alphabet.
//! Decoders report the first offending byte together with its index in the input.

use thiserror::Error;

pub mod base32;
pub mod base64;
pub mod base_n;
pub mod hex;

/// Errors that can occur when encoding or decoding text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid length: {0}")]
    InvalidLength(usize),
    #[error("invalid character {byte:#04x} at index {index}")]
    InvalidCharacter { index: usize, byte: u8 },
    #[error("limit exceeded: {0} > {1}")]
    LimitExceeded(usize, usize),
    #[error("invalid alphabet: {0}")]
    InvalidAlphabet(&'static str),
}

/// Builds a reverse lookup table for `alphabet`.
///
/// Valid entries carry `0x100` so that the zero digit can be told apart from a missing one.
pub(crate) const fn reverse(alphabet: &[u8]) -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < alphabet.len() {
        table[alphabet[i] as usize] = i as u16 | 0x100;
        i += 1;
    }
    table
}

/// Looks up the digit of `byte` in a table built by [`reverse`].
#[inline]
pub(crate) fn digit(table: &[u16; 256], index: usize, byte: u8) -> Result<u8, Error> {
    match table[byte as usize] {
        0 => Err(Error::InvalidCharacter { index, byte }),
        value => Ok(value as u8),
    }
}

/// Collects ASCII bytes into a `String`.
pub(crate) fn ascii(buf: &[u8]) -> String {
    buf.iter().map(|b| *b as char).collect()
}

/// Number of trailing `=` characters.
pub(crate) fn padding(text: &[u8]) -> usize {
    text.iter().rev().take_while(|b| **b == b'=').count()
}
