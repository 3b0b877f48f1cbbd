//! RFC 4648 base32 codec
//!
//! Encoding emits the unpadded uppercase alphabet. Decoding is lenient the way
//! authenticator apps expect: case-insensitive, spaces ignored, trailing `=`
//! stripped, and a dangling partial symbol at the end is dropped instead of
//! rejected, so the output is always `floor(symbols * 5 / 8)` bytes.

use data_encoding::BASE32_NOPAD;

use crate::{Error, Result};

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Encodes bytes as unpadded uppercase base32
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    BASE32_NOPAD.encode(bytes)
}

/// Decodes a base32 string
///
/// # Errors
///
/// Returns [`Error::InvalidCharacter`] for the first symbol outside `A-Z2-7`
/// (in either case) once spaces and trailing padding are removed.
pub fn decode(input: &str) -> Result<Vec<u8>> {
    let cleaned: String = input.chars().filter(|&c| c != ' ').collect();
    let cleaned = cleaned.trim_end_matches('=');

    let mut symbols = cleaned
        .chars()
        .map(|ch| symbol_value(ch).ok_or(Error::InvalidCharacter(ch)))
        .collect::<Result<Vec<u8>>>()?;

    // 1, 3 and 6 trailing symbols carry less than one extra byte
    if matches!(symbols.len() % 8, 1 | 3 | 6) {
        symbols.pop();
    }

    // leftover low bits of the last symbol never reach a full byte
    let leftover = (symbols.len() * 5) % 8;
    if let Some(last) = symbols.last_mut() {
        *last &= !((1u8 << leftover) - 1);
    }

    let canonical: Vec<u8> = symbols.iter().map(|&v| ALPHABET[usize::from(v)]).collect();

    BASE32_NOPAD.decode(&canonical).map_err(|e| {
        let ch = canonical.get(e.position).map_or('=', |&b| char::from(b));
        Error::InvalidCharacter(ch)
    })
}

/// Returns `true` when every symbol decodes, ignoring case, spaces and trailing padding
#[must_use]
pub fn is_valid(input: &str) -> bool {
    decode(input).is_ok()
}

const fn symbol_value(ch: char) -> Option<u8> {
    match ch {
        'A'..='Z' => Some(ch as u8 - b'A'),
        'a'..='z' => Some(ch as u8 - b'a'),
        '2'..='7' => Some(ch as u8 - b'2' + 26),
        _ => None,
    }
}
