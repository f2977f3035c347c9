//! Convert bytes to and from the hexadecimal strings carried across the boundary.
//!
//! Encoding always produces upper-case digits, most-significant nibble first, with no prefix and
//! exactly two characters per byte. Decoding is strict: a string of the wrong length or containing
//! any non-hexadecimal character is rejected (it is never silently read as zero). Both upper- and
//! lower-case digits are accepted when decoding.

use thiserror::Error;

/// Digits used when encoding.
const ALPHABET: &[u8; 16] = b"0123456789ABCDEF";

/// Errors that can occur when decoding a hexadecimal string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("odd length: {0}")]
    OddLength(usize),
    #[error("invalid length: expected {0} characters, found {1}")]
    InvalidLength(usize, usize),
    #[error("invalid character {0:?} at {1}")]
    InvalidCharacter(char, usize),
    #[error("unable to allocate {0} characters")]
    Allocation(usize),
}

/// Returns the number of characters needed to encode `len` bytes.
pub const fn encoded_len(len: usize) -> usize {
    len * 2
}

/// Appends the encoding of `bytes` to `out`.
pub fn encode_into(out: &mut String, bytes: &[u8]) {
    for byte in bytes {
        out.push(ALPHABET[(byte >> 4) as usize] as char);
        out.push(ALPHABET[(byte & 0xF) as usize] as char);
    }
}

/// Encodes the concatenation of `parts`, reporting (rather than aborting on) a failed allocation.
///
/// One spare byte is reserved so a C terminator can be appended without reallocating.
pub fn try_encode_all(parts: &[&[u8]]) -> Result<String, Error> {
    let len = encoded_len(parts.iter().map(|part| part.len()).sum());
    let mut out = String::new();
    out.try_reserve_exact(len + 1)
        .map_err(|_| Error::Allocation(len))?;
    for part in parts {
        encode_into(&mut out, part);
    }
    Ok(out)
}

/// Encodes `bytes`, reporting (rather than aborting on) a failed allocation.
pub fn try_encode(bytes: &[u8]) -> Result<String, Error> {
    try_encode_all(&[bytes])
}

/// Encodes `bytes` as an upper-case hexadecimal string.
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(encoded_len(bytes.len()));
    encode_into(&mut out, bytes);
    out
}

/// Removes a leading `0x` or `0X`, if present.
pub fn strip_prefix(hex: &str) -> &str {
    hex.strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex)
}

fn nibble(hex: &str, index: usize) -> Result<u8, Error> {
    match hex.as_bytes()[index] {
        c @ b'0'..=b'9' => Ok(c - b'0'),
        c @ b'a'..=b'f' => Ok(c - b'a' + 10),
        c @ b'A'..=b'F' => Ok(c - b'A' + 10),
        // Every earlier byte is ASCII, so `index` is a char boundary.
        c => Err(Error::InvalidCharacter(
            hex[index..].chars().next().unwrap_or(c as char),
            index,
        )),
    }
}

/// Decodes `hex` into `out`, requiring exactly `2 * out.len()` characters.
pub fn decode_into(hex: &str, out: &mut [u8]) -> Result<(), Error> {
    if hex.len() % 2 != 0 {
        return Err(Error::OddLength(hex.len()));
    }
    let expected = encoded_len(out.len());
    if hex.len() != expected {
        return Err(Error::InvalidLength(expected, hex.len()));
    }
    for (i, byte) in out.iter_mut().enumerate() {
        let high = nibble(hex, 2 * i)?;
        let low = nibble(hex, 2 * i + 1)?;
        *byte = (high << 4) | low;
    }
    Ok(())
}

/// Decodes `hex` into exactly `len` bytes.
pub fn decode(hex: &str, len: usize) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|_| Error::Allocation(encoded_len(len)))?;
    out.resize(len, 0);
    decode_into(hex, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode(&[]), "");
        assert_eq!(encode(&[0x01]), "01");
        assert_eq!(encode(&[0xab, 0xcd, 0x0f, 0xf0]), "ABCD0FF0");
        assert_eq!(try_encode(&[0xde, 0xad]).unwrap(), "DEAD");
    }

    #[test]
    fn test_encode_into_appends() {
        let mut out = String::from("AA");
        encode_into(&mut out, &[0x00, 0xff]);
        assert_eq!(out, "AA00FF");
    }

    #[test]
    fn test_round_trip_lengths() {
        for len in [0usize, 1, 2, 31, 32, 48, 257] {
            let bytes: Vec<u8> = (0..len).map(|i| (i * 37 + 11) as u8).collect();
            let encoded = encode(&bytes);
            assert_eq!(encoded.len(), 2 * len);
            assert!(encoded
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
            assert_eq!(decode(&encoded, len).unwrap(), bytes);
        }
    }

    #[test]
    fn test_decode_mixed_case() {
        assert_eq!(decode("aBcD", 2).unwrap(), vec![0xab, 0xcd]);
    }

    #[test]
    fn test_decode_rejects_odd_length() {
        assert_eq!(decode("abc", 2), Err(Error::OddLength(3)));
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert_eq!(decode("abcd", 3), Err(Error::InvalidLength(6, 4)));
        assert_eq!(decode("abcdef", 2), Err(Error::InvalidLength(4, 6)));
    }

    #[test]
    fn test_decode_rejects_invalid_characters() {
        assert_eq!(decode("0g", 1), Err(Error::InvalidCharacter('g', 1)));
        assert_eq!(decode("+1", 1), Err(Error::InvalidCharacter('+', 0)));
        assert_eq!(decode("  ", 1), Err(Error::InvalidCharacter(' ', 0)));
        assert_eq!(decode("0xab", 2), Err(Error::InvalidCharacter('x', 1)));
    }

    #[test]
    fn test_decode_rejects_non_ascii() {
        assert_eq!(decode("0é", 3).unwrap_err(), Error::OddLength(3));
        // "é" is two bytes, so the length check passes but the character does not
        assert_eq!(decode("éa0", 2), Err(Error::InvalidCharacter('é', 0)));
    }

    #[test]
    fn test_try_encode_leaves_room_for_terminator() {
        let encoded = try_encode_all(&[&[0xab; 48][..], &[0x01; 32][..]]).unwrap();
        assert_eq!(encoded.len(), 160);
        assert!(encoded.starts_with("ABAB"));
        assert!(encoded.ends_with("0101"));
        assert!(encoded.capacity() > encoded.len());

        let empty = try_encode(&[]).unwrap();
        assert!(empty.is_empty());
        assert!(empty.capacity() >= 1);
    }

    #[test]
    fn test_strip_prefix_only_once() {
        assert_eq!(strip_prefix("0x0xab"), "0xab");
    }
}
