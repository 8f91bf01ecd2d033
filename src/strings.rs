//! Character-set handling for string fields.
//!
//! String fields are stored as raw byte runs, either length-prefixed or
//! null-terminated, in one of three legacy character sets chosen by a format
//! flag or by the version of the enclosing movie.

use encoding_rs::{SHIFT_JIS, UTF_16LE, WINDOWS_1252};

/// The character set of a string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringEncoding {
    /// ANSI / Latin-1, stored one byte per character (WINDOWS-1252).
    Latin1,
    /// Shift-JIS, one or two bytes per character.
    ShiftJis,
    /// UCS-2, two bytes per code unit, little-endian.
    Ucs2,
}

/// Decodes a raw byte run. Bytes with no mapping in the character set decode
/// to U+FFFD rather than failing; legacy content is full of them.
pub(crate) fn decode(bytes: &[u8], encoding: StringEncoding) -> String {
    match encoding {
        StringEncoding::Latin1 => WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned(),
        StringEncoding::ShiftJis => SHIFT_JIS.decode_without_bom_handling(bytes).0.into_owned(),
        StringEncoding::Ucs2 => UTF_16LE.decode_without_bom_handling(bytes).0.into_owned(),
    }
}

/// Encodes `text` into the character set. Characters the set cannot
/// represent are substituted (numeric character references for the byte
/// sets); the substitution is identical in the sizing and encoding passes.
pub(crate) fn encode(text: &str, encoding: StringEncoding) -> Vec<u8> {
    match encoding {
        StringEncoding::Latin1 => WINDOWS_1252.encode(text).0.into_owned(),
        StringEncoding::ShiftJis => SHIFT_JIS.encode(text).0.into_owned(),
        StringEncoding::Ucs2 => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
    }
}

/// The number of bytes [`encode`] will produce, for sizing passes.
pub fn encoded_len(text: &str, encoding: StringEncoding) -> u32 {
    match encoding {
        // Cheap path: two bytes per UTF-16 code unit.
        StringEncoding::Ucs2 => text.encode_utf16().count() as u32 * 2,
        _ => encode(text, encoding).len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_round_trip() {
        let bytes = encode("café", StringEncoding::Latin1);
        assert_eq!(bytes, b"caf\xe9");
        assert_eq!(decode(&bytes, StringEncoding::Latin1), "café");
    }

    #[test]
    fn shift_jis_round_trip() {
        // "あ" is 0x82 0xA0 in Shift-JIS.
        let bytes = encode("あ", StringEncoding::ShiftJis);
        assert_eq!(bytes, [0x82, 0xA0]);
        assert_eq!(decode(&bytes, StringEncoding::ShiftJis), "あ");
    }

    #[test]
    fn ucs2_round_trip() {
        let bytes = encode("AB", StringEncoding::Ucs2);
        assert_eq!(bytes, [0x41, 0x00, 0x42, 0x00]);
        assert_eq!(decode(&bytes, StringEncoding::Ucs2), "AB");
    }

    #[test]
    fn encoded_len_matches_encode() {
        for encoding in [
            StringEncoding::Latin1,
            StringEncoding::ShiftJis,
            StringEncoding::Ucs2,
        ] {
            for text in ["", "glyphs", "café あ"] {
                assert_eq!(
                    encoded_len(text, encoding) as usize,
                    encode(text, encoding).len()
                );
            }
        }
    }
}
