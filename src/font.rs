//! Font definition tags.
//!
//! A font stores its glyph outlines as a contiguous run of shape data
//! preceded by an offset table, so a reader can jump straight to one glyph.
//! The table is written as zero placeholders and backpatched once each
//! glyph's true offset is known; the offsets are measured in bytes from the
//! first glyph byte, so the final entry equals the total size of the glyph
//! data.

use log::trace;

use crate::context::Context;
use crate::header::{RecordBounds, RecordHeader};
use crate::reader::Reader;
use crate::strings;
use crate::writer::Writer;
use crate::{CoderError, Decodeable, Encodeable, StringEncoding};

const WIDE_OFFSETS: u8 = 0x01;
const WIDE_CODES: u8 = 0x02;
const ITALIC: u8 = 0x04;
const BOLD: u8 = 0x08;

/// A single glyph's vector outline, kept in its encoded shape form. The
/// codec treats it as an opaque byte run; shape parsing is a concern of the
/// shape tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glyph {
    pub outline: Vec<u8>,
}

/// Encode-time values derived from the field set. Recomputed identically by
/// the sizing and encoding passes, never stored on the record.
struct FontSizes {
    wide_offsets: bool,
    wide_codes: bool,
    offset_size: u32,
    code_size: u32,
    glyph_bytes: u32,
}

/// The font definition tag.
///
/// Layout: record header, identifier, flags, count-prefixed name, glyph
/// count, glyph offset table (`count + 1` entries, 16-bit unless the glyph
/// data outgrows them), the glyph outlines, the character code table (8-bit
/// unless any code is wider), then ascent, descent, leading and the
/// per-glyph advances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineFont {
    identifier: u16,
    name: String,
    pub italic: bool,
    pub bold: bool,
    pub ascent: i16,
    pub descent: i16,
    pub leading: i16,
    glyphs: Vec<Glyph>,
    codes: Vec<u16>,
    advances: Vec<i16>,
}

impl DefineFont {
    pub const CODE: u16 = 48;

    pub fn new(identifier: u16, name: &str) -> Result<Self, CoderError> {
        if identifier == 0 {
            return Err(CoderError::OutOfRange {
                field: "DefineFont identifier",
                value: 0,
                min: 1,
                max: 65535,
            });
        }
        let name_length = strings::encoded_len(name, StringEncoding::Latin1);
        if name_length > 255 {
            return Err(CoderError::OutOfRange {
                field: "DefineFont name length",
                value: i64::from(name_length),
                min: 0,
                max: 255,
            });
        }
        Ok(DefineFont {
            identifier,
            name: name.to_owned(),
            italic: false,
            bold: false,
            ascent: 0,
            descent: 0,
            leading: 0,
            glyphs: Vec::new(),
            codes: Vec::new(),
            advances: Vec::new(),
        })
    }

    /// Appends a glyph with its character code and advance. The code table
    /// is stored sorted, so codes must arrive strictly ascending.
    pub fn add_glyph(&mut self, glyph: Glyph, code: u16, advance: i16) -> Result<(), CoderError> {
        if let Some(&last) = self.codes.last() {
            if code <= last {
                return Err(CoderError::InvalidValue {
                    field: "DefineFont code table",
                    reason: "character codes must be strictly ascending",
                });
            }
        }
        self.glyphs.push(glyph);
        self.codes.push(code);
        self.advances.push(advance);
        Ok(())
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    pub fn codes(&self) -> &[u16] {
        &self.codes
    }

    pub fn advances(&self) -> &[i16] {
        &self.advances
    }

    fn sizes(&self) -> FontSizes {
        let glyph_bytes: usize = self.glyphs.iter().map(|glyph| glyph.outline.len()).sum();
        let wide_offsets = glyph_bytes > usize::from(u16::MAX);
        let wide_codes = self.codes.iter().any(|&code| code > 255);
        FontSizes {
            wide_offsets,
            wide_codes,
            offset_size: if wide_offsets { 4 } else { 2 },
            code_size: if wide_codes { 2 } else { 1 },
            glyph_bytes: glyph_bytes as u32,
        }
    }

    fn body_length(&self, sizes: &FontSizes) -> u32 {
        let count = self.glyphs.len() as u32;
        2 + 1
            + 1
            + strings::encoded_len(&self.name, StringEncoding::Latin1)
            + 2
            + (count + 1) * sizes.offset_size
            + sizes.glyph_bytes
            + count * sizes.code_size
            + 6
            + count * 2
    }

    fn flags(&self, sizes: &FontSizes) -> u8 {
        let mut flags = 0;
        if sizes.wide_offsets {
            flags |= WIDE_OFFSETS;
        }
        if sizes.wide_codes {
            flags |= WIDE_CODES;
        }
        if self.italic {
            flags |= ITALIC;
        }
        if self.bold {
            flags |= BOLD;
        }
        flags
    }
}

impl Encodeable for DefineFont {
    fn prepare_to_encode(&self, _context: &mut Context) -> u32 {
        let length = self.body_length(&self.sizes());
        RecordHeader::encoded_size(length) + length
    }

    fn encode(&self, writer: &mut Writer, _context: &mut Context) -> Result<(), CoderError> {
        let sizes = self.sizes();
        let length = self.body_length(&sizes);
        RecordHeader::new(Self::CODE, length).encode(writer);
        let record_bounds = RecordBounds::new("DefineFont", length, writer.pointer());

        writer.write_u16(self.identifier);
        writer.write_byte(self.flags(&sizes));
        writer.write_byte(strings::encoded_len(&self.name, StringEncoding::Latin1) as u8);
        writer.write_string(&self.name, StringEncoding::Latin1);
        writer.write_u16(self.glyphs.len() as u16);

        // Reserve the offset table, emit the glyph data, then seek back and
        // patch the table with the real offsets.
        let table = writer.pointer();
        for _ in 0..=self.glyphs.len() {
            if sizes.wide_offsets {
                writer.write_u32(0);
            } else {
                writer.write_u16(0);
            }
        }
        let data_start = writer.pointer();
        let mut offsets = Vec::with_capacity(self.glyphs.len() + 1);
        for glyph in &self.glyphs {
            offsets.push(((writer.pointer() - data_start) / 8) as u32);
            writer.write_bytes(&glyph.outline);
        }
        offsets.push(((writer.pointer() - data_start) / 8) as u32);
        let resume = writer.pointer();
        writer.set_pointer(table);
        for offset in offsets {
            if sizes.wide_offsets {
                writer.write_u32(offset);
            } else {
                writer.write_u16(offset as u16);
            }
        }
        writer.set_pointer(resume);

        for &code in &self.codes {
            if sizes.wide_codes {
                writer.write_u16(code);
            } else {
                writer.write_byte(code as u8);
            }
        }
        writer.write_i16(self.ascent);
        writer.write_i16(self.descent);
        writer.write_i16(self.leading);
        for &advance in &self.advances {
            writer.write_i16(advance);
        }

        record_bounds.check_encode(writer)
    }
}

impl Decodeable for DefineFont {
    fn decode(reader: &mut Reader, _context: &mut Context) -> Result<Self, CoderError> {
        let offset = (reader.pointer() >> 3) as usize;
        let header = RecordHeader::decode(reader)?;
        if header.code != Self::CODE {
            return Err(CoderError::UnexpectedTag {
                expected: Self::CODE,
                found: header.code,
                offset,
            });
        }
        let record_bounds = RecordBounds::new("DefineFont", header.length, reader.pointer());

        let identifier = reader.read_u16()?;
        let flags = reader.read_byte()?;
        let name_length = reader.read_byte()? as usize;
        let name = reader.read_string(name_length, StringEncoding::Latin1)?;
        let count = reader.read_u16()? as usize;

        let wide_offsets = flags & WIDE_OFFSETS != 0;
        let wide_codes = flags & WIDE_CODES != 0;

        let mut offsets = Vec::with_capacity(count + 1);
        for _ in 0..=count {
            offsets.push(if wide_offsets {
                reader.read_u32()?
            } else {
                u32::from(reader.read_u16()?)
            });
        }
        if offsets.first() != Some(&0) {
            return Err(CoderError::InvalidValue {
                field: "DefineFont offset table",
                reason: "first glyph offset is not zero",
            });
        }
        let mut glyphs = Vec::with_capacity(count);
        for index in 0..count {
            let length = offsets[index + 1].checked_sub(offsets[index]).ok_or(
                CoderError::InvalidValue {
                    field: "DefineFont offset table",
                    reason: "glyph offsets are not ascending",
                },
            )?;
            glyphs.push(Glyph {
                outline: reader.read_bytes(length as usize)?.to_vec(),
            });
        }

        let mut codes = Vec::with_capacity(count);
        for _ in 0..count {
            codes.push(if wide_codes {
                reader.read_u16()?
            } else {
                u16::from(reader.read_byte()?)
            });
        }
        if codes.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(CoderError::InvalidValue {
                field: "DefineFont code table",
                reason: "character codes must be strictly ascending",
            });
        }

        let ascent = reader.read_i16()?;
        let descent = reader.read_i16()?;
        let leading = reader.read_i16()?;
        let mut advances = Vec::with_capacity(count);
        for _ in 0..count {
            advances.push(reader.read_i16()?);
        }

        record_bounds.check_decode(reader)?;
        trace!("font {identifier} \"{name}\": {count} glyphs");
        Ok(DefineFont {
            identifier,
            name,
            italic: flags & ITALIC != 0,
            bold: flags & BOLD != 0,
            ascent,
            descent,
            leading,
            glyphs,
            codes,
            advances,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode_tag, encode_tag};

    fn sample_font() -> DefineFont {
        let mut font = DefineFont::new(7, "Verdana").unwrap();
        font.ascent = 800;
        font.descent = 200;
        font.bold = true;
        font.add_glyph(
            Glyph {
                outline: vec![0x10, 0x00],
            },
            b'A'.into(),
            520,
        )
        .unwrap();
        font.add_glyph(
            Glyph {
                outline: vec![0x10, 0x20, 0x00],
            },
            b'B'.into(),
            540,
        )
        .unwrap();
        font
    }

    #[test]
    fn round_trip() {
        let font = sample_font();
        let bytes = encode_tag(&font).unwrap();
        let decoded: DefineFont = decode_tag(&bytes).unwrap();
        assert_eq!(decoded, font);
        assert_eq!(encode_tag(&decoded).unwrap(), bytes);
    }

    #[test]
    fn prepared_length_is_exact() {
        let font = sample_font();
        let mut context = Context::new();
        let length = font.prepare_to_encode(&mut context);
        assert_eq!(encode_tag(&font).unwrap().len() as u32, length);
    }

    #[test]
    fn wide_codes_round_trip() {
        let mut font = DefineFont::new(2, "Mincho").unwrap();
        font.add_glyph(Glyph::default(), 0x3042, 600).unwrap();
        font.add_glyph(Glyph::default(), 0x3044, 600).unwrap();
        let bytes = encode_tag(&font).unwrap();
        let decoded: DefineFont = decode_tag(&bytes).unwrap();
        assert_eq!(decoded.codes(), [0x3042, 0x3044]);
        assert_eq!(decoded, font);
    }

    #[test]
    fn identifier_zero_is_rejected() {
        assert!(matches!(
            DefineFont::new(0, "x"),
            Err(CoderError::OutOfRange { .. })
        ));
    }

    #[test]
    fn descending_codes_are_rejected() {
        let mut font = DefineFont::new(1, "x").unwrap();
        font.add_glyph(Glyph::default(), 66, 0).unwrap();
        assert!(matches!(
            font.add_glyph(Glyph::default(), 65, 0),
            Err(CoderError::InvalidValue { .. })
        ));
    }

    #[test]
    fn long_name_is_rejected() {
        let name = "n".repeat(256);
        assert!(matches!(
            DefineFont::new(1, &name),
            Err(CoderError::OutOfRange { .. })
        ));
    }
}
