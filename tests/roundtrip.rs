//! End-to-end properties of the codec over the public API.

use swf_coder::common::{Color, Rect};
use swf_coder::fill::{GradientEntry, GradientFill, GradientKind};
use swf_coder::font::{DefineFont, Glyph};
use swf_coder::text::{GlyphEntry, TextBlock, TextSpan};
use swf_coder::{
    decode_tag, encode_tag, CoderError, Context, ContextKey, Decodeable, Encodeable,
    Reader, RecordHeader, Writer,
};

/// A record whose entire body is a 2-byte identifier.
struct Marker {
    identifier: u16,
}

impl Marker {
    const CODE: u16 = 13;
}

impl Encodeable for Marker {
    fn prepare_to_encode(&self, _context: &mut Context) -> u32 {
        RecordHeader::encoded_size(2) + 2
    }

    fn encode(&self, writer: &mut Writer, _context: &mut Context) -> Result<(), CoderError> {
        RecordHeader::new(Self::CODE, 2).encode(writer);
        writer.write_u16(self.identifier);
        Ok(())
    }
}

#[test]
fn minimal_record_header_word() {
    let bytes = encode_tag(&Marker { identifier: 0xBEEF }).unwrap();
    // (code << 6) | 2, then the identifier.
    assert_eq!(bytes, [0x03, 0x42, 0xBE, 0xEF]);
}

fn font_with_name(name: &str) -> DefineFont {
    DefineFont::new(1, name).unwrap()
}

#[test]
fn header_escape_boundary() {
    // A glyphless font body is 14 bytes plus the name, so these names land
    // the body exactly on either side of the 63-byte escape.
    let short = font_with_name(&"n".repeat(48));
    let mut context = Context::new();
    assert_eq!(short.prepare_to_encode(&mut context), 2 + 62);
    let bytes = encode_tag(&short).unwrap();
    assert_eq!(bytes.len(), 64);
    assert_eq!(&bytes[..2], &[0x0C, 0x3E]); // (48 << 6) | 62
    assert_eq!(decode_tag::<DefineFont>(&bytes).unwrap(), short);

    let extended = font_with_name(&"n".repeat(49));
    assert_eq!(extended.prepare_to_encode(&mut context), 6 + 63);
    let bytes = encode_tag(&extended).unwrap();
    assert_eq!(bytes.len(), 69);
    assert_eq!(&bytes[..6], &[0x0C, 0x3F, 0x00, 0x00, 0x00, 0x3F]);
    assert_eq!(decode_tag::<DefineFont>(&bytes).unwrap(), extended);
}

#[test]
fn bit_field_boundary_values() {
    for width in [1u32, 2, 4, 8, 16, 32] {
        let signed_max = ((1i64 << (width - 1)) - 1) as i32;
        let signed_min = (-(1i64 << (width - 1))) as i32;
        for value in [-1, 0, signed_max, signed_min] {
            let mut writer = Writer::new();
            writer.write_sbits(value, width);
            writer.align_to_byte();
            let bytes = writer.into_vec();
            assert_eq!(
                Reader::new(&bytes).read_sbits(width).unwrap(),
                value,
                "signed {value} in {width} bits"
            );
        }

        let unsigned_max = ((1u64 << width) - 1) as u32;
        for value in [0, unsigned_max] {
            let mut writer = Writer::new();
            writer.write_ubits(value, width);
            writer.align_to_byte();
            let bytes = writer.into_vec();
            assert_eq!(
                Reader::new(&bytes).read_ubits(width).unwrap(),
                value,
                "unsigned {value} in {width} bits"
            );
        }
    }
}

/// The scenario from the format documentation: a minimal font with two
/// glyphs, ascending codes and advances [10, 20].
#[test]
fn minimal_font_end_to_end() {
    let mut font = DefineFont::new(4096, "Arial").unwrap();
    font.add_glyph(Glyph::default(), 65, 10).unwrap();
    font.add_glyph(Glyph::default(), 66, 20).unwrap();

    let mut context = Context::new();
    let prepared = font.prepare_to_encode(&mut context);
    let bytes = encode_tag(&font).unwrap();
    assert_eq!(bytes.len() as u32, prepared);

    let decoded: DefineFont = decode_tag(&bytes).unwrap();
    assert_eq!(decoded.identifier(), 4096);
    assert_eq!(decoded.glyphs().len(), 2);
    assert_eq!(decoded.codes(), [65, 66]);
    assert_eq!(decoded.advances(), [10, 20]);
    assert_eq!(decoded, font);
    assert_eq!(encode_tag(&decoded).unwrap(), bytes);

    // Empty outlines occupy no bytes, so every offset is zero.
    assert_eq!(read_offset_table(&bytes), [0, 0, 0]);
}

#[test]
fn offset_table_last_entry_is_total_glyph_bytes() {
    let mut font = DefineFont::new(9, "Arial").unwrap();
    font.add_glyph(Glyph { outline: vec![0x10, 0x00] }, 65, 10).unwrap();
    font.add_glyph(Glyph { outline: vec![0x10, 0x00] }, 66, 20).unwrap();
    let bytes = encode_tag(&font).unwrap();
    assert_eq!(read_offset_table(&bytes), [0, 2, 4]);
    assert_eq!(decode_tag::<DefineFont>(&bytes).unwrap(), font);
}

/// Walks a narrow-offset font record far enough to return its offset table.
fn read_offset_table(bytes: &[u8]) -> Vec<u32> {
    let mut reader = Reader::new(bytes);
    RecordHeader::decode(&mut reader).unwrap();
    reader.read_u16().unwrap(); // identifier
    reader.read_byte().unwrap(); // flags
    let name_length = reader.read_byte().unwrap() as usize;
    reader.read_bytes(name_length).unwrap();
    let count = reader.read_u16().unwrap() as usize;
    (0..=count)
        .map(|_| u32::from(reader.read_u16().unwrap()))
        .collect()
}

#[test]
fn wide_offsets_and_extended_header() {
    let mut font = DefineFont::new(3, "Big").unwrap();
    font.add_glyph(Glyph { outline: vec![0xAB; 70_000] }, 65, 10).unwrap();
    let mut context = Context::new();
    let prepared = font.prepare_to_encode(&mut context);
    let bytes = encode_tag(&font).unwrap();
    assert_eq!(bytes.len() as u32, prepared);
    let decoded: DefineFont = decode_tag(&bytes).unwrap();
    assert_eq!(decoded, font);
    assert_eq!(encode_tag(&decoded).unwrap(), bytes);
}

#[test]
fn truncated_buffer_is_a_read_overrun() {
    let mut font = DefineFont::new(5, "Trunc").unwrap();
    font.add_glyph(Glyph { outline: vec![1, 2, 3] }, 65, 10).unwrap();
    let bytes = encode_tag(&font).unwrap();
    let err = decode_tag::<DefineFont>(&bytes[..bytes.len() - 3]).unwrap_err();
    assert!(matches!(err, CoderError::ReadOverrun { .. }), "{err:?}");
}

#[test]
fn inflated_length_is_a_decode_overrun() {
    let font = DefineFont::new(6, "Delta").unwrap();
    let mut bytes = encode_tag(&font).unwrap();
    // Bump the short header's 6-bit length by one and supply the extra byte.
    bytes[1] += 1;
    bytes.push(0);
    let err = decode_tag::<DefineFont>(&bytes).unwrap_err();
    assert_eq!(
        err,
        CoderError::DecodeOverrun {
            record: "DefineFont",
            offset: 0,
            length: 20,
            delta: -1,
        }
    );
}

#[test]
fn sibling_records_share_a_clean_context() {
    let mut first = TextBlock::new(1, Rect::new(0, 0, 100, 100).unwrap()).unwrap();
    first.add_span(
        TextSpan::new(vec![GlyphEntry {
            glyph_index: 900,
            advance: -6000,
        }])
        .unwrap(),
    );
    let second = TextBlock::new(2, Rect::new(0, 0, 100, 100).unwrap()).unwrap();

    let mut context = Context::new();
    let mut writer = Writer::new();
    first.encode(&mut writer, &mut context).unwrap();
    assert!(!context.contains(ContextKey::GlyphBits));
    assert!(!context.contains(ContextKey::AdvanceBits));
    second.encode(&mut writer, &mut context).unwrap();

    let bytes = writer.into_vec();
    let mut reader = Reader::new(&bytes);
    assert_eq!(TextBlock::decode(&mut reader, &mut context).unwrap(), first);
    assert_eq!(TextBlock::decode(&mut reader, &mut context).unwrap(), second);
    assert!(!context.contains(ContextKey::GlyphBits));
    assert_eq!(reader.pointer(), bytes.len() as u64 * 8);
}

#[test]
fn gradient_honors_enclosing_transparency() {
    let fill = GradientFill::new(
        GradientKind::Radial,
        vec![
            GradientEntry {
                ratio: 0,
                color: Color::rgba(10, 20, 30, 40),
            },
            GradientEntry {
                ratio: 128,
                color: Color::rgba(50, 60, 70, 80),
            },
        ],
    )
    .unwrap();

    let mut context = Context::new();
    context.put(ContextKey::Transparent, 1);
    let prepared = fill.prepare_to_encode(&mut context);
    let mut writer = Writer::new();
    fill.encode(&mut writer, &mut context).unwrap();
    let bytes = writer.into_vec();
    assert_eq!(bytes.len() as u32, prepared);

    let mut reader = Reader::new(&bytes);
    let decoded = GradientFill::decode(&mut reader, &mut context).unwrap();
    assert_eq!(decoded, fill);

    // The caller's key is untouched by the nested encode and decode.
    assert_eq!(context.get(ContextKey::Transparent), Some(1));
}
