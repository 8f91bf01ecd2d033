//! Static text tags: a block of positioned spans referencing font glyphs.
//!
//! The block computes the narrowest bit widths that hold every glyph index
//! and advance across all of its spans, announces them in two leading bytes,
//! and passes them to the spans through the context. Spans are self-flagged
//! optional-field records terminated by a zero byte.

use log::trace;

use crate::common::{signed_bit_width, unsigned_bit_width, Color, Rect};
use crate::context::{Context, ContextKey};
use crate::header::{RecordBounds, RecordHeader};
use crate::reader::Reader;
use crate::writer::Writer;
use crate::{CoderError, Decodeable, Encodeable};

const SPAN_MARKER: u8 = 0x80;
const HAS_FONT: u8 = 0x08;
const HAS_COLOR: u8 = 0x04;
const HAS_X: u8 = 0x02;
const HAS_Y: u8 = 0x01;

/// One glyph of a span: an index into the font's glyph table and the signed
/// advance to the next glyph, in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphEntry {
    pub glyph_index: u32,
    pub advance: i32,
}

/// The font reference of a span: which font draws the glyphs and at what
/// height, in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanFont {
    pub identifier: u16,
    pub height: u16,
}

/// A run of glyphs sharing one font, color and offset.
///
/// Layout: a flags byte (presence of font, color and offsets), the optional
/// fields in that order with the text height trailing the offsets, then a
/// count byte and the packed glyph entries, padded to the next byte
/// boundary. Glyph-index and advance widths come from the enclosing block
/// via [`ContextKey::GlyphBits`] and [`ContextKey::AdvanceBits`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub font: Option<SpanFont>,
    pub color: Option<Color>,
    pub x_offset: Option<i16>,
    pub y_offset: Option<i16>,
    entries: Vec<GlyphEntry>,
}

impl TextSpan {
    /// The glyph count is stored in one byte.
    pub fn new(entries: Vec<GlyphEntry>) -> Result<Self, CoderError> {
        if entries.len() > 255 {
            return Err(CoderError::OutOfRange {
                field: "TextSpan glyph count",
                value: entries.len() as i64,
                min: 0,
                max: 255,
            });
        }
        Ok(TextSpan {
            font: None,
            color: None,
            x_offset: None,
            y_offset: None,
            entries,
        })
    }

    pub fn entries(&self) -> &[GlyphEntry] {
        &self.entries
    }

    fn flags(&self) -> u8 {
        let mut flags = SPAN_MARKER;
        if self.font.is_some() {
            flags |= HAS_FONT;
        }
        if self.color.is_some() {
            flags |= HAS_COLOR;
        }
        if self.x_offset.is_some() {
            flags |= HAS_X;
        }
        if self.y_offset.is_some() {
            flags |= HAS_Y;
        }
        flags
    }
}

fn context_bits(context: &Context) -> (u32, u32) {
    let glyph_bits = context.get(ContextKey::GlyphBits).unwrap_or(0) as u32;
    let advance_bits = context.get(ContextKey::AdvanceBits).unwrap_or(0) as u32;
    (glyph_bits, advance_bits)
}

impl Encodeable for TextSpan {
    fn prepare_to_encode(&self, context: &mut Context) -> u32 {
        let (glyph_bits, advance_bits) = context_bits(context);
        let mut length = 1;
        if self.font.is_some() {
            length += 2;
        }
        if let Some(color) = &self.color {
            length += color.prepare_to_encode(context);
        }
        if self.x_offset.is_some() {
            length += 2;
        }
        if self.y_offset.is_some() {
            length += 2;
        }
        if self.font.is_some() {
            length += 2;
        }
        length += 1;
        length + (self.entries.len() as u32 * (glyph_bits + advance_bits) + 7) / 8
    }

    fn encode(&self, writer: &mut Writer, context: &mut Context) -> Result<(), CoderError> {
        let (glyph_bits, advance_bits) = context_bits(context);
        writer.write_byte(self.flags());
        if let Some(font) = &self.font {
            writer.write_u16(font.identifier);
        }
        if let Some(color) = &self.color {
            color.encode(writer, context)?;
        }
        if let Some(x) = self.x_offset {
            writer.write_i16(x);
        }
        if let Some(y) = self.y_offset {
            writer.write_i16(y);
        }
        if let Some(font) = &self.font {
            writer.write_u16(font.height);
        }
        writer.write_byte(self.entries.len() as u8);
        for entry in &self.entries {
            writer.write_ubits(entry.glyph_index, glyph_bits);
            writer.write_sbits(entry.advance, advance_bits);
        }
        writer.align_to_byte();
        Ok(())
    }
}

impl Decodeable for TextSpan {
    fn decode(reader: &mut Reader, context: &mut Context) -> Result<Self, CoderError> {
        let (glyph_bits, advance_bits) = context_bits(context);
        let flags = reader.read_byte()?;
        if flags & SPAN_MARKER == 0 {
            return Err(CoderError::InvalidValue {
                field: "TextSpan flags",
                reason: "span marker bit is not set",
            });
        }
        let font_identifier = if flags & HAS_FONT != 0 {
            Some(reader.read_u16()?)
        } else {
            None
        };
        let color = if flags & HAS_COLOR != 0 {
            Some(Color::decode(reader, context)?)
        } else {
            None
        };
        let x_offset = if flags & HAS_X != 0 {
            Some(reader.read_i16()?)
        } else {
            None
        };
        let y_offset = if flags & HAS_Y != 0 {
            Some(reader.read_i16()?)
        } else {
            None
        };
        let font = match font_identifier {
            Some(identifier) => Some(SpanFont {
                identifier,
                height: reader.read_u16()?,
            }),
            None => None,
        };
        let count = reader.read_byte()? as usize;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(GlyphEntry {
                glyph_index: reader.read_ubits(glyph_bits)?,
                advance: reader.read_sbits(advance_bits)?,
            });
        }
        reader.align_to_byte();
        Ok(TextSpan {
            font,
            color,
            x_offset,
            y_offset,
            entries,
        })
    }
}

/// The static text definition tag.
///
/// Layout: record header, identifier, bounding box, a byte each for the
/// glyph-index and advance bit widths, the spans, and a zero terminator
/// byte where the next span's flags would be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    identifier: u16,
    pub bounds: Rect,
    spans: Vec<TextSpan>,
}

impl TextBlock {
    pub const CODE: u16 = 11;

    pub fn new(identifier: u16, bounds: Rect) -> Result<Self, CoderError> {
        if identifier == 0 {
            return Err(CoderError::OutOfRange {
                field: "TextBlock identifier",
                value: 0,
                min: 1,
                max: 65535,
            });
        }
        Ok(TextBlock {
            identifier,
            bounds,
            spans: Vec::new(),
        })
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub fn spans(&self) -> &[TextSpan] {
        &self.spans
    }

    pub fn add_span(&mut self, span: TextSpan) {
        self.spans.push(span);
    }

    /// The narrowest widths holding every glyph index and advance in the
    /// block. Recomputed on each pass, never stored.
    fn bit_widths(&self) -> (u32, u32) {
        let entries = || self.spans.iter().flat_map(TextSpan::entries);
        let glyph_bits = unsigned_bit_width(entries().map(|entry| entry.glyph_index));
        let advance_bits = signed_bit_width(entries().map(|entry| entry.advance));
        (glyph_bits, advance_bits)
    }

    /// Body length in bytes, header excluded. The context must already hold
    /// the block's bit-width keys.
    fn body_length(&self, context: &mut Context) -> u32 {
        let mut length = 2 + self.bounds.prepare_to_encode(context) + 2;
        for span in &self.spans {
            length += span.prepare_to_encode(context);
        }
        length + 1
    }

    fn encode_body(
        &self,
        writer: &mut Writer,
        context: &mut Context,
        glyph_bits: u32,
        advance_bits: u32,
    ) -> Result<(), CoderError> {
        writer.write_u16(self.identifier);
        self.bounds.encode(writer, context)?;
        writer.write_byte(glyph_bits as u8);
        writer.write_byte(advance_bits as u8);
        for span in &self.spans {
            span.encode(writer, context)?;
        }
        writer.write_byte(0);
        Ok(())
    }

    fn decode_spans(
        reader: &mut Reader,
        context: &mut Context,
    ) -> Result<Vec<TextSpan>, CoderError> {
        let mut spans = Vec::new();
        while reader.scan_byte()? != 0 {
            spans.push(TextSpan::decode(reader, context)?);
        }
        reader.read_byte()?;
        Ok(spans)
    }
}

impl Encodeable for TextBlock {
    fn prepare_to_encode(&self, context: &mut Context) -> u32 {
        let (glyph_bits, advance_bits) = self.bit_widths();
        context.put(ContextKey::GlyphBits, glyph_bits as i32);
        context.put(ContextKey::AdvanceBits, advance_bits as i32);
        let length = self.body_length(context);
        context.remove(ContextKey::AdvanceBits);
        context.remove(ContextKey::GlyphBits);
        RecordHeader::encoded_size(length) + length
    }

    fn encode(&self, writer: &mut Writer, context: &mut Context) -> Result<(), CoderError> {
        let (glyph_bits, advance_bits) = self.bit_widths();
        context.put(ContextKey::GlyphBits, glyph_bits as i32);
        context.put(ContextKey::AdvanceBits, advance_bits as i32);

        let length = self.body_length(context);
        RecordHeader::new(Self::CODE, length).encode(writer);
        let record_bounds = RecordBounds::new("TextBlock", length, writer.pointer());

        // The keys come off even when a span fails; a caller-supplied
        // context must not keep this block's bit widths after an error.
        let body = self.encode_body(writer, context, glyph_bits, advance_bits);
        context.remove(ContextKey::AdvanceBits);
        context.remove(ContextKey::GlyphBits);
        body?;
        record_bounds.check_encode(writer)
    }
}

impl Decodeable for TextBlock {
    fn decode(reader: &mut Reader, context: &mut Context) -> Result<Self, CoderError> {
        let offset = (reader.pointer() >> 3) as usize;
        let header = RecordHeader::decode(reader)?;
        if header.code != Self::CODE {
            return Err(CoderError::UnexpectedTag {
                expected: Self::CODE,
                found: header.code,
                offset,
            });
        }
        let record_bounds = RecordBounds::new("TextBlock", header.length, reader.pointer());

        let identifier = reader.read_u16()?;
        let bounds = Rect::decode(reader, context)?;
        let glyph_bits = reader.read_byte()?;
        let advance_bits = reader.read_byte()?;
        if glyph_bits > 32 || advance_bits > 32 {
            return Err(CoderError::InvalidValue {
                field: "TextBlock bit widths",
                reason: "packed fields are at most 32 bits wide",
            });
        }

        context.put(ContextKey::GlyphBits, i32::from(glyph_bits));
        context.put(ContextKey::AdvanceBits, i32::from(advance_bits));
        let spans = Self::decode_spans(reader, context);
        context.remove(ContextKey::AdvanceBits);
        context.remove(ContextKey::GlyphBits);
        let spans = spans?;

        record_bounds.check_decode(reader)?;
        trace!("text block {identifier}: {} spans", spans.len());
        Ok(TextBlock {
            identifier,
            bounds,
            spans,
        })
    }
}
