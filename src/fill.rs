//! Gradient fill styles.
//!
//! A gradient is a sub-record inside a shape definition: it has no record
//! header of its own and inherits the color width from the enclosing tag
//! through [`ContextKey::Transparent`](crate::ContextKey::Transparent).

use crate::common::Color;
use crate::context::Context;
use crate::reader::Reader;
use crate::writer::Writer;
use crate::{CoderError, Decodeable, Encodeable};

const KIND_LINEAR: u8 = 0x10;
const KIND_RADIAL: u8 = 0x12;

/// Gradients hold at most 15 control points; the count is a 4-bit field.
const MAX_ENTRIES: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientKind {
    Linear,
    Radial,
}

/// One gradient control point: a position on the gradient square (0..255)
/// and the color at that position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradientEntry {
    pub ratio: u8,
    pub color: Color,
}

impl Encodeable for GradientEntry {
    fn prepare_to_encode(&self, context: &mut Context) -> u32 {
        1 + self.color.prepare_to_encode(context)
    }

    fn encode(&self, writer: &mut Writer, context: &mut Context) -> Result<(), CoderError> {
        writer.write_byte(self.ratio);
        self.color.encode(writer, context)
    }
}

impl Decodeable for GradientEntry {
    fn decode(reader: &mut Reader, context: &mut Context) -> Result<Self, CoderError> {
        Ok(GradientEntry {
            ratio: reader.read_byte()?,
            color: Color::decode(reader, context)?,
        })
    }
}

/// A linear or radial gradient fill.
///
/// Layout: a kind byte, then a byte holding a reserved high nibble and the
/// 4-bit entry count, then the entries in ratio order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradientFill {
    kind: GradientKind,
    entries: Vec<GradientEntry>,
}

impl GradientFill {
    pub fn new(kind: GradientKind, entries: Vec<GradientEntry>) -> Result<Self, CoderError> {
        if entries.is_empty() || entries.len() > MAX_ENTRIES {
            return Err(CoderError::OutOfRange {
                field: "GradientFill entry count",
                value: entries.len() as i64,
                min: 1,
                max: MAX_ENTRIES as i64,
            });
        }
        Ok(GradientFill { kind, entries })
    }

    pub fn kind(&self) -> GradientKind {
        self.kind
    }

    pub fn entries(&self) -> &[GradientEntry] {
        &self.entries
    }
}

impl Encodeable for GradientFill {
    fn prepare_to_encode(&self, context: &mut Context) -> u32 {
        2 + self
            .entries
            .iter()
            .map(|entry| entry.prepare_to_encode(context))
            .sum::<u32>()
    }

    fn encode(&self, writer: &mut Writer, context: &mut Context) -> Result<(), CoderError> {
        writer.write_byte(match self.kind {
            GradientKind::Linear => KIND_LINEAR,
            GradientKind::Radial => KIND_RADIAL,
        });
        writer.write_ubits(0, 4);
        writer.write_ubits(self.entries.len() as u32, 4);
        for entry in &self.entries {
            entry.encode(writer, context)?;
        }
        Ok(())
    }
}

impl Decodeable for GradientFill {
    fn decode(reader: &mut Reader, context: &mut Context) -> Result<Self, CoderError> {
        let kind = match reader.read_byte()? {
            KIND_LINEAR => GradientKind::Linear,
            KIND_RADIAL => GradientKind::Radial,
            _ => {
                return Err(CoderError::InvalidValue {
                    field: "GradientFill kind",
                    reason: "not a linear or radial fill-style byte",
                });
            }
        };
        reader.read_ubits(4)?;
        let count = reader.read_ubits(4)? as usize;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(GradientEntry::decode(reader, context)?);
        }
        GradientFill::new(kind, entries)
    }
}
