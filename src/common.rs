//! Shared field types and bit-width arithmetic used across tags.

use crate::context::{Context, ContextKey};
use crate::reader::Reader;
use crate::writer::Writer;
use crate::{CoderError, Decodeable, Encodeable};

/// The bits needed to hold `value` as an unsigned field. Zero needs none.
pub fn unsigned_bit_count(value: u32) -> u32 {
    32 - value.leading_zeros()
}

/// The bits needed to hold `value` in two's complement, sign bit included.
/// Zero needs none.
pub fn signed_bit_count(value: i32) -> u32 {
    if value == 0 {
        return 0;
    }
    let magnitude = if value < 0 { !value } else { value } as u32;
    33 - magnitude.leading_zeros()
}

/// The narrowest width holding every value in the iterator as unsigned.
pub fn unsigned_bit_width(values: impl IntoIterator<Item = u32>) -> u32 {
    values.into_iter().map(unsigned_bit_count).max().unwrap_or(0)
}

/// The narrowest width holding every value in the iterator as signed.
pub fn signed_bit_width(values: impl IntoIterator<Item = i32>) -> u32 {
    values.into_iter().map(signed_bit_count).max().unwrap_or(0)
}

/// Coordinates must fit the 31-bit fields a 5-bit width count can announce.
const COORD_MIN: i32 = -(1 << 30);
const COORD_MAX: i32 = (1 << 30) - 1;

/// An axis-aligned bounding box in twips.
///
/// Encoded byte-aligned as a 5-bit field-width count followed by four signed
/// fields of that width, in the order x_min, x_max, y_min, y_max, padded to
/// the next byte boundary. The width is recomputed on every encode as the
/// narrowest fit over the four values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    x_min: i32,
    x_max: i32,
    y_min: i32,
    y_max: i32,
}

impl Rect {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Result<Self, CoderError> {
        for value in [x_min, y_min, x_max, y_max] {
            if !(COORD_MIN..=COORD_MAX).contains(&value) {
                return Err(CoderError::OutOfRange {
                    field: "Rect coordinate",
                    value: i64::from(value),
                    min: i64::from(COORD_MIN),
                    max: i64::from(COORD_MAX),
                });
            }
        }
        Ok(Rect {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }

    pub fn x_min(&self) -> i32 {
        self.x_min
    }

    pub fn y_min(&self) -> i32 {
        self.y_min
    }

    pub fn x_max(&self) -> i32 {
        self.x_max
    }

    pub fn y_max(&self) -> i32 {
        self.y_max
    }

    fn field_bits(&self) -> u32 {
        signed_bit_width([self.x_min, self.x_max, self.y_min, self.y_max])
    }
}

impl Encodeable for Rect {
    fn prepare_to_encode(&self, _context: &mut Context) -> u32 {
        (5 + 4 * self.field_bits() + 7) / 8
    }

    fn encode(&self, writer: &mut Writer, _context: &mut Context) -> Result<(), CoderError> {
        let bits = self.field_bits();
        writer.align_to_byte();
        writer.write_ubits(bits, 5);
        writer.write_sbits(self.x_min, bits);
        writer.write_sbits(self.x_max, bits);
        writer.write_sbits(self.y_min, bits);
        writer.write_sbits(self.y_max, bits);
        writer.align_to_byte();
        Ok(())
    }
}

impl Decodeable for Rect {
    fn decode(reader: &mut Reader, _context: &mut Context) -> Result<Self, CoderError> {
        reader.align_to_byte();
        let bits = reader.read_ubits(5)?;
        let rect = Rect {
            x_min: reader.read_sbits(bits)?,
            x_max: reader.read_sbits(bits)?,
            y_min: reader.read_sbits(bits)?,
            y_max: reader.read_sbits(bits)?,
        };
        reader.align_to_byte();
        Ok(rect)
    }
}

/// An sRGB color.
///
/// Stored as three bytes, or four when the enclosing record has put
/// [`ContextKey::Transparent`], in which case the alpha byte follows the
/// color channels. Records without alpha decode as fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Color {
            red,
            green,
            blue,
            alpha: 255,
        }
    }

    pub fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Color {
            red,
            green,
            blue,
            alpha,
        }
    }
}

impl Encodeable for Color {
    fn prepare_to_encode(&self, context: &mut Context) -> u32 {
        if context.contains(ContextKey::Transparent) {
            4
        } else {
            3
        }
    }

    fn encode(&self, writer: &mut Writer, context: &mut Context) -> Result<(), CoderError> {
        writer.write_byte(self.red);
        writer.write_byte(self.green);
        writer.write_byte(self.blue);
        if context.contains(ContextKey::Transparent) {
            writer.write_byte(self.alpha);
        }
        Ok(())
    }
}

impl Decodeable for Color {
    fn decode(reader: &mut Reader, context: &mut Context) -> Result<Self, CoderError> {
        let red = reader.read_byte()?;
        let green = reader.read_byte()?;
        let blue = reader.read_byte()?;
        let alpha = if context.contains(ContextKey::Transparent) {
            reader.read_byte()?
        } else {
            255
        };
        Ok(Color {
            red,
            green,
            blue,
            alpha,
        })
    }
}
