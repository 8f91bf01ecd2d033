//! The bit-granular decoder cursor.
//!
//! Fields in the format occupy exact bit widths, packed most-significant-bit
//! first within each byte, and may span byte boundaries. The reader keeps an
//! absolute bit position into a borrowed buffer; byte-aligned conveniences
//! align first and then read whole bytes.

use byteorder::{BigEndian, ByteOrder};

use crate::strings;
use crate::{CoderError, StringEncoding};

/// Decodes bit fields, byte runs and strings from an in-memory buffer.
///
/// Seeking never validates against the buffer bounds; the read attempted
/// after a seek fails with [`CoderError::ReadOverrun`] if the access would
/// run past the end.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    /// Current position in bits from the start of `buf`.
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    /// Current absolute bit offset.
    pub fn pointer(&self) -> u64 {
        self.pos as u64
    }

    /// Jumps to an arbitrary bit offset. Used to revisit offset tables.
    pub fn set_pointer(&mut self, bits: u64) {
        self.pos = bits as usize;
    }

    /// Relative seek; negative deltas "unread" bytes already scanned.
    pub fn adjust_pointer(&mut self, delta_bits: i64) {
        let pos = self.pos as i64 + delta_bits;
        debug_assert!(pos >= 0, "bit pointer seeked before the buffer start");
        self.pos = pos as usize;
    }

    /// Advances to the next multiple of 8 bits; a no-op when already aligned.
    pub fn align_to_byte(&mut self) {
        self.pos = (self.pos + 7) & !7;
    }

    fn require(&self, bits: usize) -> Result<(), CoderError> {
        let total = self.buf.len() * 8;
        if self.pos + bits > total {
            return Err(CoderError::ReadOverrun {
                offset: self.pos >> 3,
                requested: bits as u32,
                available: total.saturating_sub(self.pos),
            });
        }
        Ok(())
    }

    /// Consumes `count` bits (0..=32) as an unsigned value, MSB first.
    pub fn read_ubits(&mut self, count: u32) -> Result<u32, CoderError> {
        debug_assert!(count <= 32, "bit fields are at most 32 bits wide");
        if count == 0 {
            return Ok(0);
        }
        self.require(count as usize)?;

        let mut value: u64 = 0;
        let mut remaining = count;
        while remaining > 0 {
            let byte = self.buf[self.pos >> 3] as u64;
            let bit_offset = (self.pos & 7) as u32;
            let take = remaining.min(8 - bit_offset);
            let bits = (byte >> (8 - bit_offset - take)) & ((1 << take) - 1);
            value = (value << take) | bits;
            self.pos += take as usize;
            remaining -= take;
        }
        Ok(value as u32)
    }

    /// Consumes `count` bits (0..=32) as a two's-complement signed value.
    pub fn read_sbits(&mut self, count: u32) -> Result<i32, CoderError> {
        let value = self.read_ubits(count)?;
        if count == 0 || count == 32 {
            Ok(value as i32)
        } else if value >> (count - 1) & 1 == 1 {
            Ok((value | !((1u32 << count) - 1)) as i32)
        } else {
            Ok(value as i32)
        }
    }

    /// Aligns, then consumes one byte.
    pub fn read_byte(&mut self) -> Result<u8, CoderError> {
        self.align_to_byte();
        self.require(8)?;
        let byte = self.buf[self.pos >> 3];
        self.pos += 8;
        Ok(byte)
    }

    /// Aligns, then returns the next byte without consuming it. Used to test
    /// for a record terminator while still positioned before it.
    pub fn scan_byte(&mut self) -> Result<u8, CoderError> {
        self.align_to_byte();
        self.require(8)?;
        Ok(self.buf[self.pos >> 3])
    }

    /// Aligns, then consumes a 16-bit unsigned word. Equivalent to
    /// `align_to_byte()` followed by `read_ubits(16)`.
    pub fn read_u16(&mut self) -> Result<u16, CoderError> {
        self.align_to_byte();
        self.require(16)?;
        let index = self.pos >> 3;
        let value = BigEndian::read_u16(&self.buf[index..index + 2]);
        self.pos += 16;
        Ok(value)
    }

    /// Aligns, then consumes a 32-bit unsigned word.
    pub fn read_u32(&mut self) -> Result<u32, CoderError> {
        self.align_to_byte();
        self.require(32)?;
        let index = self.pos >> 3;
        let value = BigEndian::read_u32(&self.buf[index..index + 4]);
        self.pos += 32;
        Ok(value)
    }

    pub fn read_i16(&mut self) -> Result<i16, CoderError> {
        self.read_u16().map(|value| value as i16)
    }

    pub fn read_i32(&mut self) -> Result<i32, CoderError> {
        self.read_u32().map(|value| value as i32)
    }

    /// Aligns, then consumes exactly `length` bytes.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8], CoderError> {
        self.align_to_byte();
        self.require(length * 8)?;
        let index = self.pos >> 3;
        let bytes = &self.buf[index..index + length];
        self.pos += length * 8;
        Ok(bytes)
    }

    /// Reads exactly `length` bytes and decodes them in the named character
    /// set.
    pub fn read_string(
        &mut self,
        length: usize,
        encoding: StringEncoding,
    ) -> Result<String, CoderError> {
        let bytes = self.read_bytes(length)?;
        Ok(strings::decode(bytes, encoding))
    }

    /// Reads a null-terminated byte run and decodes it. The terminator is a
    /// single zero byte regardless of character set, and is consumed.
    pub fn read_string_nul(&mut self, encoding: StringEncoding) -> Result<String, CoderError> {
        self.align_to_byte();
        self.require(8)?;
        let start = self.pos >> 3;
        let end = self.buf[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(CoderError::ReadOverrun {
                offset: self.buf.len(),
                requested: 8,
                available: 0,
            })?;
        let text = strings::decode(&self.buf[start..start + end], encoding);
        self.pos += (end + 1) * 8;
        Ok(text)
    }
}
