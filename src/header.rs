//! The self-delimiting record header every tag carries.
//!
//! A header is one 16-bit word: the top 10 bits hold the tag-type code and
//! the low 6 bits the body length in bytes. A body of 63 bytes or more does
//! not fit, so the 6-bit field holds the sentinel `0x3F` and the true length
//! follows as a 32-bit word.

use crate::reader::Reader;
use crate::writer::Writer;
use crate::CoderError;

/// Low-6-bit sentinel announcing a 32-bit length field.
const EXTENDED: u32 = 0x3F;

/// A tag-type code and the byte length of the record body that follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub code: u16,
    pub length: u32,
}

impl RecordHeader {
    pub fn new(code: u16, length: u32) -> Self {
        debug_assert!(code < 1 << 10, "tag codes are 10-bit");
        RecordHeader { code, length }
    }

    /// The bytes the header itself occupies for a body of `length` bytes:
    /// 2 for the short form, 6 for the extended form.
    pub fn encoded_size(length: u32) -> u32 {
        if length >= EXTENDED { 6 } else { 2 }
    }

    /// Reads the short or extended form, leaving the cursor at the first
    /// body byte. The caller computes the expected end of the record as
    /// `reader.pointer() + length * 8`.
    pub fn decode(reader: &mut Reader) -> Result<Self, CoderError> {
        let word = reader.read_u16()?;
        let code = word >> 6;
        let mut length = u32::from(word & 0x3F);
        if length == EXTENDED {
            length = reader.read_u32()?;
        }
        Ok(RecordHeader { code, length })
    }

    /// Writes the short or extended form, chosen purely by whether the
    /// length reaches the sentinel.
    pub fn encode(&self, writer: &mut Writer) {
        if self.length >= EXTENDED {
            writer.write_u16(self.code << 6 | EXTENDED as u16);
            writer.write_u32(self.length);
        } else {
            writer.write_u16(self.code << 6 | self.length as u16);
        }
    }
}

/// The end-of-record contract derived from a header.
///
/// Captured right after the header is read or written; checked after the
/// body. A cursor that does not land exactly on the announced end means the
/// field logic and the length disagree, which is fatal.
#[derive(Debug, Clone, Copy)]
pub struct RecordBounds {
    record: &'static str,
    /// Byte offset of the record start, header included.
    start: usize,
    length: u32,
    /// Expected bit position of the record end.
    end: u64,
}

impl RecordBounds {
    /// `pointer` is the cursor position just after the header.
    pub fn new(record: &'static str, length: u32, pointer: u64) -> Self {
        RecordBounds {
            record,
            start: (pointer >> 3) as usize - RecordHeader::encoded_size(length) as usize,
            length,
            end: pointer + u64::from(length) * 8,
        }
    }

    fn delta(&self, pointer: u64) -> i64 {
        (pointer as i64 - self.end as i64) / 8
    }

    pub fn check_decode(&self, reader: &Reader) -> Result<(), CoderError> {
        if reader.pointer() != self.end {
            return Err(CoderError::DecodeOverrun {
                record: self.record,
                offset: self.start,
                length: self.length,
                delta: self.delta(reader.pointer()),
            });
        }
        Ok(())
    }

    pub fn check_encode(&self, writer: &Writer) -> Result<(), CoderError> {
        if writer.pointer() != self.end {
            return Err(CoderError::EncodeOverrun {
                record: self.record,
                offset: self.start,
                length: self.length,
                delta: self.delta(writer.pointer()),
            });
        }
        Ok(())
    }
}
