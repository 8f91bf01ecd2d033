//! The bit-granular encoder cursor, mirror image of [`crate::Reader`].
//!
//! The writer owns a growable buffer. Bit fields are emitted
//! most-significant-bit first and assume the target bits are still zero,
//! which holds for appends and for zeroed placeholders. Byte-aligned writes
//! overwrite in place, so offset tables can be written as zeros and patched
//! through `set_pointer` once the true offsets are known.

use byteorder::{BigEndian, ByteOrder};

use crate::strings;
use crate::StringEncoding;

/// Encodes bit fields, byte runs and strings into a growable buffer.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
    /// Current position in bits from the start of `buf`.
    pos: usize,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Writer {
            buf: Vec::with_capacity(bytes),
            pos: 0,
        }
    }

    /// Current absolute bit offset.
    pub fn pointer(&self) -> u64 {
        self.pos as u64
    }

    /// Jumps to an arbitrary bit offset, typically backward to patch a
    /// placeholder. Writing past the current end grows the buffer.
    pub fn set_pointer(&mut self, bits: u64) {
        self.pos = bits as usize;
    }

    /// Relative seek.
    pub fn adjust_pointer(&mut self, delta_bits: i64) {
        let pos = self.pos as i64 + delta_bits;
        debug_assert!(pos >= 0, "bit pointer seeked before the buffer start");
        self.pos = pos as usize;
    }

    /// Advances to the next multiple of 8 bits; a no-op when already aligned.
    pub fn align_to_byte(&mut self) {
        self.pos = (self.pos + 7) & !7;
    }

    /// The finished buffer. A completed encode leaves the position
    /// byte-aligned; the per-record end checks enforce it.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    fn reserve_bits(&mut self, bits: usize) {
        let end = (self.pos + bits + 7) >> 3;
        if self.buf.len() < end {
            self.buf.resize(end, 0);
        }
    }

    /// Writes the low `count` bits (0..=32) of `value`, MSB first.
    pub fn write_ubits(&mut self, value: u32, count: u32) {
        debug_assert!(count <= 32, "bit fields are at most 32 bits wide");
        if count == 0 {
            return;
        }
        self.reserve_bits(count as usize);

        let value = value as u64 & ((1u64 << count) - 1);
        let mut remaining = count;
        while remaining > 0 {
            let bit_offset = (self.pos & 7) as u32;
            let take = remaining.min(8 - bit_offset);
            let bits = ((value >> (remaining - take)) & ((1 << take) - 1)) as u8;
            self.buf[self.pos >> 3] |= bits << (8 - bit_offset - take);
            self.pos += take as usize;
            remaining -= take;
        }
    }

    /// Writes `value` into `count` bits of two's complement.
    pub fn write_sbits(&mut self, value: i32, count: u32) {
        self.write_ubits(value as u32, count);
    }

    /// Aligns, then writes one byte, overwriting any previous content.
    pub fn write_byte(&mut self, value: u8) {
        self.align_to_byte();
        self.reserve_bits(8);
        self.buf[self.pos >> 3] = value;
        self.pos += 8;
    }

    /// Aligns, then writes a 16-bit word. Equivalent to `align_to_byte()`
    /// followed by `write_ubits(value, 16)` over a zeroed target.
    pub fn write_u16(&mut self, value: u16) {
        self.align_to_byte();
        self.reserve_bits(16);
        let index = self.pos >> 3;
        BigEndian::write_u16(&mut self.buf[index..index + 2], value);
        self.pos += 16;
    }

    /// Aligns, then writes a 32-bit word.
    pub fn write_u32(&mut self, value: u32) {
        self.align_to_byte();
        self.reserve_bits(32);
        let index = self.pos >> 3;
        BigEndian::write_u32(&mut self.buf[index..index + 4], value);
        self.pos += 32;
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_u16(value as u16);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }

    /// Aligns, then writes a raw byte run.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.align_to_byte();
        self.reserve_bits(bytes.len() * 8);
        let index = self.pos >> 3;
        self.buf[index..index + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len() * 8;
    }

    /// Encodes `text` in the named character set and writes the bytes, with
    /// no terminator. Callers size the field with
    /// [`strings::encoded_len`](crate::strings::encoded_len) during the
    /// sizing pass.
    pub fn write_string(&mut self, text: &str, encoding: StringEncoding) {
        self.write_bytes(&strings::encode(text, encoding));
    }

    /// As [`write_string`](Self::write_string), followed by a zero byte.
    pub fn write_string_nul(&mut self, text: &str, encoding: StringEncoding) {
        self.write_string(text, encoding);
        self.write_byte(0);
    }
}
