//! A low-level library for decoding and encoding the binary tags of the SWF
//! movie format into Rust data structures.
//!
//! The format packs fields into bit-exact widths, big-endian at the bit
//! level, and every tag self-delimits with a length-prefixed header. The core
//! of the crate is the bit-granular [`Reader`] and [`Writer`] pair, the
//! short/extended [`RecordHeader`] convention, and the two-phase
//! [`Encodeable`] protocol: a sizing pass computes the exact byte length a
//! record will occupy, then the encoding pass emits bytes and verifies it
//! landed exactly on the announced end position.
//!
//! Interpretation parameters that an enclosing record establishes for its
//! nested records (packed-field bit widths, whether colors carry alpha) flow
//! through a [`Context`] rather than being threaded through every call site.

pub mod common;
pub mod context;
pub mod fill;
pub mod font;
pub mod header;
pub mod reader;
pub mod strings;
pub mod text;
pub mod writer;

pub use crate::context::{Context, ContextKey};
pub use crate::header::RecordHeader;
pub use crate::reader::Reader;
pub use crate::strings::StringEncoding;
pub use crate::writer::Writer;

use thiserror::Error;

/// The fatal error raised by decoding and encoding.
///
/// There is no partial-record recovery: any of these aborts the current
/// top-level decode or encode call. The overrun variants carry enough
/// structure (offsets, declared lengths, signed deltas) to locate the
/// offending record without a hex dump.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoderError {
    /// A read ran past the end of the buffer. Also raised when a record
    /// declares a length longer than the bytes actually supplied.
    #[error("read of {requested} bits at byte {offset} overruns the buffer ({available} bits available)")]
    ReadOverrun {
        offset: usize,
        requested: u32,
        available: usize,
    },

    /// After decoding a record's fields the cursor did not land on the end
    /// position computed from the record header. This indicates a field-count
    /// or bit-width mismatch in the decode logic or a malformed stream, never
    /// a condition to tolerate silently.
    #[error("{record}: decoding ended {delta:+} bytes from the declared end (record at byte {offset}, length {length})")]
    DecodeOverrun {
        record: &'static str,
        offset: usize,
        length: u32,
        delta: i64,
    },

    /// The encoding pass emitted a different number of bytes than the sizing
    /// pass computed. Always a bug in the record's field logic.
    #[error("{record}: encoding ended {delta:+} bytes from the prepared length {length} (record at byte {offset})")]
    EncodeOverrun {
        record: &'static str,
        offset: usize,
        length: u32,
        delta: i64,
    },

    /// The stream holds a different tag code than the record type asked to
    /// decode it.
    #[error("expected tag code {expected}, found {found} at byte {offset}")]
    UnexpectedTag {
        expected: u16,
        found: u16,
        offset: usize,
    },

    /// A field value supplied when constructing a record is outside its
    /// documented range. Raised at the point of assignment, before any
    /// encoding is attempted.
    #[error("{field} must be in {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// A structural constraint on a record's fields is violated (mismatched
    /// list lengths, an unsorted code table, and the like).
    #[error("{field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}

/// The two-phase encoding protocol every encodable record follows.
///
/// The format requires each record to announce its byte length before the
/// fields that determine that length, and several fields (packed-array bit
/// widths, presence flags) are functions of the full field set, so a single
/// streaming pass cannot produce the header. Records therefore size
/// themselves first and emit second, and the writer verifies the two passes
/// agree.
pub trait Encodeable {
    /// Computes, without emitting any bytes, the exact number of bytes
    /// [`encode`](Self::encode) will write, including the record's own header
    /// when it writes one.
    ///
    /// Sizing a record recursively sizes its nested records. Any context key
    /// the nested records need is put before they are sized and removed
    /// before this returns, so sibling records are unaffected.
    fn prepare_to_encode(&self, context: &mut Context) -> u32;

    /// Writes the record, using the same context values the sizing pass
    /// computed, and fails with [`CoderError::EncodeOverrun`] if the writer
    /// does not land exactly on the length-derived end position.
    fn encode(&self, writer: &mut Writer, context: &mut Context) -> Result<(), CoderError>;
}

/// Decoding counterpart of [`Encodeable`].
///
/// Decode is single-pass: the header length is read up front and used only
/// as a trailing consistency check, never to steer field parsing.
pub trait Decodeable: Sized {
    fn decode(reader: &mut Reader, context: &mut Context) -> Result<Self, CoderError>;
}

/// Encodes one top-level record against a fresh context.
pub fn encode_tag<T: Encodeable>(tag: &T) -> Result<Vec<u8>, CoderError> {
    let mut context = Context::new();
    let length = tag.prepare_to_encode(&mut context);
    let mut writer = Writer::with_capacity(length as usize);
    tag.encode(&mut writer, &mut context)?;
    Ok(writer.into_vec())
}

/// Decodes one top-level record from `bytes` against a fresh context.
pub fn decode_tag<T: Decodeable>(bytes: &[u8]) -> Result<T, CoderError> {
    let mut context = Context::new();
    let mut reader = Reader::new(bytes);
    T::decode(&mut reader, &mut context)
}
