//! The shared key/value channel between an enclosing record and its nested
//! records.
//!
//! Several field layouts are only interpretable with parameters established
//! further out: a text span packs glyph indices into the bit width its
//! enclosing text tag computed, a gradient's colors are 3 or 4 bytes wide
//! depending on whether the enclosing shape tag carries alpha. A [`Context`]
//! carries those parameters for the duration of one top-level decode or
//! encode call instead of threading them through every call site.

/// The interpretation parameters a record may establish for its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKey {
    /// Bit width of glyph-index fields in a text span.
    GlyphBits,
    /// Bit width of advance fields in a text span.
    AdvanceBits,
    /// Colors in the current record include an alpha channel.
    Transparent,
}

/// Mutable per-call state consulted by nested field encoders.
///
/// Entries live on a stack: `put` pushes, `get` reads the most recent entry
/// for a key, and `remove` pops it. A record that puts a key its ancestor
/// already put shadows the outer value and restores it on `remove`, so the
/// same key can safely be in use at two nesting depths with different values.
///
/// A record must remove every key it put before returning control to its
/// parent; sibling records never observe each other's entries.
#[derive(Debug, Default)]
pub struct Context {
    entries: Vec<(ContextKey, i32)>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently put value for `key`, if any.
    pub fn get(&self, key: ContextKey) -> Option<i32> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|&(_, v)| v)
    }

    pub fn contains(&self, key: ContextKey) -> bool {
        self.get(key).is_some()
    }

    pub fn put(&mut self, key: ContextKey, value: i32) {
        self.entries.push((key, value));
    }

    /// Pops the most recent entry for `key`. Removing a key that was never
    /// put is a no-op.
    pub fn remove(&mut self, key: ContextKey) {
        if let Some(index) = self.entries.iter().rposition(|(k, _)| *k == key) {
            self.entries.remove(index);
        }
    }
}
