//! Linked fields: typed, non-copying views into a shared byte buffer.
//!
//! A chain of fields partitions one buffer into contiguous, ordered ranges.
//! Each field after the first starts immediately where its predecessor
//! ends; growing or shrinking a field shifts every field after it. This is
//! how the MQTT message model (fixed header / remaining length / client id
//! / …) and the bridge's in-place topic rewrite share one buffer without
//! ever moving payload bytes unnecessarily.

use super::ByteBuffer;

/// Metadata for one field in a chain. The bytes themselves live in the
/// chain's backing [`ByteBuffer`]; this only records the range.
#[derive(Debug, Clone, Copy)]
struct FieldMeta {
    start: usize,
    len: usize,
}

/// A handle to one field within a [`LinkedFieldChain`]. Opaque; obtained
/// from `init_root`/`init_child` and passed back into chain methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkedField {
    index: usize,
}

/// An ordered chain of fields over one fixed-capacity buffer.
///
/// `BUFN` bounds the backing buffer's capacity; `MAXFIELDS` bounds how many
/// fields may exist in the chain at once.
pub struct LinkedFieldChain<const BUFN: usize, const MAXFIELDS: usize> {
    buffer: ByteBuffer<BUFN>,
    fields: heapless::Vec<FieldMeta, MAXFIELDS>,
}

impl<const BUFN: usize, const MAXFIELDS: usize> LinkedFieldChain<BUFN, MAXFIELDS> {
    pub const fn new() -> Self {
        Self {
            buffer: ByteBuffer::new(),
            fields: heapless::Vec::new(),
        }
    }

    /// Drop every field and empty the backing buffer.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.fields.clear();
    }

    /// Total bytes currently occupied by the chain (== backing buffer length).
    pub fn total_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn backing_buffer(&self) -> &ByteBuffer<BUFN> {
        &self.buffer
    }

    /// Install the first field of the chain, writing `data` as its initial
    /// contents. Fails if the chain already has a root or `data` does not
    /// fit the backing buffer.
    pub fn init_root(&mut self, data: &[u8]) -> Option<LinkedField> {
        if !self.fields.is_empty() {
            return None;
        }
        if !self.buffer.append_bytes(data) {
            return None;
        }
        self.fields
            .push(FieldMeta {
                start: 0,
                len: data.len(),
            })
            .ok()?;
        Some(LinkedField { index: 0 })
    }

    /// Install a new field immediately after `parent`, writing `data` as
    /// its initial contents. `parent` must currently be the last field in
    /// the chain (fields are always appended at the tail).
    pub fn init_child(&mut self, parent: LinkedField, data: &[u8]) -> Option<LinkedField> {
        if parent.index != self.fields.len().checked_sub(1)? {
            return None;
        }
        let start = self.total_len();
        if !self.buffer.append_bytes(data) {
            return None;
        }
        self.fields
            .push(FieldMeta {
                start,
                len: data.len(),
            })
            .ok()?;
        Some(LinkedField {
            index: parent.index + 1,
        })
    }

    /// Append bytes to the end of `field`'s range. Only legal when `field`
    /// is the last field in the chain (growing a middle field would require
    /// shifting every field after it; no caller in this crate needs that).
    pub fn field_append(&mut self, field: LinkedField, data: &[u8]) -> bool {
        if field.index != self.fields.len().saturating_sub(1) {
            return false;
        }
        if !self.buffer.append_bytes(data) {
            return false;
        }
        self.fields[field.index].len += data.len();
        true
    }

    /// Overwrite `data.len()` bytes at the start of `field`'s range,
    /// without changing its length. Fails if `data` is longer than the
    /// field.
    pub fn field_overwrite(&mut self, field: LinkedField, data: &[u8]) -> bool {
        let Some(meta) = self.fields.get(field.index).copied() else {
            return false;
        };
        if data.len() > meta.len {
            return false;
        }
        self.buffer.overwrite(meta.start, data)
    }

    /// Shrink `field` to `new_len` bytes (counted from its start), removing
    /// the trailing bytes and shifting every later field's start left by
    /// the same amount. Growing (`new_len > current len`) is rejected —
    /// rewriting a field is always a shrink-or-same operation.
    pub fn field_shrink_to(&mut self, field: LinkedField, new_len: usize) -> bool {
        let Some(meta) = self.fields.get(field.index).copied() else {
            return false;
        };
        if new_len > meta.len {
            return false;
        }
        let removed = meta.len - new_len;
        if removed == 0 {
            return true;
        }
        if !self
            .buffer
            .remove_range(meta.start + new_len, removed)
        {
            return false;
        }
        self.fields[field.index].len = new_len;
        for later in &mut self.fields[field.index + 1..] {
            later.start -= removed;
        }
        true
    }

    pub fn field_len(&self, field: LinkedField) -> Option<usize> {
        self.fields.get(field.index).map(|m| m.len)
    }

    pub fn field_start(&self, field: LinkedField) -> Option<usize> {
        self.fields.get(field.index).map(|m| m.start)
    }

    pub fn field_slice(&self, field: LinkedField) -> Option<&[u8]> {
        let meta = self.fields.get(field.index)?;
        self.buffer.read_bytes(meta.start, meta.len)
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Verifies the chain invariant: fields are contiguous and the last
    /// one ends exactly at the buffer's length. Used by tests and by
    /// debug assertions in callers that build chains by hand.
    pub fn is_contiguous(&self) -> bool {
        let mut expected_start = 0usize;
        for meta in &self.fields {
            if meta.start != expected_start {
                return false;
            }
            expected_start += meta.len;
        }
        expected_start == self.buffer.len()
    }
}

impl<const BUFN: usize, const MAXFIELDS: usize> Default for LinkedFieldChain<BUFN, MAXFIELDS> {
    fn default() -> Self {
        Self::new()
    }
}
