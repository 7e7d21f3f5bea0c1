//! Text-edit accumulation and conflict-checked source rewriting

use crate::source::{SourceBuffer, SourceRange};
use std::sync::Arc;
use thiserror::Error;

/// Error registering or merging edits
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrectError {
    /// The edit's range belongs to a different buffer than the corrector.
    /// Applying it would corrupt an unrelated file, so this is a defect
    /// in the calling code and fails before any state changes.
    #[error("edit range belongs to a different source buffer")]
    BufferMismatch,

    /// The edit overlaps a previously registered, non-identical edit
    #[error("edit at {new_begin}..{new_end} conflicts with existing edit at {existing_begin}..{existing_end}")]
    Overlap {
        existing_begin: usize,
        existing_end: usize,
        new_begin: usize,
        new_end: usize,
    },
}

/// One pending text edit
///
/// `replacement: None` means deletion. Insertions are zero-width ranges
/// with non-empty text. `seq` is the registration order, used as the
/// stable tie-break when several zero-width edits anchor at the same
/// offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    range: SourceRange,
    replacement: Option<String>,
    seq: usize,
}

impl Edit {
    pub fn range(&self) -> SourceRange {
        self.range
    }

    pub fn replacement(&self) -> Option<&str> {
        self.replacement.as_deref()
    }
}

/// Accumulates edits against one buffer and renders the rewritten text
///
/// Conflicts are detected eagerly at registration time: an edit that
/// overlaps an already-registered, non-identical edit is rejected and
/// the corrector is left untouched, so a cop's correction attempt can be
/// discarded whole without partial application.
#[derive(Debug, Clone)]
pub struct Corrector {
    buffer: Arc<SourceBuffer>,
    edits: Vec<Edit>,
    next_seq: usize,
}

impl Corrector {
    pub fn new(buffer: Arc<SourceBuffer>) -> Self {
        Self {
            buffer,
            edits: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn buffer(&self) -> &SourceBuffer {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Replace `range` with `text`
    pub fn replace(
        &mut self,
        range: SourceRange,
        text: impl Into<String>,
    ) -> Result<(), CorrectError> {
        self.register(range, Some(text.into()))
    }

    /// Delete `range`
    pub fn remove(&mut self, range: SourceRange) -> Result<(), CorrectError> {
        self.register(range, None)
    }

    /// Insert `text` immediately before `range`
    pub fn insert_before(
        &mut self,
        range: SourceRange,
        text: impl Into<String>,
    ) -> Result<(), CorrectError> {
        self.register(range.begin_point(), Some(text.into()))
    }

    /// Insert `text` immediately after `range`
    pub fn insert_after(
        &mut self,
        range: SourceRange,
        text: impl Into<String>,
    ) -> Result<(), CorrectError> {
        self.register(range.end_point(), Some(text.into()))
    }

    fn register(
        &mut self,
        range: SourceRange,
        replacement: Option<String>,
    ) -> Result<(), CorrectError> {
        if range.buffer() != self.buffer.id() {
            return Err(CorrectError::BufferMismatch);
        }

        for existing in &self.edits {
            // Byte-identical range with identical replacement is a no-op
            // duplicate; register once and accept the rest silently.
            if existing.range == range && existing.replacement == replacement {
                return Ok(());
            }
            if edits_conflict(existing.range, range) {
                return Err(CorrectError::Overlap {
                    existing_begin: existing.range.begin(),
                    existing_end: existing.range.end(),
                    new_begin: range.begin(),
                    new_end: range.end(),
                });
            }
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.edits.push(Edit {
            range,
            replacement,
            seq,
        });
        Ok(())
    }

    /// Fold another corrector's edit set into this one
    ///
    /// All-or-nothing: every incoming edit is checked against the current
    /// set first, and on the first conflict the whole incoming set is
    /// rejected with this corrector unchanged. Incoming edits keep their
    /// relative registration order.
    pub fn merge(&mut self, other: &Corrector) -> Result<(), CorrectError> {
        if other.buffer.id() != self.buffer.id() {
            return Err(CorrectError::BufferMismatch);
        }

        for incoming in &other.edits {
            for existing in &self.edits {
                if existing.range == incoming.range && existing.replacement == incoming.replacement
                {
                    continue;
                }
                if edits_conflict(existing.range, incoming.range) {
                    return Err(CorrectError::Overlap {
                        existing_begin: existing.range.begin(),
                        existing_end: existing.range.end(),
                        new_begin: incoming.range.begin(),
                        new_end: incoming.range.end(),
                    });
                }
            }
        }

        let mut incoming: Vec<Edit> = other.edits.clone();
        incoming.sort_by_key(|e| e.seq);
        for mut edit in incoming {
            let duplicate = self
                .edits
                .iter()
                .any(|e| e.range == edit.range && e.replacement == edit.replacement);
            if duplicate {
                continue;
            }
            edit.seq = self.next_seq;
            self.next_seq += 1;
            self.edits.push(edit);
        }
        Ok(())
    }

    /// Render the rewritten source
    ///
    /// Edits are sorted by start offset; at the same offset, zero-width
    /// insertions render before a replacement or removal starting there,
    /// and registration order is the stable tie-break among insertions.
    /// The original buffer is then walked once, copying unedited spans
    /// verbatim and substituting each edit's replacement.
    pub fn rewrite(&self) -> String {
        let mut sorted: Vec<&Edit> = self.edits.iter().collect();
        sorted.sort_by_key(|e| (e.range.begin(), !e.range.is_empty(), e.seq));

        let source = self.buffer.source();
        let mut output = String::with_capacity(source.len());
        let mut cursor = 0;

        for edit in sorted {
            if edit.range.begin() > cursor {
                output.push_str(&source[cursor..edit.range.begin()]);
            }
            if let Some(text) = &edit.replacement {
                output.push_str(text);
            }
            cursor = cursor.max(edit.range.end());
        }
        output.push_str(&source[cursor..]);
        output
    }
}

/// Whether two edit ranges conflict
///
/// Ranges that share any byte offset conflict. A zero-width edit shares
/// no offsets, but one anchored strictly inside another edit's interior
/// would still interleave with its replacement, so that counts too.
/// Zero-width edits at a range's boundaries do not conflict with it.
fn edits_conflict(a: SourceRange, b: SourceRange) -> bool {
    if a.overlaps(&b) {
        return true;
    }
    let inside = |point: SourceRange, span: SourceRange| {
        point.is_empty()
            && !span.is_empty()
            && span.begin() < point.begin()
            && point.begin() < span.end()
    };
    inside(a, b) || inside(b, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn buffer(text: &str) -> Arc<SourceBuffer> {
        Arc::new(SourceBuffer::new("test.rb", text))
    }

    #[test]
    fn test_insert_before() {
        let buf = buffer("true and false");
        let mut corrector = Corrector::new(Arc::clone(&buf));
        let op = buf.range(5, 8);
        corrector.insert_before(op, ";nil ").unwrap();
        assert_eq!(corrector.rewrite(), "true ;nil and false");
    }

    #[test]
    fn test_replace() {
        let buf = buffer("true and false");
        let mut corrector = Corrector::new(Arc::clone(&buf));
        corrector.replace(buf.range(5, 8), "or").unwrap();
        assert_eq!(corrector.rewrite(), "true or false");
    }

    #[test]
    fn test_remove() {
        let buf = buffer("true and false");
        let mut corrector = Corrector::new(Arc::clone(&buf));
        corrector.remove(buf.range(4, 8)).unwrap();
        assert_eq!(corrector.rewrite(), "true false");
    }

    #[test]
    fn test_insert_after() {
        let buf = buffer("true and false");
        let mut corrector = Corrector::new(Arc::clone(&buf));
        corrector.insert_after(buf.range(0, 4), "!").unwrap();
        assert_eq!(corrector.rewrite(), "true! and false");
    }

    #[test]
    fn test_noop_replacement_is_idempotent() {
        let buf = buffer("true and false");
        let mut corrector = Corrector::new(Arc::clone(&buf));
        corrector.replace(buf.range(5, 8), "and").unwrap();
        assert_eq!(corrector.rewrite(), "true and false");
    }

    #[test]
    fn test_cross_buffer_edit_rejected_without_mutation() {
        let buf = buffer("true and false");
        let other = buffer("something else");
        let mut corrector = Corrector::new(Arc::clone(&buf));

        let foreign = other.range(0, 4);
        assert_eq!(
            corrector.replace(foreign, "x"),
            Err(CorrectError::BufferMismatch)
        );
        assert_eq!(corrector.remove(foreign), Err(CorrectError::BufferMismatch));
        assert_eq!(
            corrector.insert_before(foreign, "x"),
            Err(CorrectError::BufferMismatch)
        );
        assert_eq!(
            corrector.insert_after(foreign, "x"),
            Err(CorrectError::BufferMismatch)
        );
        assert!(corrector.is_empty());
        assert_eq!(corrector.rewrite(), "true and false");
    }

    #[test]
    fn test_overlapping_edits_rejected_eagerly() {
        let buf = buffer("0123456789");
        let mut corrector = Corrector::new(Arc::clone(&buf));
        corrector.replace(buf.range(2, 6), "x").unwrap();

        let err = corrector.replace(buf.range(4, 8), "y").unwrap_err();
        assert!(matches!(err, CorrectError::Overlap { .. }));
        // First edit still stands, second never registered
        assert_eq!(corrector.len(), 1);
        assert_eq!(corrector.rewrite(), "01x6789");
    }

    #[test]
    fn test_identical_duplicate_edit_accepted() {
        let buf = buffer("0123456789");
        let mut corrector = Corrector::new(Arc::clone(&buf));
        corrector.replace(buf.range(2, 6), "x").unwrap();
        corrector.replace(buf.range(2, 6), "x").unwrap();
        assert_eq!(corrector.len(), 1);
        assert_eq!(corrector.rewrite(), "01x6789");
    }

    #[test]
    fn test_insertion_inside_replaced_range_conflicts() {
        let buf = buffer("0123456789");
        let mut corrector = Corrector::new(Arc::clone(&buf));
        corrector.replace(buf.range(2, 6), "x").unwrap();
        let err = corrector.insert_before(buf.range(4, 6), "y").unwrap_err();
        assert!(matches!(err, CorrectError::Overlap { .. }));
    }

    #[test]
    fn test_insertion_precedes_replacement_at_same_offset() {
        // Even when registered later, an insertion anchored where a
        // replacement starts renders before the replacement text.
        let buf = buffer("0123456789");
        let mut corrector = Corrector::new(Arc::clone(&buf));
        corrector.replace(buf.range(2, 6), "x").unwrap();
        corrector.insert_before(buf.range(2, 6), "y").unwrap();
        assert_eq!(corrector.rewrite(), "01yx6789");
    }

    #[test]
    fn test_insertion_at_replacement_boundary_allowed() {
        let buf = buffer("0123456789");
        let mut corrector = Corrector::new(Arc::clone(&buf));
        corrector.replace(buf.range(2, 6), "x").unwrap();
        corrector.insert_after(buf.range(2, 6), "y").unwrap();
        assert_eq!(corrector.rewrite(), "01xy6789");
    }

    #[test]
    fn test_same_point_insertions_keep_registration_order() {
        let buf = buffer("ab");
        let mut corrector = Corrector::new(Arc::clone(&buf));
        let point = buf.range(1, 1);
        corrector.insert_before(point, "1").unwrap();
        corrector.insert_before(point, "2").unwrap();
        corrector.insert_before(point, "3").unwrap();
        assert_eq!(corrector.rewrite(), "a123b");
    }

    #[test]
    fn test_insert_after_meets_insert_before_at_same_point() {
        // insert_after of [0,1) and insert_before of [1,2) anchor at the
        // same offset; registration order decides.
        let buf = buffer("ab");
        let mut corrector = Corrector::new(Arc::clone(&buf));
        corrector.insert_after(buf.range(0, 1), "X").unwrap();
        corrector.insert_before(buf.range(1, 2), "Y").unwrap();
        assert_eq!(corrector.rewrite(), "aXYb");
    }

    #[test]
    fn test_multiple_disjoint_edits() {
        let buf = buffer("aaa bbb ccc");
        let mut corrector = Corrector::new(Arc::clone(&buf));
        corrector.replace(buf.range(8, 11), "zzz").unwrap();
        corrector.remove(buf.range(3, 4)).unwrap();
        corrector.replace(buf.range(0, 3), "A").unwrap();
        assert_eq!(corrector.rewrite(), "Abbb zzz");
    }

    #[test]
    fn test_merge_disjoint_sets() {
        let buf = buffer("aaa bbb ccc");
        let mut first = Corrector::new(Arc::clone(&buf));
        first.replace(buf.range(0, 3), "x").unwrap();

        let mut second = Corrector::new(Arc::clone(&buf));
        second.replace(buf.range(8, 11), "y").unwrap();

        first.merge(&second).unwrap();
        assert_eq!(first.rewrite(), "x bbb y");
    }

    #[test]
    fn test_merge_conflict_rejects_whole_incoming_set() {
        let buf = buffer("aaa bbb ccc");
        let mut first = Corrector::new(Arc::clone(&buf));
        first.replace(buf.range(4, 7), "x").unwrap();

        let mut second = Corrector::new(Arc::clone(&buf));
        second.replace(buf.range(0, 3), "safe").unwrap();
        second.replace(buf.range(5, 9), "clash").unwrap();

        let err = first.merge(&second).unwrap_err();
        assert!(matches!(err, CorrectError::Overlap { .. }));
        // Nothing from the incoming set was taken, not even the safe edit
        assert_eq!(first.len(), 1);
        assert_eq!(first.rewrite(), "aaa x ccc");
    }

    #[test]
    fn test_merge_cross_buffer_rejected() {
        let buf = buffer("aaa");
        let other_buf = buffer("bbb");
        let mut first = Corrector::new(buf);
        let second = Corrector::new(other_buf);
        assert_eq!(first.merge(&second), Err(CorrectError::BufferMismatch));
    }

    #[test]
    fn test_rewrite_deterministic() {
        let buf = buffer("one two three");
        let mut corrector = Corrector::new(Arc::clone(&buf));
        corrector.replace(buf.range(4, 7), "2").unwrap();
        corrector.replace(buf.range(0, 3), "1").unwrap();
        let first = corrector.rewrite();
        for _ in 0..5 {
            assert_eq!(corrector.rewrite(), first);
        }
        assert_eq!(first, "1 2 three");
    }
}
