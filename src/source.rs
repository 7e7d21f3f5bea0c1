//! Immutable source buffers and byte-offset ranges

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a source buffer
///
/// Ranges carry the id of the buffer they were cut from, so a corrector
/// can reject edits that belong to a different file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

/// Immutable source text with a name (usually the file path)
#[derive(Debug)]
pub struct SourceBuffer {
    id: BufferId,
    name: String,
    source: String,
    /// Byte offset of the start of each line
    line_starts: Vec<usize>,
}

impl SourceBuffer {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            id: BufferId(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            source,
            line_starts,
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Convert a byte offset to a 1-based (line, column) pair
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line.saturating_sub(1)];
        (line, offset - line_start + 1)
    }

    /// Source text of line `n` (1-based), without the trailing newline
    pub fn line(&self, n: usize) -> Option<&str> {
        if n == 0 || n > self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[n - 1];
        let end = self
            .line_starts
            .get(n)
            .map(|&next| next - 1)
            .unwrap_or(self.source.len());
        Some(&self.source[start..end])
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Range covering line `n` (1-based), excluding the trailing newline
    pub fn line_range(&self, n: usize) -> Option<SourceRange> {
        let text = self.line(n)?;
        let start = self.line_starts[n - 1];
        Some(SourceRange::new(self.id, start, start + text.len()))
    }

    /// Range covering the whole buffer
    pub fn whole_range(&self) -> SourceRange {
        SourceRange::new(self.id, 0, self.source.len())
    }

    /// Range for `begin..end` within this buffer
    pub fn range(&self, begin: usize, end: usize) -> SourceRange {
        debug_assert!(begin <= end && end <= self.source.len());
        SourceRange::new(self.id, begin, end)
    }
}

/// A half-open byte range `[begin, end)` within one buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRange {
    buffer: BufferId,
    begin: usize,
    end: usize,
}

impl SourceRange {
    pub fn new(buffer: BufferId, begin: usize, end: usize) -> Self {
        debug_assert!(begin <= end);
        Self { buffer, begin, end }
    }

    /// Zero-width range anchored at `at`
    pub fn zero_width(buffer: BufferId, at: usize) -> Self {
        Self::new(buffer, at, at)
    }

    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// The substring this range covers
    pub fn source<'a>(&self, buffer: &'a SourceBuffer) -> &'a str {
        debug_assert_eq!(self.buffer, buffer.id());
        &buffer.source()[self.begin..self.end]
    }

    /// 1-based (line, column) of the range start
    pub fn line_col(&self, buffer: &SourceBuffer) -> (usize, usize) {
        buffer.line_col(self.begin)
    }

    /// Whether two ranges share any byte offset
    ///
    /// Zero-width ranges overlap nothing; they sit between bytes.
    pub fn overlaps(&self, other: &SourceRange) -> bool {
        self.buffer == other.buffer
            && !self.is_empty()
            && !other.is_empty()
            && self.begin < other.end
            && other.begin < self.end
    }

    pub fn contains(&self, other: &SourceRange) -> bool {
        self.buffer == other.buffer && self.begin <= other.begin && other.end <= self.end
    }

    /// Whether `other` starts exactly where this range ends (or vice versa)
    pub fn adjacent_to(&self, other: &SourceRange) -> bool {
        self.buffer == other.buffer && (self.end == other.begin || other.end == self.begin)
    }

    /// Zero-width range at this range's start
    pub fn begin_point(&self) -> SourceRange {
        SourceRange::zero_width(self.buffer, self.begin)
    }

    /// Zero-width range at this range's end
    pub fn end_point(&self) -> SourceRange {
        SourceRange::zero_width(self.buffer, self.end)
    }
}
