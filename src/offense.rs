//! Offense records produced by cops

use crate::severity::Severity;
use crate::source::{SourceBuffer, SourceRange};
use std::cmp::Ordering;

/// Whether a cop attempted and managed to autocorrect an offense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CorrectionStatus {
    /// No correction was attempted (cop unsupported, or autocorrect off)
    #[default]
    Unsupported,
    /// A correction was produced and applied this pass
    Corrected,
    /// A correction was attempted but discarded (e.g. conflicting edits)
    Uncorrected,
}

/// Resolved location of an offense
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffenseLocation {
    /// Buffer name (usually the file path)
    pub file: String,
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
    /// Byte range of the flagged source
    pub range: SourceRange,
}

impl OffenseLocation {
    pub fn resolve(range: SourceRange, buffer: &SourceBuffer) -> Self {
        let (line, column) = range.line_col(buffer);
        Self {
            file: buffer.name().to_string(),
            line,
            column,
            range,
        }
    }
}

/// One detected violation, immutable after construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offense {
    pub severity: Severity,
    pub location: OffenseLocation,
    pub message: String,
    /// Fully-qualified cop name ("Department/CopName")
    pub cop_name: String,
    pub status: CorrectionStatus,
}

impl Offense {
    pub fn new(
        severity: Severity,
        location: OffenseLocation,
        message: impl Into<String>,
        cop_name: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            location,
            message: message.into(),
            cop_name: cop_name.into(),
            status: CorrectionStatus::Unsupported,
        }
    }

    pub fn with_status(mut self, status: CorrectionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn corrected(&self) -> bool {
        self.status == CorrectionStatus::Corrected
    }

    pub fn line(&self) -> usize {
        self.location.line
    }

    pub fn column(&self) -> usize {
        self.location.column
    }

    /// Ordering key: (line, column, cop name)
    ///
    /// Reports are sorted by location first and tie-broken by cop name so
    /// repeated runs produce identical output. Equal keys compare equal
    /// regardless of message or severity.
    fn sort_key(&self) -> (usize, usize, &str) {
        (self.location.line, self.location.column, &self.cop_name)
    }
}

impl Ord for Offense {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Offense {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Offense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: [{}] {}",
            self.location.file,
            self.location.line,
            self.location.column,
            self.severity.code(),
            self.cop_name,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn offense(line: usize, column: usize, cop: &str) -> Offense {
        let buffer = SourceBuffer::new("test.rb", "x\ny\nz\n");
        Offense::new(
            Severity::Convention,
            OffenseLocation {
                file: "test.rb".to_string(),
                line,
                column,
                range: SourceRange::zero_width(buffer.id(), 0),
            },
            "message",
            cop,
        )
    }

    #[test]
    fn test_ordering_by_location_then_cop() {
        let a = offense(1, 1, "Metrics/LineLength");
        let b = offense(1, 2, "Layout/Alpha");
        let c = offense(2, 1, "Layout/Alpha");
        assert!(a < b);
        assert!(b < c);
        assert!(a < c);
    }

    #[test]
    fn test_cop_name_tie_break() {
        let a = offense(3, 5, "Layout/Alpha");
        let b = offense(3, 5, "Style/Beta");
        assert!(a < b);
    }

    #[test]
    fn test_equal_keys_compare_equal() {
        let a = offense(3, 5, "Layout/Alpha");
        let mut b = offense(3, 5, "Layout/Alpha");
        b.severity = Severity::Error;
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_sort_is_transitive_total_order() {
        let mut offenses = vec![
            offense(2, 1, "B/B"),
            offense(1, 9, "A/A"),
            offense(2, 1, "A/A"),
            offense(1, 1, "C/C"),
        ];
        offenses.sort();
        let keys: Vec<_> = offenses
            .iter()
            .map(|o| (o.line(), o.column(), o.cop_name.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (1, 1, "C/C".to_string()),
                (1, 9, "A/A".to_string()),
                (2, 1, "A/A".to_string()),
                (2, 1, "B/B".to_string()),
            ]
        );
    }

    #[test]
    fn test_display() {
        let o = offense(3, 5, "Layout/Alpha");
        assert_eq!(o.to_string(), "test.rb:3:5: C: [Layout/Alpha] message");
    }

    #[test]
    fn test_resolve_location() {
        let buffer = SourceBuffer::new("test.rb", "abc\ndef\n");
        let loc = OffenseLocation::resolve(buffer.range(5, 6), &buffer);
        assert_eq!((loc.line, loc.column), (2, 2));
        assert_eq!(loc.file, "test.rb");
    }
}
