//! Severity levels for offenses

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Severity level of an offense, ordered from least to most severe
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational note, never affects exit status
    Info,
    /// Code that works but could be written more cleanly
    Refactor,
    /// Violation of a coding convention
    #[default]
    Convention,
    /// Likely problem
    Warning,
    /// Definite problem
    Error,
    /// Problem that prevents further analysis of the file
    Fatal,
}

/// Error for an unrecognized severity name
///
/// Constructing an offense from an unknown severity is a defect in the
/// calling code, so this is surfaced immediately rather than coerced to
/// a default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown severity name: {0:?}")]
pub struct UnknownSeverity(pub String);

impl Severity {
    /// All severity levels in ascending order
    pub const ALL: [Severity; 6] = [
        Severity::Info,
        Severity::Refactor,
        Severity::Convention,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    /// Lowercase name of this level
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Refactor => "refactor",
            Severity::Convention => "convention",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    /// Single-letter code used in compact report lines
    pub fn code(&self) -> char {
        match self {
            Severity::Info => 'I',
            Severity::Refactor => 'R',
            Severity::Convention => 'C',
            Severity::Warning => 'W',
            Severity::Error => 'E',
            Severity::Fatal => 'F',
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "refactor" => Ok(Severity::Refactor),
            "convention" => Ok(Severity::Convention),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}
