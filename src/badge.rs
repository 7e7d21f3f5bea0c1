//! Cop identity: (department, name) pairs

use serde::{Deserialize, Serialize};

/// Identity of a cop, e.g. `Style/RedundantSelf`
///
/// Compared and hashed by value. Rendered as `Department/CopName`, or
/// just `CopName` when the cop has no department.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Badge {
    pub department: Option<String>,
    pub cop_name: String,
}

impl Badge {
    pub fn new(department: impl Into<String>, cop_name: impl Into<String>) -> Self {
        Self {
            department: Some(department.into()),
            cop_name: cop_name.into(),
        }
    }

    pub fn undepartmented(cop_name: impl Into<String>) -> Self {
        Self {
            department: None,
            cop_name: cop_name.into(),
        }
    }

    /// Parse a `Dept/Name` or bare `Name` string
    ///
    /// Segment contents are not validated; any non-empty text is
    /// accepted on either side of the slash.
    pub fn parse(text: &str) -> Self {
        match text.split_once('/') {
            Some((department, cop_name)) => Self::new(department, cop_name),
            None => Self::undepartmented(text),
        }
    }

    /// Derive a badge from a `::`-delimited type path, taking the last
    /// two segments as department and name
    pub fn for_path(path: &str) -> Self {
        let mut segments = path.rsplit("::");
        let cop_name = segments.next().unwrap_or(path);
        match segments.next() {
            Some(department) => Self::new(department, cop_name),
            None => Self::undepartmented(cop_name),
        }
    }

    pub fn qualified(&self) -> bool {
        self.department.is_some()
    }

    /// Badge with the same name moved to another department
    pub fn with_department(&self, department: impl Into<String>) -> Self {
        Self::new(department, self.cop_name.clone())
    }
}

impl std::fmt::Display for Badge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.department {
            Some(department) => write!(f, "{}/{}", department, self.cop_name),
            None => f.write_str(&self.cop_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_qualified() {
        let badge = Badge::parse("Style/LineLength");
        assert_eq!(badge.department.as_deref(), Some("Style"));
        assert_eq!(badge.cop_name, "LineLength");
        assert!(badge.qualified());
    }

    #[test]
    fn test_parse_unqualified() {
        let badge = Badge::parse("LineLength");
        assert_eq!(badge.department, None);
        assert_eq!(badge.cop_name, "LineLength");
        assert!(!badge.qualified());
    }

    #[test]
    fn test_display_round_trip() {
        let qualified = Badge::new("Metrics", "LineLength");
        assert_eq!(Badge::parse(&qualified.to_string()), qualified);

        let bare = Badge::undepartmented("LineLength");
        assert_eq!(Badge::parse(&bare.to_string()), bare);
    }

    #[test]
    fn test_for_path_takes_last_two_segments() {
        let badge = Badge::for_path("precinct::cops::Metrics::LineLength");
        assert_eq!(badge, Badge::new("Metrics", "LineLength"));
    }

    #[test]
    fn test_for_path_single_segment() {
        let badge = Badge::for_path("LineLength");
        assert_eq!(badge, Badge::undepartmented("LineLength"));
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(
            Badge::new("Style", "Foo"),
            Badge::parse("Style/Foo")
        );
        assert_ne!(Badge::new("Style", "Foo"), Badge::new("Lint", "Foo"));
    }

    #[test]
    fn test_with_department() {
        let badge = Badge::undepartmented("Foo").with_department("Lint");
        assert_eq!(badge.to_string(), "Lint/Foo");
    }
}
