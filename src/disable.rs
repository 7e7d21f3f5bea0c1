//! Inline disable directives
//!
//! Comments of the form `# precinct-disable CopName` switch a cop off
//! for the line they appear on; `-next-line` and `-file` variants cover
//! the following line and the whole file. Several cop names may be
//! given, comma separated, and `all` disables every cop. Directives are
//! scanned textually from the buffer so they work regardless of how the
//! external parser represents comments.

use crate::source::{SourceBuffer, SourceRange};
use std::collections::{HashMap, HashSet};

const DIRECTIVE_FILE: &str = "precinct-disable-file";
const DIRECTIVE_NEXT_LINE: &str = "precinct-disable-next-line";
const DIRECTIVE_LINE: &str = "precinct-disable";

/// Parsed disable directives for one buffer
#[derive(Debug, Default)]
pub struct DisableDirectives {
    /// cop name -> lines it is disabled on
    disabled_lines: HashMap<String, HashSet<usize>>,
    /// cops disabled for the whole file
    disabled_file: HashSet<String>,
}

impl DisableDirectives {
    /// Scan every line of `buffer` for directives
    pub fn parse(buffer: &SourceBuffer) -> Self {
        let mut directives = Self::default();

        for (index, line) in buffer.source().lines().enumerate() {
            let line_num = index + 1;

            // Longest directive first; the short form is a prefix of the
            // other two.
            if let Some(names) = directive_names(line, DIRECTIVE_FILE) {
                directives.disabled_file.extend(names);
            } else if let Some(names) = directive_names(line, DIRECTIVE_NEXT_LINE) {
                for name in names {
                    directives
                        .disabled_lines
                        .entry(name)
                        .or_default()
                        .insert(line_num + 1);
                }
            } else if let Some(names) = directive_names(line, DIRECTIVE_LINE) {
                for name in names {
                    directives
                        .disabled_lines
                        .entry(name)
                        .or_default()
                        .insert(line_num);
                }
            }
        }

        directives
    }

    /// Whether `cop_name` is disabled at `line`
    pub fn disabled(&self, cop_name: &str, line: usize) -> bool {
        if self.disabled_file.contains("all") || self.disabled_file.contains(cop_name) {
            return true;
        }
        let on_line = |name: &str| {
            self.disabled_lines
                .get(name)
                .is_some_and(|lines| lines.contains(&line))
        };
        on_line("all") || on_line(cop_name)
    }

    pub fn is_empty(&self) -> bool {
        self.disabled_lines.is_empty() && self.disabled_file.is_empty()
    }
}

/// Cop names following `directive` in `line`, if the directive occurs
/// inside a `#` comment
fn directive_names(line: &str, directive: &str) -> Option<Vec<String>> {
    let comment_start = line.find('#')?;
    let comment = &line[comment_start + 1..];
    let rest = comment.trim_start().strip_prefix(directive)?;
    // Reject a longer directive matched against its prefix
    if rest.starts_with('-') {
        return None;
    }
    let names: Vec<String> = rest
        .split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names)
    }
}

/// The comment text that disables `cop_name` on the line it ends
pub fn directive_comment(cop_name: &str) -> String {
    format!(" # {} {}", DIRECTIVE_LINE, cop_name)
}

/// Zero-width range at the end of `line`, where a disable comment is
/// appended for uncorrectable offenses
pub fn directive_insertion_point(buffer: &SourceBuffer, line: usize) -> Option<SourceRange> {
    buffer.line_range(line).map(|range| range.end_point())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_directive() {
        let buffer = SourceBuffer::new(
            "test.rb",
            "x = 1 # precinct-disable Style/Semicolon\ny = 2\n",
        );
        let directives = DisableDirectives::parse(&buffer);
        assert!(directives.disabled("Style/Semicolon", 1));
        assert!(!directives.disabled("Style/Semicolon", 2));
        assert!(!directives.disabled("Style/Other", 1));
    }

    #[test]
    fn test_next_line_directive() {
        let buffer = SourceBuffer::new(
            "test.rb",
            "# precinct-disable-next-line Lint/Debugger\nbinding.irb\n",
        );
        let directives = DisableDirectives::parse(&buffer);
        assert!(!directives.disabled("Lint/Debugger", 1));
        assert!(directives.disabled("Lint/Debugger", 2));
    }

    #[test]
    fn test_file_directive() {
        let buffer = SourceBuffer::new(
            "test.rb",
            "# precinct-disable-file Metrics/LineLength\nxxxx\nyyyy\n",
        );
        let directives = DisableDirectives::parse(&buffer);
        assert!(directives.disabled("Metrics/LineLength", 1));
        assert!(directives.disabled("Metrics/LineLength", 99));
        assert!(!directives.disabled("Style/Other", 2));
    }

    #[test]
    fn test_all_keyword() {
        let buffer = SourceBuffer::new("test.rb", "x # precinct-disable all\n");
        let directives = DisableDirectives::parse(&buffer);
        assert!(directives.disabled("Any/Cop", 1));
    }

    #[test]
    fn test_multiple_names_comma_separated() {
        let buffer =
            SourceBuffer::new("test.rb", "x # precinct-disable Style/A, Style/B\n");
        let directives = DisableDirectives::parse(&buffer);
        assert!(directives.disabled("Style/A", 1));
        assert!(directives.disabled("Style/B", 1));
        assert!(!directives.disabled("Style/C", 1));
    }

    #[test]
    fn test_no_directives() {
        let buffer = SourceBuffer::new("test.rb", "x = 1\n# plain comment\n");
        let directives = DisableDirectives::parse(&buffer);
        assert!(directives.is_empty());
        assert!(!directives.disabled("Style/A", 1));
    }

    #[test]
    fn test_directive_comment_round_trip() {
        // The comment appended for uncorrectable offenses parses back as
        // a line directive.
        let line = format!("offending code{}", directive_comment("Style/Foo"));
        let buffer = SourceBuffer::new("test.rb", line);
        let directives = DisableDirectives::parse(&buffer);
        assert!(directives.disabled("Style/Foo", 1));
    }

    #[test]
    fn test_insertion_point_at_line_end() {
        let buffer = SourceBuffer::new("test.rb", "abc\ndef\n");
        let point = directive_insertion_point(&buffer, 1).unwrap();
        assert_eq!((point.begin(), point.end()), (3, 3));
        let point = directive_insertion_point(&buffer, 2).unwrap();
        assert_eq!((point.begin(), point.end()), (7, 7));
        assert!(directive_insertion_point(&buffer, 9).is_none());
    }
}
