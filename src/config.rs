//! Configuration: global policy plus per-cop option slices
//!
//! Loaded from YAML or JSON, chosen by file extension. The structure is
//! deliberately small: config discovery, inheritance chains, and merging
//! live outside this crate.

use crate::registry::{Registry, RegistryError};
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Per-cop slice of configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CopOptions {
    /// `Some(false)` disables the cop explicitly; `None` means default
    pub enabled: Option<bool>,

    /// Whether the cop's corrections are considered safe
    pub safe: bool,

    /// Whether autocorrection is allowed for this cop
    pub autocorrect: bool,

    /// Severity override (default is the cop's own, usually convention)
    pub severity: Option<Severity>,

    /// File include patterns (empty = all files)
    pub include: Vec<String>,

    /// File exclude patterns
    pub exclude: Vec<String>,
}

impl Default for CopOptions {
    fn default() -> Self {
        Self {
            enabled: None,
            safe: true,
            autocorrect: true,
            severity: None,
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl CopOptions {
    /// Explicitly disabled in configuration
    pub fn is_disabled(&self) -> bool {
        self.enabled == Some(false)
    }

    /// Explicitly enabled in configuration
    pub fn is_explicitly_enabled(&self) -> bool {
        self.enabled == Some(true)
    }

    /// Whether the cop applies to the named file
    ///
    /// The cheap pre-check run before traversal: include patterns (when
    /// present) must match, exclude patterns must not. Unparseable
    /// patterns are skipped.
    pub fn matches_file(&self, name: &str) -> bool {
        if !self.include.is_empty() {
            let included = self.include.iter().any(|pattern| glob_match(pattern, name));
            if !included {
                return false;
            }
        }
        !self.exclude.iter().any(|pattern| glob_match(pattern, name))
    }
}

fn glob_match(pattern: &str, name: &str) -> bool {
    match globset::Glob::new(pattern) {
        Ok(glob) => glob.compile_matcher().is_match(name),
        Err(_) => false,
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Config-file-level policy for pending cops (`None` = not set,
    /// pending cops stay off)
    pub pending_cops_enabled: Option<bool>,

    /// Command-line-equivalent override; always takes precedence over
    /// the config-file policy when set
    #[serde(skip)]
    pub pending_cops_override: Option<bool>,

    /// Per-cop options keyed by qualified cop name
    pub cops: HashMap<String, CopOptions>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML or JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
            "json" => Ok(serde_json::from_str(&content)?),
            _ => Err(ConfigError::Invalid(format!(
                "unknown config file format: {:?}",
                ext
            ))),
        }
    }

    /// Options for one cop; the default slice when the cop has no entry
    pub fn cop(&self, name: &str) -> CopOptions {
        self.cops.get(name).cloned().unwrap_or_default()
    }

    /// Set a cop's options
    pub fn set_cop(&mut self, name: impl Into<String>, options: CopOptions) {
        self.cops.insert(name.into(), options);
    }

    /// Resolved pending-cop policy: the command-line-equivalent override
    /// wins over the config-file policy; neither set means pending cops
    /// are off
    pub fn pending_enabled(&self) -> bool {
        self.pending_cops_override
            .or(self.pending_cops_enabled)
            .unwrap_or(false)
    }

    /// Severity a cop reports with, given a fallback default
    pub fn severity_for(&self, name: &str, default: Severity) -> Severity {
        self.cops
            .get(name)
            .and_then(|options| options.severity)
            .unwrap_or(default)
    }

    /// Qualify every unqualified cop key against a registry
    ///
    /// Ambiguous short names are a hard configuration error; unknown
    /// names pass through with a warning from the registry.
    pub fn qualify(&self, registry: &Registry) -> Result<Self, RegistryError> {
        let mut cops = HashMap::with_capacity(self.cops.len());
        for (name, options) in &self.cops {
            let qualified = registry.qualified_cop_name(name, "config")?;
            cops.insert(qualified, options.clone());
        }
        Ok(Self {
            pending_cops_enabled: self.pending_cops_enabled,
            pending_cops_override: self.pending_cops_override,
            cops,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_cop_options() {
        let options = CopOptions::default();
        assert!(!options.is_disabled());
        assert!(options.safe);
        assert!(options.autocorrect);
        assert!(options.matches_file("anything.rb"));
    }

    #[test]
    fn test_yaml_deserialize() {
        let yaml = r#"
pending_cops_enabled: true
cops:
  Metrics/LineLength:
    enabled: false
    severity: warning
  Style/Semicolon:
    autocorrect: false
    exclude:
      - "spec/**"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.pending_cops_enabled, Some(true));
        assert!(config.cop("Metrics/LineLength").is_disabled());
        assert_eq!(
            config.cop("Metrics/LineLength").severity,
            Some(Severity::Warning)
        );
        assert!(!config.cop("Style/Semicolon").autocorrect);
        assert!(!config.cop("Style/Semicolon").matches_file("spec/a_spec.rb"));
        assert!(config.cop("Style/Semicolon").matches_file("lib/a.rb"));
    }

    #[test]
    fn test_unknown_cop_gets_default_slice() {
        let config = Config::new();
        let options = config.cop("Style/Missing");
        assert_eq!(options.enabled, None);
    }

    #[test]
    fn test_include_patterns() {
        let options = CopOptions {
            include: vec!["**/*.rb".to_string()],
            ..CopOptions::default()
        };
        assert!(options.matches_file("lib/foo.rb"));
        assert!(!options.matches_file("lib/foo.py"));
    }

    #[test]
    fn test_pending_policy_precedence() {
        let mut config = Config::new();
        assert!(!config.pending_enabled());

        config.pending_cops_enabled = Some(true);
        assert!(config.pending_enabled());

        // The command-line-equivalent flag wins over the file policy
        config.pending_cops_override = Some(false);
        assert!(!config.pending_enabled());

        config.pending_cops_enabled = Some(false);
        config.pending_cops_override = Some(true);
        assert!(config.pending_enabled());
    }

    #[test]
    fn test_severity_for() {
        let mut config = Config::new();
        assert_eq!(
            config.severity_for("Style/Foo", Severity::Convention),
            Severity::Convention
        );
        config.set_cop(
            "Style/Foo",
            CopOptions {
                severity: Some(Severity::Error),
                ..CopOptions::default()
            },
        );
        assert_eq!(
            config.severity_for("Style/Foo", Severity::Convention),
            Severity::Error
        );
    }
}
