//! Cop registry: identity lookup, qualification, enable filtering
//!
//! Cops are registered explicitly (one entry per cop, carrying its badge
//! and a factory), built once at startup. Insertion order is load order
//! and is preserved everywhere: filtered views, department lists, and
//! ambiguity messages all follow it, so output is deterministic.

use crate::badge::Badge;
use crate::config::Config;
use crate::cop::Cop;
use std::sync::RwLock;
use thiserror::Error;

/// Lifecycle state of a registered cop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stability {
    /// Enabled by default
    #[default]
    Stable,
    /// Newly added; off unless pending cops are opted into
    Pending,
}

/// Registry error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error(
        "ambiguous cop name {name:?} used in {origin}: needs a department qualifier; candidates are {}",
        candidates.join(", ")
    )]
    AmbiguousCopName {
        name: String,
        origin: String,
        candidates: Vec<String>,
    },
}

/// One registered cop: identity plus a factory for fresh instances
#[derive(Clone)]
pub struct CopRegistration {
    pub badge: Badge,
    pub stability: Stability,
    pub factory: fn() -> Box<dyn Cop>,
}

impl CopRegistration {
    pub fn new(badge: Badge, factory: fn() -> Box<dyn Cop>) -> Self {
        Self {
            badge,
            stability: Stability::Stable,
            factory,
        }
    }

    pub fn pending(mut self) -> Self {
        self.stability = Stability::Pending;
        self
    }

    pub fn qualified_name(&self) -> String {
        self.badge.to_string()
    }
}

impl std::fmt::Debug for CopRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopRegistration")
            .field("badge", &self.badge)
            .field("stability", &self.stability)
            .finish()
    }
}

/// Ordered collection of cop registrations
#[derive(Debug, Clone, Default)]
pub struct Registry {
    registrations: Vec<CopRegistration>,
}

impl Registry {
    pub fn new(registrations: Vec<CopRegistration>) -> Self {
        Self { registrations }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a registration (extension loading)
    pub fn enlist(&mut self, registration: CopRegistration) {
        self.registrations.push(registration);
    }

    /// Remove a cop by badge
    pub fn dismiss(&mut self, badge: &Badge) {
        self.registrations.retain(|r| &r.badge != badge);
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn registrations(&self) -> &[CopRegistration] {
        &self.registrations
    }

    pub fn contains(&self, badge: &Badge) -> bool {
        self.registrations.iter().any(|r| &r.badge == badge)
    }

    /// Qualified names of every registered cop, in insertion order
    pub fn names(&self) -> Vec<String> {
        self.registrations
            .iter()
            .map(CopRegistration::qualified_name)
            .collect()
    }

    /// Every department seen, deduplicated, insertion order
    pub fn departments(&self) -> Vec<String> {
        let mut departments = Vec::new();
        for registration in &self.registrations {
            if let Some(department) = &registration.badge.department {
                if !departments.iter().any(|d| d == department) {
                    departments.push(department.clone());
                }
            }
        }
        departments
    }

    /// Registrations within department `d`, original relative order
    pub fn with_department(&self, department: &str) -> Registry {
        Registry::new(
            self.registrations
                .iter()
                .filter(|r| r.badge.department.as_deref() == Some(department))
                .cloned()
                .collect(),
        )
    }

    /// Registrations outside department `d`, original relative order
    pub fn without_department(&self, department: &str) -> Registry {
        Registry::new(
            self.registrations
                .iter()
                .filter(|r| r.badge.department.as_deref() != Some(department))
                .cloned()
                .collect(),
        )
    }

    /// Registrations sharing the given short name, registry order
    fn find_by_cop_name(&self, cop_name: &str) -> Vec<&CopRegistration> {
        self.registrations
            .iter()
            .filter(|r| r.badge.cop_name == cop_name)
            .collect()
    }

    /// Resolve `name` to its one true `Department/Name` identity
    ///
    /// A name that is already registered under the given qualification
    /// passes through unchanged. Otherwise the short name is resolved
    /// across all departments: no match returns the name unchanged with
    /// a warning, one match returns the qualified name (warning when a
    /// wrong department was silently corrected), and several matches are
    /// a hard error listing every candidate in registry order.
    pub fn qualified_cop_name(&self, name: &str, origin: &str) -> Result<String, RegistryError> {
        let badge = Badge::parse(name);
        if badge.qualified() && self.contains(&badge) {
            return Ok(name.to_string());
        }

        let matches = self.find_by_cop_name(&badge.cop_name);
        match matches.len() {
            0 => {
                log::warn!(
                    "{origin}: no department found for cop name {name:?}; using it as-is"
                );
                Ok(name.to_string())
            }
            1 => {
                let qualified = matches[0].qualified_name();
                if badge.qualified() {
                    log::warn!(
                        "{origin}: {name} has the wrong namespace; should be {qualified}"
                    );
                }
                Ok(qualified)
            }
            _ => Err(RegistryError::AmbiguousCopName {
                name: name.to_string(),
                origin: origin.to_string(),
                candidates: matches
                    .iter()
                    .map(|r| r.qualified_name())
                    .collect(),
            }),
        }
    }

    /// Registrations enabled under `config`
    ///
    /// A non-empty `only` list restricts the run to exactly those
    /// qualified names, overriding everything else, pending and
    /// disabled state included. Otherwise a cop is included if it is
    /// not explicitly disabled, its pending state is allowed under the
    /// resolved pending policy, and (when `safe_only`) it is not marked
    /// unsafe in config. Order is preserved.
    pub fn enabled(
        &self,
        config: &Config,
        only: &[String],
        safe_only: bool,
    ) -> Vec<&CopRegistration> {
        self.registrations
            .iter()
            .filter(|registration| {
                let name = registration.qualified_name();
                if !only.is_empty() {
                    return only.iter().any(|o| o == &name);
                }
                let options = config.cop(&name);
                if options.is_disabled() {
                    return false;
                }
                if registration.stability == Stability::Pending && !config.pending_enabled() {
                    return false;
                }
                if safe_only && !options.safe {
                    return false;
                }
                true
            })
            .collect()
    }
}

static GLOBAL: RwLock<Option<Registry>> = RwLock::new(None);

/// Snapshot of the process-wide registry
pub fn global() -> Registry {
    GLOBAL
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
        .unwrap_or_default()
}

/// Replace the process-wide registry
pub fn set_global(registry: Registry) {
    *GLOBAL
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(registry);
}

struct RestoreGuard {
    previous: Option<Registry>,
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        *GLOBAL
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = self.previous.take();
    }
}

/// Run `f` with `temporary` installed as the global registry
///
/// The previous registry is restored on the way out, including on
/// unwind, so nested or test runs never observe a half-swapped global.
pub fn with_registry<R>(temporary: Registry, f: impl FnOnce() -> R) -> R {
    let previous = {
        let mut guard = GLOBAL
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.replace(temporary)
    };
    let _restore = RestoreGuard { previous };
    f()
}
