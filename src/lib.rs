//! Precinct - Rule Dispatch and Autocorrection Core
//!
//! A linting core that runs a set of cops (rules) over a parsed source
//! file in a single tree traversal, collects offenses, and applies
//! source corrections through a conflict-checked corrector.
//!
//! # Architecture
//!
//! ```text
//! Parser -> Team -> Commissioner -> Cops -> Offenses/Corrections
//! ```
//!
//! Parsing is external: callers implement [`ast::Parser`] and hand the
//! team a [`ast::ParsedSource`]. The team mobilizes cops from a
//! [`registry::Registry`] under a [`config::Config`], the commissioner
//! dispatches each node to the cops interested in its kind, and the
//! correction loop re-parses and re-runs until the source stops
//! changing.
//!
//! # Writing a Cop
//!
//! Implement [`cop::Cop`], declare the node kinds you care about, and
//! report through the context:
//!
//! ```
//! use precinct::ast::NodeRef;
//! use precinct::cop::{Cop, CopContext};
//!
//! struct NoPlaceholder;
//!
//! impl Cop for NoPlaceholder {
//!     fn node_kinds(&self) -> &[&'static str] {
//!         &["ident"]
//!     }
//!
//!     fn on_node(&mut self, node: NodeRef<'_>, ctx: &mut CopContext<'_>) -> anyhow::Result<()> {
//!         if node.source(ctx.buffer()) == "TODO" {
//!             ctx.add_offense(node.range(), "placeholder identifier");
//!         }
//!         Ok(())
//!     }
//! }
//! ```

pub mod ast;
pub mod badge;
pub mod commissioner;
pub mod config;
pub mod cop;
pub mod corrector;
pub mod disable;
pub mod force;
pub mod offense;
pub mod registry;
pub mod severity;
pub mod source;
pub mod team;

// Re-export main types
pub use ast::{NodeId, NodeRef, ParseError, ParsedSource, Parser, Tree};
pub use badge::Badge;
pub use commissioner::{
    ActiveCop, Commissioner, CommissionerOptions, CopReport, CopRunError, InvestigationError,
    InvestigationReport,
};
pub use config::{Config, ConfigError, CopOptions};
pub use cop::{Cop, CopContext};
pub use corrector::{CorrectError, Corrector, Edit};
pub use disable::DisableDirectives;
pub use force::{Force, ForceFactory, ForceSet, VariableForce};
pub use offense::{CorrectionStatus, Offense, OffenseLocation};
pub use registry::{CopRegistration, Registry, RegistryError, Stability};
pub use severity::{Severity, UnknownSeverity};
pub use source::{BufferId, SourceBuffer, SourceRange};
pub use team::{Team, TeamError, TeamOptions, TeamReport, DEFAULT_MAX_ITERATIONS};
