//! The commissioner: one tree walk fanning node callbacks out to cops
//!
//! A single pre-order traversal dispatches each node to every cop and
//! force interested in its kind. A failing callback is recorded against
//! that (cop, node) pair and never aborts the remaining cops or the rest
//! of the tree; hundreds of healthy cops keep reporting even when one is
//! buggy. Strict mode inverts this for debugging: the first failure
//! propagates immediately.

use crate::ast::ParsedSource;
use crate::badge::Badge;
use crate::config::CopOptions;
use crate::cop::{Cop, CopContext};
use crate::corrector::Corrector;
use crate::disable::DisableDirectives;
use crate::force::{ForceFactory, ForceSet};
use crate::offense::Offense;
use crate::severity::Severity;
use thiserror::Error;

/// A cop mobilized for one run: instance plus resolved configuration
pub struct ActiveCop {
    pub badge: Badge,
    pub options: CopOptions,
    pub severity: Severity,
    /// Autocorrection is active for this cop this run (requested,
    /// supported, and not turned off in its options)
    pub autocorrect: bool,
    pub cop: Box<dyn Cop>,
}

impl ActiveCop {
    pub fn name(&self) -> String {
        self.badge.to_string()
    }
}

/// Commissioner knobs
#[derive(Debug, Clone, Copy, Default)]
pub struct CommissionerOptions {
    /// Strict mode: propagate the first cop error instead of recording it
    pub raise_errors: bool,
}

/// A cop callback failure, recorded without aborting the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvestigationError {
    pub cop_name: String,
    pub message: String,
    /// Start position of the node being visited when the cop failed
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for InvestigationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cop {} failed at {}:{}: {}",
            self.cop_name, self.line, self.column, self.message
        )
    }
}

/// Error returned in strict mode when the first cop failure propagates
#[derive(Debug, Error)]
#[error("cop {cop_name} failed at {line}:{column}: {source}")]
pub struct CopRunError {
    pub cop_name: String,
    pub line: usize,
    pub column: usize,
    #[source]
    pub source: anyhow::Error,
}

/// One cop's findings for one investigation
#[derive(Debug)]
pub struct CopReport {
    pub cop_name: String,
    pub offenses: Vec<Offense>,
    /// Edits the cop produced, when autocorrection was active and it
    /// registered at least one
    pub corrector: Option<Corrector>,
}

/// Everything one investigation produced
#[derive(Debug)]
pub struct InvestigationReport {
    /// Per-cop findings, in active-set order
    pub cop_reports: Vec<CopReport>,
    pub errors: Vec<InvestigationError>,
}

impl InvestigationReport {
    /// Flattened offense list in cop-iteration order; callers apply the
    /// global (line, column, cop name) sort themselves
    pub fn offenses(&self) -> Vec<Offense> {
        self.cop_reports
            .iter()
            .flat_map(|report| report.offenses.iter().cloned())
            .collect()
    }

    /// Whether every cop completed without internal errors
    pub fn complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Dispatches one tree to a set of mobilized cops
pub struct Commissioner<'a> {
    cops: &'a mut [ActiveCop],
    force_factories: &'a [ForceFactory],
    options: CommissionerOptions,
}

impl<'a> Commissioner<'a> {
    pub fn new(
        cops: &'a mut [ActiveCop],
        force_factories: &'a [ForceFactory],
        options: CommissionerOptions,
    ) -> Self {
        Self {
            cops,
            force_factories,
            options,
        }
    }

    /// Investigate one parsed source
    ///
    /// In normal mode this never returns `Err`; cop failures are
    /// recorded in the report. In strict mode the first failure aborts.
    pub fn investigate(
        &mut self,
        source: &ParsedSource,
    ) -> Result<InvestigationReport, CopRunError> {
        let directives = DisableDirectives::parse(&source.buffer);

        // Cheap pre-check: cops not relevant to this file get no
        // callbacks at all.
        let relevant: Vec<bool> = self
            .cops
            .iter()
            .map(|active| active.cop.relevant_file(source.buffer.name(), &active.options))
            .collect();

        // Shared analyses, one instance per force name across all
        // subscribing cops.
        let wanted: Vec<&'static str> = self
            .cops
            .iter()
            .zip(&relevant)
            .filter(|(_, &relevant)| relevant)
            .flat_map(|(active, _)| active.cop.force_names().iter().copied())
            .collect();
        let forces = ForceSet::build(self.force_factories, wanted, source);

        let mut contexts: Vec<Option<CopContext<'_>>> = self
            .cops
            .iter()
            .zip(&relevant)
            .map(|(active, &relevant)| {
                relevant.then(|| {
                    CopContext::new(
                        &source.buffer,
                        active.options.clone(),
                        &forces,
                        active.name(),
                        active.severity,
                        active.autocorrect,
                    )
                })
            })
            .collect();

        let mut errors = Vec::new();

        // Whole-tree hooks before the node traversal.
        let root_pos = source
            .tree
            .root()
            .map(|root| root.range().line_col(&source.buffer))
            .unwrap_or((1, 1));
        for (active, ctx) in self.cops.iter_mut().zip(contexts.iter_mut()) {
            let Some(ctx) = ctx else { continue };
            if let Err(error) = active.cop.on_new_investigation(source, ctx) {
                record_or_raise(
                    &mut errors,
                    self.options.raise_errors,
                    active.name(),
                    error,
                    root_pos,
                )?;
            }
        }

        // Single pre-order traversal, parent before children.
        for node in source.tree.preorder() {
            for (active, ctx) in self.cops.iter_mut().zip(contexts.iter_mut()) {
                let Some(ctx) = ctx else { continue };
                if !active.cop.node_kinds().contains(&node.kind()) {
                    continue;
                }
                if let Err(error) = active.cop.on_node(node, ctx) {
                    let position = node.range().line_col(&source.buffer);
                    record_or_raise(
                        &mut errors,
                        self.options.raise_errors,
                        active.name(),
                        error,
                        position,
                    )?;
                }
            }
        }

        let cop_reports = self
            .cops
            .iter()
            .zip(contexts)
            .map(|(active, ctx)| {
                let (mut offenses, mut corrector) = match ctx {
                    Some(ctx) => ctx.finish(),
                    None => (Vec::new(), None),
                };
                let unfiltered = offenses.len();
                offenses.retain(|offense| {
                    !directives.disabled(&offense.cop_name, offense.location.line)
                });
                // Edits cannot be attributed to individual offenses, so a
                // cop whose every offense was suppressed by a directive
                // forfeits its edit set; rewriting a line the user
                // disabled would undercut the directive.
                if offenses.is_empty() && offenses.len() < unfiltered {
                    corrector = None;
                }
                CopReport {
                    cop_name: active.name(),
                    offenses,
                    corrector,
                }
            })
            .collect();

        Ok(InvestigationReport {
            cop_reports,
            errors,
        })
    }
}

fn record_or_raise(
    errors: &mut Vec<InvestigationError>,
    raise: bool,
    cop_name: String,
    error: anyhow::Error,
    (line, column): (usize, usize),
) -> Result<(), CopRunError> {
    if raise {
        return Err(CopRunError {
            cop_name,
            line,
            column,
            source: error,
        });
    }
    log::warn!("cop {cop_name} failed at {line}:{column}: {error:#}");
    errors.push(InvestigationError {
        cop_name,
        message: error.to_string(),
        line,
        column,
    });
    Ok(())
}
