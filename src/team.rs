//! The team: cops mobilized against one file, with the correction loop
//!
//! Autocorrection re-runs the whole investigation after applying each
//! pass's merged edits, because any edit can invalidate every other
//! cop's byte offsets. The loop ends at a fixed point (a pass that
//! produces no edits, or edits whose rewrite equals the input) or at the
//! iteration ceiling, which guards against cop pairs whose corrections
//! undo each other forever.

use crate::ast::{ParseError, ParsedSource, Parser};
use crate::commissioner::{
    ActiveCop, Commissioner, CommissionerOptions, CopRunError, InvestigationError,
    InvestigationReport,
};
use crate::config::Config;
use crate::corrector::Corrector;
use crate::disable::{directive_comment, directive_insertion_point};
use crate::force::ForceFactory;
use crate::offense::{CorrectionStatus, Offense};
use crate::registry::Registry;
use crate::severity::Severity;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Correction passes allowed before the loop is declared non-converging
pub const DEFAULT_MAX_ITERATIONS: usize = 200;

/// Team knobs
#[derive(Debug, Clone)]
pub struct TeamOptions {
    /// Apply corrections (cops still need per-cop support and config)
    pub autocorrect: bool,
    /// Strict mode: the first cop failure aborts the run
    pub raise_errors: bool,
    /// Skip cops whose config marks them unsafe
    pub safe_only: bool,
    /// Append inline disable comments for offenses no cop can correct
    pub disable_uncorrectable: bool,
    pub max_iterations: usize,
    /// Non-empty: run exactly these qualified cop names
    pub only: Vec<String>,
}

impl Default for TeamOptions {
    fn default() -> Self {
        Self {
            autocorrect: false,
            raise_errors: false,
            safe_only: false,
            disable_uncorrectable: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            only: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TeamError {
    #[error(transparent)]
    Cop(#[from] CopRunError),

    #[error("re-parse after correction failed: {0}")]
    Reparse(#[from] ParseError),
}

/// Outcome of a team run
#[derive(Debug)]
pub struct TeamReport {
    /// All offenses, sorted by (line, column, cop name); deduplicated
    /// across correction passes
    pub offenses: Vec<Offense>,
    pub errors: Vec<InvestigationError>,
    /// Source text after corrections (the input text when none applied)
    pub output: String,
    pub corrected: bool,
    /// Investigation passes performed
    pub passes: usize,
}

impl TeamReport {
    pub fn complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A set of mobilized cops plus the forces they share
pub struct Team {
    cops: Vec<ActiveCop>,
    force_factories: Vec<ForceFactory>,
    options: TeamOptions,
}

impl Team {
    pub fn new(
        cops: Vec<ActiveCop>,
        force_factories: Vec<ForceFactory>,
        options: TeamOptions,
    ) -> Self {
        Self {
            cops,
            force_factories,
            options,
        }
    }

    /// Build a team from every cop `registry` enables under `config`
    ///
    /// Per-cop autocorrection requires the team option, the cop's own
    /// support, and the cop's config all agreeing.
    pub fn mobilize(
        registry: &Registry,
        config: &Config,
        force_factories: Vec<ForceFactory>,
        options: TeamOptions,
    ) -> Self {
        let cops = registry
            .enabled(config, &options.only, options.safe_only)
            .into_iter()
            .map(|registration| {
                let name = registration.qualified_name();
                let cop_options = config.cop(&name);
                let cop = (registration.factory)();
                let autocorrect =
                    options.autocorrect && cop.supports_autocorrect() && cop_options.autocorrect;
                let severity = config.severity_for(&name, Severity::default());
                ActiveCop {
                    badge: registration.badge.clone(),
                    options: cop_options,
                    severity,
                    autocorrect,
                    cop,
                }
            })
            .collect();
        Self::new(cops, force_factories, options)
    }

    pub fn cop_names(&self) -> Vec<String> {
        self.cops.iter().map(|active| active.name()).collect()
    }

    /// One investigation pass, applying merged corrections at most once
    ///
    /// No re-parse happens; offsets in the reported offenses refer to
    /// the input text even when `output` differs.
    pub fn inspect(&mut self, source: &ParsedSource) -> Result<TeamReport, TeamError> {
        let report = self.investigate(source)?;
        let mut offenses = Vec::new();
        let errors = report.errors.clone();
        let pass = self.merge_pass(source, report, &mut offenses);
        let corrected = !pass.is_empty();
        let output = if corrected {
            pass.rewrite()
        } else {
            source.buffer.source().to_string()
        };
        offenses.sort();
        Ok(TeamReport {
            offenses,
            errors,
            output,
            corrected,
            passes: 1,
        })
    }

    /// Investigate, correct, re-parse, repeat until a fixed point
    pub fn inspect_with_correction(
        &mut self,
        source: ParsedSource,
        parser: &dyn Parser,
    ) -> Result<TeamReport, TeamError> {
        let name = source.buffer.name().to_string();
        let mut current = source;
        let mut all_offenses: Vec<Offense> = Vec::new();
        let mut errors = Vec::new();
        let mut corrected = false;
        let mut passes = 0;
        let output;

        loop {
            passes += 1;
            let report = self.investigate(&current)?;
            errors.extend(report.errors.iter().cloned());

            let mut pass_offenses = Vec::new();
            let pass = self.merge_pass(&current, report, &mut pass_offenses);
            accumulate(&mut all_offenses, pass_offenses);

            if pass.is_empty() {
                output = current.buffer.source().to_string();
                break;
            }
            let rewritten = pass.rewrite();
            if rewritten == current.buffer.source() {
                output = rewritten;
                break;
            }
            corrected = true;

            if passes >= self.options.max_iterations {
                log::warn!(
                    "correction of {name} did not converge after {passes} passes; keeping the last rewrite"
                );
                output = rewritten;
                break;
            }
            current = parser.parse(&rewritten, &name)?;
        }

        all_offenses.sort();
        Ok(TeamReport {
            offenses: all_offenses,
            errors,
            output,
            corrected,
            passes,
        })
    }

    fn investigate(
        &mut self,
        source: &ParsedSource,
    ) -> Result<InvestigationReport, CopRunError> {
        let commissioner_options = CommissionerOptions {
            raise_errors: self.options.raise_errors,
        };
        let mut commissioner =
            Commissioner::new(&mut self.cops, &self.force_factories, commissioner_options);
        commissioner.investigate(source)
    }

    /// Merge each cop's edits into one pass corrector, all-or-nothing
    /// per cop, and stamp correction statuses onto the offenses
    fn merge_pass(
        &self,
        source: &ParsedSource,
        report: InvestigationReport,
        offenses: &mut Vec<Offense>,
    ) -> Corrector {
        let mut pass = Corrector::new(Arc::clone(&source.buffer));
        for cop_report in report.cop_reports {
            let status = match &cop_report.corrector {
                Some(corrector) => match pass.merge(corrector) {
                    Ok(()) => CorrectionStatus::Corrected,
                    Err(error) => {
                        log::warn!(
                            "edits from {} conflict with an earlier cop; dropped ({error})",
                            cop_report.cop_name
                        );
                        CorrectionStatus::Uncorrected
                    }
                },
                None => CorrectionStatus::Unsupported,
            };
            for offense in cop_report.offenses {
                offenses.push(offense.with_status(status));
            }
        }
        if self.options.autocorrect && self.options.disable_uncorrectable {
            self.disable_uncorrectable(source, offenses, &mut pass);
        }
        pass
    }

    /// Append inline disable comments for offenses nothing corrected
    fn disable_uncorrectable(
        &self,
        source: &ParsedSource,
        offenses: &mut [Offense],
        pass: &mut Corrector,
    ) {
        let mut inserted: HashSet<(String, usize)> = HashSet::new();
        for offense in offenses {
            if offense.status != CorrectionStatus::Unsupported {
                continue;
            }
            let line = offense.location.line;
            let key = (offense.cop_name.clone(), line);
            if inserted.contains(&key) {
                offense.status = CorrectionStatus::Corrected;
                continue;
            }
            let Some(point) = directive_insertion_point(&source.buffer, line) else {
                continue;
            };
            match pass.insert_before(point, &directive_comment(&offense.cop_name)) {
                Ok(()) => {
                    inserted.insert(key);
                    offense.status = CorrectionStatus::Corrected;
                }
                Err(error) => {
                    log::warn!(
                        "could not insert disable comment for {} on line {line}: {error}",
                        offense.cop_name
                    );
                }
            }
        }
    }
}

/// Fold one pass's offenses into the cross-pass accumulator
///
/// Offenses repeat across passes when a correction does not remove
/// them; identity is (line, column, cop name, message). A repeat only
/// ever upgrades the recorded status to `Corrected`.
fn accumulate(all: &mut Vec<Offense>, pass: Vec<Offense>) {
    for offense in pass {
        let existing = all.iter_mut().find(|o| {
            o.location.line == offense.location.line
                && o.location.column == offense.location.column
                && o.cop_name == offense.cop_name
                && o.message == offense.message
        });
        match existing {
            Some(existing) => {
                if offense.status == CorrectionStatus::Corrected {
                    existing.status = CorrectionStatus::Corrected;
                }
            }
            None => all.push(offense),
        }
    }
}
