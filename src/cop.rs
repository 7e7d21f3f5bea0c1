//! The cop contract and the per-investigation context cops report through

use crate::ast::{NodeRef, ParsedSource};
use crate::config::CopOptions;
use crate::corrector::Corrector;
use crate::force::ForceSet;
use crate::offense::{Offense, OffenseLocation};
use crate::severity::Severity;
use crate::source::{SourceBuffer, SourceRange};
use std::sync::Arc;

/// One independently-registered analysis rule
///
/// A cop declares the node kinds it wants via [`node_kinds`]; an empty
/// list means the cop receives no per-node callbacks (it may still use
/// the whole-tree [`on_new_investigation`] hook). Callbacks return
/// `anyhow::Result` so a cop's internal failure is an attributable,
/// per-node record instead of aborting the run.
///
/// [`node_kinds`]: Cop::node_kinds
/// [`on_new_investigation`]: Cop::on_new_investigation
pub trait Cop: Send {
    /// Node kinds this cop is interested in
    fn node_kinds(&self) -> &[&'static str] {
        &[]
    }

    /// Called once per tree before the node traversal, with the whole
    /// parsed source; for analyses that need global knowledge
    fn on_new_investigation(
        &mut self,
        _source: &ParsedSource,
        _ctx: &mut CopContext<'_>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called for every node whose kind appears in [`Cop::node_kinds`],
    /// in pre-order
    fn on_node(&mut self, _node: NodeRef<'_>, _ctx: &mut CopContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Cheap pre-check run before traversal; a cop returning false is
    /// skipped entirely for this file
    fn relevant_file(&self, name: &str, options: &CopOptions) -> bool {
        options.matches_file(name)
    }

    /// Names of the shared analyses (forces) this cop reads
    fn force_names(&self) -> &[&'static str] {
        &[]
    }

    /// Whether this cop can produce corrections
    fn supports_autocorrect(&self) -> bool {
        false
    }
}

/// Per-(cop, investigation) sink for offenses and corrections
///
/// Built by the commissioner for each cop before traversal and drained
/// afterwards. The corrector is present only when autocorrection is
/// active for the cop this pass.
pub struct CopContext<'a> {
    buffer: &'a Arc<SourceBuffer>,
    options: CopOptions,
    forces: &'a ForceSet,
    cop_name: String,
    severity: Severity,
    offenses: Vec<Offense>,
    corrector: Option<Corrector>,
}

impl<'a> CopContext<'a> {
    pub fn new(
        buffer: &'a Arc<SourceBuffer>,
        options: CopOptions,
        forces: &'a ForceSet,
        cop_name: impl Into<String>,
        severity: Severity,
        autocorrect: bool,
    ) -> Self {
        let corrector = autocorrect.then(|| Corrector::new(Arc::clone(buffer)));
        Self {
            buffer,
            options,
            forces,
            cop_name: cop_name.into(),
            severity,
            offenses: Vec::new(),
            corrector,
        }
    }

    pub fn buffer(&self) -> &SourceBuffer {
        self.buffer
    }

    pub fn options(&self) -> &CopOptions {
        &self.options
    }

    pub fn cop_name(&self) -> &str {
        &self.cop_name
    }

    /// Record an offense at `range` with the cop's configured severity
    pub fn add_offense(&mut self, range: SourceRange, message: impl Into<String>) {
        self.add_offense_with_severity(range, message, self.severity);
    }

    /// Record an offense with an explicit severity
    pub fn add_offense_with_severity(
        &mut self,
        range: SourceRange,
        message: impl Into<String>,
        severity: Severity,
    ) {
        let location = OffenseLocation::resolve(range, self.buffer);
        self.offenses
            .push(Offense::new(severity, location, message, &self.cop_name));
    }

    /// The cop's corrector, when autocorrection is active this pass
    pub fn corrector(&mut self) -> Option<&mut Corrector> {
        self.corrector.as_mut()
    }

    pub fn autocorrect_active(&self) -> bool {
        self.corrector.is_some()
    }

    /// Typed access to a shared analysis computed for this tree
    pub fn force<T: 'static>(&self, name: &str) -> Option<&T> {
        self.forces.get::<T>(name)
    }

    /// Consume the context, yielding accumulated offenses and the
    /// corrector (if it holds any edits)
    pub fn finish(self) -> (Vec<Offense>, Option<Corrector>) {
        let corrector = self.corrector.filter(|c| !c.is_empty());
        (self.offenses, corrector)
    }
}
