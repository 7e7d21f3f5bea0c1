//! Forces: shared cross-cutting analyses computed once per tree
//!
//! Several cops often need the same expensive derived facts (variable
//! usage being the classic case). Instead of each cop re-walking the
//! tree, cops declare the force names they read; the commissioner builds
//! each named force once per tree and hands the results to every
//! subscriber by reference.

use crate::ast::ParsedSource;
use std::any::Any;
use std::collections::BTreeMap;

/// A shared analysis run once per tree before cop traversal
pub trait Force: Send {
    /// Stable name cops subscribe with
    fn name(&self) -> &'static str;

    /// Compute this force's facts for the given tree
    fn investigate(&mut self, source: &ParsedSource);

    /// Downcast support for typed retrieval through [`ForceSet::get`]
    fn as_any(&self) -> &dyn Any;
}

/// Factory for constructing a force by name
#[derive(Clone, Copy)]
pub struct ForceFactory {
    pub name: &'static str,
    pub build: fn() -> Box<dyn Force>,
}

/// The computed forces for one tree, keyed by name
///
/// Cops sharing a force name share one instance; each force is
/// constructed and run at most once per tree.
pub struct ForceSet {
    forces: Vec<Box<dyn Force>>,
}

impl ForceSet {
    pub fn empty() -> Self {
        Self { forces: Vec::new() }
    }

    /// Build and run the forces named in `wanted`, using `factories`
    ///
    /// Duplicate names collapse to a single instance. Names with no
    /// matching factory are skipped; the subscribing cop simply sees no
    /// facts for them.
    pub fn build(
        factories: &[ForceFactory],
        wanted: impl IntoIterator<Item = &'static str>,
        source: &ParsedSource,
    ) -> Self {
        let mut seen = std::collections::HashSet::new();
        let mut forces: Vec<Box<dyn Force>> = Vec::new();
        for name in wanted {
            if !seen.insert(name) {
                continue;
            }
            if let Some(factory) = factories.iter().find(|f| f.name == name) {
                let mut force = (factory.build)();
                force.investigate(source);
                forces.push(force);
            }
        }
        Self { forces }
    }

    pub fn get<T: 'static>(&self, name: &str) -> Option<&T> {
        self.forces
            .iter()
            .find(|f| f.name() == name)
            .and_then(|f| f.as_any().downcast_ref::<T>())
    }

    pub fn len(&self) -> usize {
        self.forces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }
}

/// Tracks local-variable definitions and reads across one tree
///
/// Definitions are `lvasgn` nodes, reads are `lvar` nodes; both are
/// named by the source text they cover.
#[derive(Debug, Default)]
pub struct VariableForce {
    definitions: BTreeMap<String, usize>,
    reads: BTreeMap<String, usize>,
}

impl VariableForce {
    pub const NAME: &'static str = "variables";

    pub fn factory() -> ForceFactory {
        ForceFactory {
            name: Self::NAME,
            build: || Box::<VariableForce>::default(),
        }
    }

    /// Times `name` was assigned
    pub fn definition_count(&self, name: &str) -> usize {
        self.definitions.get(name).copied().unwrap_or(0)
    }

    /// Times `name` was read
    pub fn read_count(&self, name: &str) -> usize {
        self.reads.get(name).copied().unwrap_or(0)
    }

    /// Variables assigned but never read, in name order
    pub fn unused(&self) -> Vec<&str> {
        self.definitions
            .keys()
            .filter(|name| !self.reads.contains_key(name.as_str()))
            .map(String::as_str)
            .collect()
    }
}

impl Force for VariableForce {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn investigate(&mut self, source: &ParsedSource) {
        for node in source.tree.preorder() {
            let entry = match node.kind() {
                "lvasgn" => &mut self.definitions,
                "lvar" => &mut self.reads,
                _ => continue,
            };
            let name = node.source(&source.buffer).to_string();
            *entry.entry(name).or_insert(0) += 1;
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Tree;
    use crate::source::SourceBuffer;
    use pretty_assertions::assert_eq;

    fn variable_source() -> ParsedSource {
        // "a" assigned and read, "b" assigned only
        let buffer = SourceBuffer::new("test.rb", "a b a");
        let mut tree = Tree::new();
        let root = tree.add_node("root", buffer.whole_range(), None);
        tree.add_node("lvasgn", buffer.range(0, 1), Some(root));
        tree.add_node("lvasgn", buffer.range(2, 3), Some(root));
        tree.add_node("lvar", buffer.range(4, 5), Some(root));
        ParsedSource::new(buffer, tree)
    }

    #[test]
    fn test_variable_force_counts() {
        let source = variable_source();
        let mut force = VariableForce::default();
        force.investigate(&source);

        assert_eq!(force.definition_count("a"), 1);
        assert_eq!(force.definition_count("b"), 1);
        assert_eq!(force.read_count("a"), 1);
        assert_eq!(force.read_count("b"), 0);
        assert_eq!(force.unused(), vec!["b"]);
    }

    #[test]
    fn test_force_set_shares_one_instance_per_name() {
        let source = variable_source();
        // Two cops subscribing to the same force collapse to one build
        let set = ForceSet::build(
            &[VariableForce::factory()],
            [VariableForce::NAME, VariableForce::NAME],
            &source,
        );
        assert_eq!(set.len(), 1);
        let force = set.get::<VariableForce>(VariableForce::NAME).unwrap();
        assert_eq!(force.unused(), vec!["b"]);
    }

    #[test]
    fn test_force_set_unknown_name_skipped() {
        let source = variable_source();
        let set = ForceSet::build(&[VariableForce::factory()], ["no-such-force"], &source);
        assert!(set.is_empty());
        assert!(set.get::<VariableForce>("no-such-force").is_none());
    }
}
