//! The module graph: declared modules, their ordered destinations, and the
//! reverse edges used to initialize conjunction memories.
//!
//! Graphs are built in two phases through [`GraphBuilder`]. Phase one declares
//! modules in any order; destinations may name modules that are declared later
//! or never. Phase two ([`GraphBuilder::build`]) locates the single entry relay
//! and runs a one-time reverse-edge scan. The resulting [`ModuleGraph`] is
//! frozen: no rewiring after build.

use std::collections::HashMap;

use slotmap::{SecondaryMap, SlotMap};

use crate::id::ModuleId;
use crate::module::{ModuleKind, ModuleState};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while building or querying a graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("module '{0}' is declared more than once")]
    DuplicateModule(String),
    #[error("graph has no relay module to act as the entry point")]
    NoEntry,
    #[error("graph has more than one relay module: '{first}' and '{second}'")]
    MultipleEntries { first: String, second: String },
}

// ---------------------------------------------------------------------------
// Module definition
// ---------------------------------------------------------------------------

/// Static definition of a declared module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDef {
    pub kind: ModuleKind,
    /// Destinations in declared order. Duplicates are kept.
    pub destinations: Vec<ModuleId>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects module declarations, then freezes them into a [`ModuleGraph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    names: SlotMap<ModuleId, String>,
    by_name: HashMap<String, ModuleId>,
    modules: SecondaryMap<ModuleId, ModuleDef>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, allocating one on first mention.
    pub fn intern(&mut self, name: &str) -> ModuleId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = self.names.insert(name.to_string());
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Phase 1: declare a module with its ordered destinations.
    pub fn declare<I, S>(
        &mut self,
        name: &str,
        kind: ModuleKind,
        destinations: I,
    ) -> Result<ModuleId, GraphError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let id = self.intern(name);
        if self.modules.contains_key(id) {
            return Err(GraphError::DuplicateModule(name.to_string()));
        }
        let destinations: Vec<ModuleId> = destinations
            .into_iter()
            .map(|d| self.intern(d.as_ref()))
            .collect();
        self.modules.insert(id, ModuleDef { kind, destinations });
        Ok(id)
    }

    /// Phase 2: locate the entry relay, compute reverse edges, and freeze.
    pub fn build(self) -> Result<ModuleGraph, GraphError> {
        let mut entry: Option<ModuleId> = None;
        for (id, def) in &self.modules {
            if def.kind != ModuleKind::Relay {
                continue;
            }
            if let Some(first) = entry {
                return Err(GraphError::MultipleEntries {
                    first: self.names[first].clone(),
                    second: self.names[id].clone(),
                });
            }
            entry = Some(id);
        }
        let entry = entry.ok_or(GraphError::NoEntry)?;

        // Reverse-edge scan, in declaration-slot order for determinism.
        let mut inputs: SecondaryMap<ModuleId, Vec<ModuleId>> = SecondaryMap::new();
        for id in self.names.keys() {
            inputs.insert(id, Vec::new());
        }
        for (id, def) in &self.modules {
            for &dest in &def.destinations {
                if let Some(list) = inputs.get_mut(dest) {
                    if !list.contains(&id) {
                        list.push(id);
                    }
                }
            }
        }

        tracing::debug!(
            modules = self.modules.len(),
            names = self.names.len(),
            entry = %self.names[entry],
            "module graph built"
        );

        Ok(ModuleGraph {
            names: self.names,
            by_name: self.by_name,
            modules: self.modules,
            inputs,
            entry,
        })
    }
}

// ---------------------------------------------------------------------------
// Frozen graph
// ---------------------------------------------------------------------------

/// Frozen module topology.
///
/// Every mentioned name has a [`ModuleId`]. Names without a declaration are
/// sinks: pulses addressed to them are counted but cause no transition.
#[derive(Debug, Clone)]
pub struct ModuleGraph {
    names: SlotMap<ModuleId, String>,
    by_name: HashMap<String, ModuleId>,
    modules: SecondaryMap<ModuleId, ModuleDef>,
    /// Distinct modules with a static edge into each id, in scan order.
    inputs: SecondaryMap<ModuleId, Vec<ModuleId>>,
    entry: ModuleId,
}

impl ModuleGraph {
    /// The single relay that receives the button pulse.
    pub fn entry(&self) -> ModuleId {
        self.entry
    }

    pub fn id(&self, name: &str) -> Option<ModuleId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: ModuleId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Name for diagnostics; ids from another graph render as `<unknown>`.
    pub fn display_name(&self, id: ModuleId) -> &str {
        self.name(id).unwrap_or("<unknown>")
    }

    /// Definition of a declared module. `None` for sinks.
    pub fn module(&self, id: ModuleId) -> Option<&ModuleDef> {
        self.modules.get(id)
    }

    pub fn kind(&self, id: ModuleId) -> Option<ModuleKind> {
        self.module(id).map(|def| def.kind)
    }

    pub fn destinations(&self, id: ModuleId) -> &[ModuleId] {
        self.modules
            .get(id)
            .map(|def| def.destinations.as_slice())
            .unwrap_or(&[])
    }

    /// Distinct modules with an edge into `id`.
    pub fn inputs(&self, id: ModuleId) -> &[ModuleId] {
        self.inputs.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_sink(&self, id: ModuleId) -> bool {
        self.names.contains_key(id) && !self.modules.contains_key(id)
    }

    /// Declared modules in declaration-slot order.
    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &ModuleDef)> {
        self.modules.iter()
    }

    /// All ids, declared and sink, with their names.
    pub fn names(&self) -> impl Iterator<Item = (ModuleId, &str)> {
        self.names.iter().map(|(id, name)| (id, name.as_str()))
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    /// Initial state for a declared module.
    pub fn initial_state(&self, id: ModuleId) -> Option<ModuleState> {
        self.module(id)
            .map(|def| ModuleState::initial(def.kind, self.inputs(id)))
    }

    /// A fresh state table covering every declared module.
    pub fn initial_states(&self) -> SecondaryMap<ModuleId, ModuleState> {
        self.modules
            .keys()
            .filter_map(|id| self.initial_state(id).map(|state| (id, state)))
            .collect()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Level;

    fn example_builder() -> GraphBuilder {
        let mut b = GraphBuilder::new();
        b.declare("broadcaster", ModuleKind::Relay, ["a"]).unwrap();
        b.declare("a", ModuleKind::Toggle, ["inv", "con"]).unwrap();
        b.declare("inv", ModuleKind::Conjunction, ["b"]).unwrap();
        b.declare("b", ModuleKind::Toggle, ["con"]).unwrap();
        b.declare("con", ModuleKind::Conjunction, ["output"]).unwrap();
        b
    }

    #[test]
    fn build_finds_entry_relay() {
        let graph = example_builder().build().unwrap();
        assert_eq!(graph.name(graph.entry()), Some("broadcaster"));
        assert_eq!(graph.module_count(), 5);
        assert_eq!(graph.name_count(), 6);
    }

    #[test]
    fn undeclared_destination_is_a_sink() {
        let graph = example_builder().build().unwrap();
        let output = graph.id("output").unwrap();
        assert!(graph.is_sink(output));
        assert!(graph.module(output).is_none());
        assert!(graph.destinations(output).is_empty());
        assert!(graph.initial_state(output).is_none());
        assert!(!graph.is_sink(graph.entry()));
    }

    #[test]
    fn reverse_edges_cover_all_inputs() {
        let graph = example_builder().build().unwrap();
        let a = graph.id("a").unwrap();
        let b = graph.id("b").unwrap();
        let con = graph.id("con").unwrap();
        assert_eq!(graph.inputs(con), &[a, b]);
        assert_eq!(graph.inputs(a), &[graph.entry()]);
    }

    #[test]
    fn conjunction_memory_initialized_low_for_every_input() {
        let graph = example_builder().build().unwrap();
        let con = graph.id("con").unwrap();
        let state = graph.initial_state(con).unwrap();
        for &input in graph.inputs(con) {
            assert_eq!(state.remembered(input), Some(Level::Low));
        }
        let states = graph.initial_states();
        assert_eq!(states.len(), graph.module_count());
    }

    #[test]
    fn duplicate_edges_yield_one_memory_slot() {
        let mut b = GraphBuilder::new();
        b.declare("broadcaster", ModuleKind::Relay, ["x", "x"]).unwrap();
        b.declare("x", ModuleKind::Conjunction, ["y"]).unwrap();
        let graph = b.build().unwrap();
        let x = graph.id("x").unwrap();
        assert_eq!(graph.inputs(x).len(), 1);
        assert_eq!(graph.destinations(graph.entry()).len(), 2);
    }

    #[test]
    fn forward_references_resolve() {
        let mut b = GraphBuilder::new();
        b.declare("inv", ModuleKind::Conjunction, ["a"]).unwrap();
        b.declare("a", ModuleKind::Toggle, ["inv"]).unwrap();
        b.declare("start", ModuleKind::Relay, ["a"]).unwrap();
        let graph = b.build().unwrap();
        let a = graph.id("a").unwrap();
        let inv = graph.id("inv").unwrap();
        assert_eq!(graph.destinations(inv), &[a]);
        assert_eq!(graph.inputs(a).len(), 2);
    }

    #[test]
    fn duplicate_declaration_rejected() {
        let mut b = GraphBuilder::new();
        b.declare("a", ModuleKind::Toggle, ["b"]).unwrap();
        let err = b.declare("a", ModuleKind::Conjunction, ["c"]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateModule("a".into()));
    }

    #[test]
    fn missing_entry_rejected() {
        let mut b = GraphBuilder::new();
        b.declare("a", ModuleKind::Toggle, ["b"]).unwrap();
        assert_eq!(b.build().unwrap_err(), GraphError::NoEntry);
    }

    #[test]
    fn second_relay_rejected() {
        let mut b = GraphBuilder::new();
        b.declare("one", ModuleKind::Relay, ["a"]).unwrap();
        b.declare("two", ModuleKind::Relay, ["a"]).unwrap();
        assert_eq!(
            b.build().unwrap_err(),
            GraphError::MultipleEntries {
                first: "one".into(),
                second: "two".into()
            }
        );
    }
}
