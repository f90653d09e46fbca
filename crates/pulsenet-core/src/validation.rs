//! State comparison and determinism checking.
//!
//! Engines are compared by module name rather than by [`ModuleId`], so two
//! engines built from separately parsed copies of the same text compare
//! cleanly.
//!
//! [`ModuleId`]: crate::id::ModuleId

use crate::engine::{Engine, SimError};
use crate::graph::ModuleGraph;
use crate::id::PushIndex;
use crate::module::ModuleState;

// ---------------------------------------------------------------------------
// State diff types
// ---------------------------------------------------------------------------

/// Difference between two engines at the module level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleDiff {
    /// Module is declared only in engine A.
    OnlyInA(String),
    /// Module is declared only in engine B.
    OnlyInB(String),
    /// Module exists in both but its state differs.
    StateMismatch {
        module: String,
        a: ModuleState,
        b: ModuleState,
    },
}

/// Full state diff between two engines.
#[derive(Debug, Clone)]
pub struct StateDiff {
    pub is_identical: bool,
    pub counters_match: bool,
    pub pushes_match: bool,
    pub module_diffs: Vec<ModuleDiff>,
}

// ---------------------------------------------------------------------------
// Full diff
// ---------------------------------------------------------------------------

/// Compare two engines module by module.
///
/// Conjunction memories are compared by input name, since the two graphs
/// may assign different ids to the same module.
pub fn diff_engines(a: &Engine, b: &Engine) -> StateDiff {
    let mut module_diffs = Vec::new();

    for (id, state_a) in a.states() {
        let name = a.graph().display_name(id);
        match b.state_by_name(name) {
            None => module_diffs.push(ModuleDiff::OnlyInA(name.to_string())),
            Some(state_b) => {
                if !same_state(a.graph(), state_a, b.graph(), state_b) {
                    module_diffs.push(ModuleDiff::StateMismatch {
                        module: name.to_string(),
                        a: state_a.clone(),
                        b: state_b.clone(),
                    });
                }
            }
        }
    }

    for (id, _) in b.states() {
        let name = b.graph().display_name(id);
        if a.state_by_name(name).is_none() {
            module_diffs.push(ModuleDiff::OnlyInB(name.to_string()));
        }
    }

    let counters_match = a.counters() == b.counters();
    let pushes_match = a.pushes() == b.pushes();

    StateDiff {
        is_identical: module_diffs.is_empty() && counters_match && pushes_match,
        counters_match,
        pushes_match,
        module_diffs,
    }
}

fn same_state(ga: &ModuleGraph, a: &ModuleState, gb: &ModuleGraph, b: &ModuleState) -> bool {
    match (a, b) {
        (ModuleState::Relay, ModuleState::Relay) => true,
        (ModuleState::Toggle { on: x }, ModuleState::Toggle { on: y }) => x == y,
        (ModuleState::Conjunction { memory: ma }, ModuleState::Conjunction { memory: mb }) => {
            let mut na: Vec<_> = ma.iter().map(|(&id, &l)| (ga.display_name(id), l)).collect();
            let mut nb: Vec<_> = mb.iter().map(|(&id, &l)| (gb.display_name(id), l)).collect();
            na.sort();
            nb.sort();
            na == nb
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Determinism validation
// ---------------------------------------------------------------------------

/// Result of a determinism validation run.
#[derive(Debug)]
pub struct DeterminismResult {
    /// Whether the two runs produced identical results.
    pub is_deterministic: bool,
    /// Push at which divergence was first detected (if any).
    pub divergence_push: Option<PushIndex>,
    /// Hash log: (push, hash_run1, hash_run2) for each push.
    pub hash_log: Vec<(PushIndex, u64, u64)>,
}

/// Run two independent engines on `graph` for `pushes` pushes and compare
/// their state hashes after every push.
pub fn validate_determinism(
    graph: &ModuleGraph,
    pushes: u64,
) -> Result<DeterminismResult, SimError> {
    let mut engine_a = Engine::new(graph.clone());
    let mut engine_b = Engine::new(graph.clone());

    let mut hash_log = Vec::new();
    let mut divergence_push = None;

    for _ in 0..pushes {
        let report = engine_a.push()?;
        engine_b.push()?;

        let hash_a = engine_a.state_hash();
        let hash_b = engine_b.state_hash();
        hash_log.push((report.push, hash_a, hash_b));

        if hash_a != hash_b && divergence_push.is_none() {
            divergence_push = Some(report.push);
        }
    }

    Ok(DeterminismResult {
        is_deterministic: divergence_push.is_none(),
        divergence_push,
        hash_log,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
