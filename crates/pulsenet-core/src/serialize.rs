//! Versioned binary snapshots of engine state via `bitcode`.
//!
//! A snapshot holds the mutable part of an [`Engine`]: push count, counters,
//! and the state table. The graph itself is not stored; a snapshot is restored
//! against a graph with the same module names in the same declaration order,
//! which is checked on load.

use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;

use crate::counters::PulseCounters;
use crate::engine::Engine;
use crate::graph::ModuleGraph;
use crate::id::{ModuleId, PushIndex};
use crate::module::ModuleState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a pulsenet engine snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x5055_4C01;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("snapshot is empty")]
    TooShort,
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("snapshot was taken from a different graph: {0}")]
    GraphMismatch(String),
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Completed pushes at the time of the snapshot.
    pub pushes: PushIndex,
}

impl SnapshotHeader {
    pub fn new(pushes: PushIndex) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            pushes,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version != FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EngineSnapshot {
    header: SnapshotHeader,
    /// Every graph name in slot order, used to check the restore target.
    names: Vec<String>,
    counters: PulseCounters,
    states: SecondaryMap<ModuleId, ModuleState>,
}

impl Engine {
    /// Serialize the mutable engine state.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = EngineSnapshot {
            header: SnapshotHeader::new(self.pushes),
            names: self.graph().names().map(|(_, n)| n.to_string()).collect(),
            counters: self.counters,
            states: self.states.clone(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Rebuild an engine from `graph` and a snapshot taken on an equivalent graph.
    pub fn restore(graph: ModuleGraph, data: &[u8]) -> Result<Engine, DeserializeError> {
        if data.is_empty() {
            return Err(DeserializeError::TooShort);
        }
        let snapshot: EngineSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;

        if graph.name_count() != snapshot.names.len()
            || graph
                .names()
                .zip(&snapshot.names)
                .any(|((_, a), b)| a != b.as_str())
        {
            return Err(DeserializeError::GraphMismatch(format!(
                "{} names in snapshot, {} in graph",
                snapshot.names.len(),
                graph.name_count()
            )));
        }
        for (id, def) in graph.modules() {
            let state = match snapshot.states.get(id) {
                Some(state) if state.kind() == def.kind => state,
                _ => {
                    return Err(DeserializeError::GraphMismatch(format!(
                        "state for '{}' is missing or of the wrong kind",
                        graph.display_name(id)
                    )));
                }
            };
            // Conjunction memories must cover exactly the graph's inputs.
            if let ModuleState::Conjunction { memory } = state {
                let mut inputs = graph.inputs(id).to_vec();
                inputs.sort();
                if !memory.keys().copied().eq(inputs) {
                    return Err(DeserializeError::GraphMismatch(format!(
                        "remembered inputs of '{}' differ from its graph inputs",
                        graph.display_name(id)
                    )));
                }
            }
        }

        let mut engine = Engine::new(graph);
        engine.states = snapshot.states;
        engine.counters = snapshot.counters;
        engine.pushes = snapshot.header.pushes;
        Ok(engine)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn header_validation() {
        assert!(SnapshotHeader::new(3).validate().is_ok());
        let mut bad = SnapshotHeader::new(3);
        bad.magic = 0;
        assert!(matches!(bad.validate(), Err(DeserializeError::InvalidMagic(0))));
        let mut future = SnapshotHeader::new(3);
        future.version = FORMAT_VERSION + 1;
        assert!(matches!(
            future.validate(),
            Err(DeserializeError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn restore_reproduces_state_and_future() {
        let mut original = Engine::new(scenario_b());
        original.run(7).unwrap();
        let data = original.serialize().unwrap();

        let mut restored = Engine::restore(scenario_b(), &data).unwrap();
        assert_eq!(restored.pushes(), 7);
        assert_eq!(restored.counters(), original.counters());
        assert_eq!(restored.state_hash(), original.state_hash());

        original.run(13).unwrap();
        restored.run(13).unwrap();
        assert_eq!(restored.state_hash(), original.state_hash());
    }

    #[test]
    fn restore_rejects_other_graph() {
        let engine = Engine::new(scenario_a());
        let data = engine.serialize().unwrap();
        let err = Engine::restore(scenario_b(), &data).unwrap_err();
        assert!(matches!(err, DeserializeError::GraphMismatch(_)));
    }

    #[test]
    fn restore_rejects_conjunction_with_different_inputs() {
        use crate::graph::GraphBuilder;
        use crate::module::ModuleKind;

        // Same names in the same order, but `con` gains the relay as an input.
        let mut b = GraphBuilder::new();
        b.declare("broadcaster", ModuleKind::Relay, ["a"]).unwrap();
        b.declare("a", ModuleKind::Toggle, ["con"]).unwrap();
        b.declare("con", ModuleKind::Conjunction, ["out"]).unwrap();
        let narrow = b.build().unwrap();

        let mut b = GraphBuilder::new();
        b.declare("broadcaster", ModuleKind::Relay, ["a", "con"]).unwrap();
        b.declare("a", ModuleKind::Toggle, ["con"]).unwrap();
        b.declare("con", ModuleKind::Conjunction, ["out"]).unwrap();
        let wide = b.build().unwrap();

        let data = Engine::new(narrow).serialize().unwrap();
        let err = Engine::restore(wide, &data).unwrap_err();
        assert!(matches!(err, DeserializeError::GraphMismatch(_)));
    }

    #[test]
    fn restore_rejects_empty() {
        let err = Engine::restore(scenario_a(), &[]).unwrap_err();
        assert!(matches!(err, DeserializeError::TooShort));
    }

    #[test]
    fn restore_rejects_garbage() {
        let err = Engine::restore(scenario_a(), &[0xFF, 0xFF, 0xFF]).unwrap_err();
        assert!(matches!(err, DeserializeError::Decode(_)));
    }
}
