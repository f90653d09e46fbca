//! Module variants and their transition rules.
//!
//! The variant set is closed: [`ModuleKind::Relay`], [`ModuleKind::Toggle`]
//! and [`ModuleKind::Conjunction`]. Each variant's mutable state lives in a
//! [`ModuleState`] entry of the engine's state table. A transition mutates only
//! that entry and returns the emitted level; queueing the emission is the
//! engine's job.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::ModuleId;
use crate::queue::PulseSource;

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// Pulse strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }

    pub fn is_low(self) -> bool {
        self == Level::Low
    }
}

// ---------------------------------------------------------------------------
// Module kind
// ---------------------------------------------------------------------------

/// Behavioral variant of a declared module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    /// Re-emits the received level unchanged. The entry module is the only relay.
    Relay,
    /// Flips on low input, ignores high input.
    Toggle,
    /// Remembers the last level from each input; emits low iff all are high.
    Conjunction,
}

// ---------------------------------------------------------------------------
// Module state
// ---------------------------------------------------------------------------

/// Per-module mutable state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleState {
    Relay,
    Toggle { on: bool },
    Conjunction { memory: BTreeMap<ModuleId, Level> },
}

/// Errors raised by a transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// A conjunction received a pulse from a source that has no memory slot.
    /// Memories are fully populated at graph build time, so this means the
    /// state table and the graph disagree.
    #[error("conjunction has no memory slot for input {0:?}")]
    UnknownInput(PulseSource),
}

impl ModuleState {
    /// Initial state for a module of `kind` fed by `inputs`.
    ///
    /// Toggles start off. Conjunctions remember low for every input.
    pub fn initial(kind: ModuleKind, inputs: &[ModuleId]) -> Self {
        match kind {
            ModuleKind::Relay => ModuleState::Relay,
            ModuleKind::Toggle => ModuleState::Toggle { on: false },
            ModuleKind::Conjunction => ModuleState::Conjunction {
                memory: inputs.iter().map(|&input| (input, Level::Low)).collect(),
            },
        }
    }

    pub fn kind(&self) -> ModuleKind {
        match self {
            ModuleState::Relay => ModuleKind::Relay,
            ModuleState::Toggle { .. } => ModuleKind::Toggle,
            ModuleState::Conjunction { .. } => ModuleKind::Conjunction,
        }
    }

    /// Apply an incoming pulse. Returns the level to send to every destination,
    /// or `None` when the pulse is absorbed.
    pub fn transition(
        &mut self,
        level: Level,
        source: PulseSource,
    ) -> Result<Option<Level>, TransitionError> {
        match self {
            ModuleState::Relay => Ok(Some(level)),
            ModuleState::Toggle { on } => {
                if level.is_high() {
                    return Ok(None);
                }
                *on = !*on;
                Ok(Some(if *on { Level::High } else { Level::Low }))
            }
            ModuleState::Conjunction { memory } => {
                let slot = match source {
                    PulseSource::Module(id) => memory.get_mut(&id),
                    PulseSource::Button => None,
                };
                let slot = slot.ok_or(TransitionError::UnknownInput(source))?;
                *slot = level;
                Ok(Some(conjunction_output(memory)))
            }
        }
    }

    /// Whether a toggle is on. `None` for other kinds.
    pub fn is_on(&self) -> Option<bool> {
        match self {
            ModuleState::Toggle { on } => Some(*on),
            _ => None,
        }
    }

    /// Remembered level for `input`. `None` for non-conjunctions and unknown inputs.
    pub fn remembered(&self, input: ModuleId) -> Option<Level> {
        match self {
            ModuleState::Conjunction { memory } => memory.get(&input).copied(),
            _ => None,
        }
    }
}

/// Evaluate a conjunction memory: low iff non-empty and all high.
pub fn conjunction_output(memory: &BTreeMap<ModuleId, Level>) -> Level {
    if !memory.is_empty() && memory.values().all(|level| level.is_high()) {
        Level::Low
    } else {
        Level::High
    }
}

// ===========================================================================
// Tests
// ===========================================================================
