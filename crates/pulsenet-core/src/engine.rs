//! The simulation engine: owns the state table and the pulse queue, and
//! drives pushes to completion.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - A frozen [`ModuleGraph`]
//! - The state table: one [`ModuleState`] per declared module, keyed by
//!   [`ModuleId`]
//! - A [`PulseQueue`], empty between pushes
//! - Running [`PulseCounters`] and the push counter
//!
//! # Push Pipeline
//!
//! Each `push()` runs:
//! 1. **Inject** -- queue a low pulse from the button to the entry relay
//! 2. **Drain** -- pop, count, report `Delivered`, transition the target
//! 3. **Emit** -- report `Emitted`, queue one pulse per destination
//! 4. **Settle** -- return once the queue is empty

use slotmap::SecondaryMap;

use crate::counters::{PulseCounters, PushReport};
use crate::graph::ModuleGraph;
use crate::id::{ModuleId, PushIndex};
use crate::module::{Level, ModuleState, TransitionError};
use crate::observer::{PulseEvent, PulseObserver};
use crate::queue::{Pulse, PulseQueue, PulseSource};
use crate::sim::StateHash;

/// Number of pushes run by counting mode.
pub const COUNTING_PUSHES: u64 = 1000;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while draining a push. Both indicate that the state table
/// and the graph disagree, which a graph from [`GraphBuilder`] never produces.
///
/// [`GraphBuilder`]: crate::graph::GraphBuilder
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("conjunction '{module}' received a pulse from '{sender}', which is not one of its inputs")]
    UnknownInput { module: String, sender: String },
    #[error("module '{0}' has no entry in the state table")]
    MissingState(String),
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Single-threaded, deterministic pulse simulator.
#[derive(Debug, Clone)]
pub struct Engine {
    graph: ModuleGraph,

    /// Mutable state for every declared module.
    pub(crate) states: SecondaryMap<ModuleId, ModuleState>,

    /// Totals since construction or the last reset.
    pub(crate) counters: PulseCounters,

    /// Completed pushes.
    pub(crate) pushes: PushIndex,

    queue: PulseQueue,

    /// Prior values overwritten during the current push, newest last.
    journal: Vec<Undo>,
}

/// The one field a transition may overwrite, with its value before the push
/// touched it.
#[derive(Debug, Clone, Copy)]
enum Undo {
    Toggle {
        module: ModuleId,
        on: bool,
    },
    Memory {
        module: ModuleId,
        input: ModuleId,
        level: Level,
    },
}

impl Engine {
    /// Create an engine with every module in its initial state.
    pub fn new(graph: ModuleGraph) -> Self {
        let states = graph.initial_states();
        Self {
            graph,
            states,
            counters: PulseCounters::default(),
            pushes: 0,
            queue: PulseQueue::new(),
            journal: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    pub fn counters(&self) -> PulseCounters {
        self.counters
    }

    /// Number of completed pushes.
    pub fn pushes(&self) -> PushIndex {
        self.pushes
    }

    pub fn state(&self, id: ModuleId) -> Option<&ModuleState> {
        self.states.get(id)
    }

    pub fn state_by_name(&self, name: &str) -> Option<&ModuleState> {
        self.graph.id(name).and_then(|id| self.states.get(id))
    }

    /// State table entries in slot order.
    pub fn states(&self) -> impl Iterator<Item = (ModuleId, &ModuleState)> {
        self.states.iter()
    }

    /// Hash of push count, totals, and the full state table.
    pub fn state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(self.pushes);
        hash.write_counters(&self.counters);
        for (id, state) in &self.states {
            hash.write_id(id);
            hash.write_state(state);
        }
        hash.finish()
    }

    // -----------------------------------------------------------------------
    // Control
    // -----------------------------------------------------------------------

    /// Restore every module to its initial state and zero the counters.
    pub fn reset(&mut self) {
        self.states = self.graph.initial_states();
        self.counters = PulseCounters::default();
        self.pushes = 0;
        self.queue.clear();
        self.journal.clear();
    }

    /// Run one push with no observer.
    pub fn push(&mut self) -> Result<PushReport, SimError> {
        self.push_observed(&mut ())
    }

    /// Run one push, reporting every event to `observer`.
    ///
    /// If a transition fails the remaining queue is discarded, every state
    /// change made by the push is rolled back, neither the push nor its pulses
    /// are counted, and the error is returned.
    pub fn push_observed(
        &mut self,
        observer: &mut dyn PulseObserver,
    ) -> Result<PushReport, SimError> {
        let push = self.pushes + 1;
        let mut pulses = PulseCounters::default();

        self.queue.push(Pulse {
            source: PulseSource::Button,
            target: self.graph.entry(),
            level: Level::Low,
        });

        self.journal.clear();
        if let Err(e) = self.drain(push, observer, &mut pulses) {
            tracing::debug!(
                push,
                dropped = self.queue.len(),
                undone = self.journal.len(),
                error = %e,
                "push aborted"
            );
            self.queue.clear();
            self.rollback();
            return Err(e);
        }
        self.journal.clear();

        self.counters += pulses;
        self.pushes = push;
        tracing::trace!(push, low = pulses.low, high = pulses.high, "push settled");
        Ok(PushReport { push, pulses })
    }

    /// Run exactly `count` pushes. Returns the totals afterwards.
    pub fn run(&mut self, count: u64) -> Result<PulseCounters, SimError> {
        for _ in 0..count {
            self.push()?;
        }
        Ok(self.counters)
    }

    /// Push until `observer` reports done, checking after every push.
    ///
    /// Returns the index of the push after which the observer finished, or
    /// `None` if `max_pushes` more pushes ran without that happening.
    pub fn run_until(
        &mut self,
        observer: &mut dyn PulseObserver,
        max_pushes: Option<u64>,
    ) -> Result<Option<PushIndex>, SimError> {
        let start = self.pushes;
        loop {
            if max_pushes.is_some_and(|max| self.pushes - start >= max) {
                return Ok(None);
            }
            let report = self.push_observed(observer)?;
            if observer.is_done() {
                return Ok(Some(report.push));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Internal: drain
    // -----------------------------------------------------------------------

    fn drain(
        &mut self,
        push: PushIndex,
        observer: &mut dyn PulseObserver,
        pulses: &mut PulseCounters,
    ) -> Result<(), SimError> {
        while let Some(pulse) = self.queue.pop() {
            pulses.record(pulse.level);
            observer.on_event(&PulseEvent::Delivered { push, pulse });

            // Undeclared destinations are sinks.
            let Some(def) = self.graph.module(pulse.target) else {
                continue;
            };

            let state = self.states.get_mut(pulse.target).ok_or_else(|| {
                SimError::MissingState(self.graph.display_name(pulse.target).to_string())
            })?;

            if let Some(on) = state.is_on() {
                self.journal.push(Undo::Toggle {
                    module: pulse.target,
                    on,
                });
            } else if let PulseSource::Module(input) = pulse.source {
                if let Some(level) = state.remembered(input) {
                    self.journal.push(Undo::Memory {
                        module: pulse.target,
                        input,
                        level,
                    });
                }
            }

            let emitted = state
                .transition(pulse.level, pulse.source)
                .map_err(|e| match e {
                    TransitionError::UnknownInput(sender) => SimError::UnknownInput {
                        module: self.graph.display_name(pulse.target).to_string(),
                        sender: match sender {
                            PulseSource::Button => "button".to_string(),
                            PulseSource::Module(id) => self.graph.display_name(id).to_string(),
                        },
                    },
                })?;

            if let Some(level) = emitted {
                observer.on_event(&PulseEvent::Emitted {
                    push,
                    module: pulse.target,
                    kind: def.kind,
                    level,
                });
                self.queue.emit(pulse.target, &def.destinations, level);
            }
        }
        Ok(())
    }

    /// Undo the current push's state changes, newest first.
    fn rollback(&mut self) {
        while let Some(undo) = self.journal.pop() {
            match undo {
                Undo::Toggle { module, on } => {
                    if let Some(ModuleState::Toggle { on: current }) = self.states.get_mut(module) {
                        *current = on;
                    }
                }
                Undo::Memory {
                    module,
                    input,
                    level,
                } => {
                    if let Some(ModuleState::Conjunction { memory }) = self.states.get_mut(module) {
                        memory.insert(input, level);
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Counting mode
// ---------------------------------------------------------------------------

/// Run `pushes` pushes on a fresh engine and return the totals.
pub fn count_pulses(graph: &ModuleGraph, pushes: u64) -> Result<PulseCounters, SimError> {
    Engine::new(graph.clone()).run(pushes)
}

/// Counting mode: `low * high` after [`COUNTING_PUSHES`] pushes.
pub fn pulse_product(graph: &ModuleGraph) -> Result<u64, SimError> {
    count_pulses(graph, COUNTING_PUSHES).map(|c| c.product())
}

// ===========================================================================
// Tests
// ===========================================================================
