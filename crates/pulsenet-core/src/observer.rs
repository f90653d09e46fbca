//! Synchronous observation of engine activity.
//!
//! The engine reports two kinds of [`PulseEvent`] while draining a push:
//! every dequeued pulse ([`PulseEvent::Delivered`]) and every level a module
//! emits ([`PulseEvent::Emitted`]). Observers are read-only: they cannot touch
//! the queue or the state table. An observer can ask the engine to stop at the
//! next push boundary through [`PulseObserver::is_done`]; a push in progress is
//! always drained to completion.

use crate::id::{ModuleId, PushIndex};
use crate::module::{Level, ModuleKind};
use crate::queue::Pulse;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Something that happened during a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseEvent {
    /// A pulse was dequeued and counted.
    Delivered { push: PushIndex, pulse: Pulse },
    /// A module's transition produced a level for all its destinations.
    Emitted {
        push: PushIndex,
        module: ModuleId,
        kind: ModuleKind,
        level: Level,
    },
}

impl PulseEvent {
    pub fn push(&self) -> PushIndex {
        match self {
            PulseEvent::Delivered { push, .. } | PulseEvent::Emitted { push, .. } => *push,
        }
    }
}

// ---------------------------------------------------------------------------
// Observer trait
// ---------------------------------------------------------------------------

/// Receives every [`PulseEvent`] synchronously, in engine order.
pub trait PulseObserver {
    fn on_event(&mut self, event: &PulseEvent);

    /// Checked after each push by [`Engine::run_until`](crate::engine::Engine::run_until).
    fn is_done(&self) -> bool {
        false
    }
}

/// The no-op observer.
impl PulseObserver for () {
    fn on_event(&mut self, _event: &PulseEvent) {}
}

// ---------------------------------------------------------------------------
// Pulse log
// ---------------------------------------------------------------------------

/// Records every delivered pulse. Handy for tracing a cascade in tests.
#[derive(Debug, Default, Clone)]
pub struct PulseLog {
    pub delivered: Vec<Pulse>,
}

impl PulseLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PulseObserver for PulseLog {
    fn on_event(&mut self, event: &PulseEvent) {
        if let PulseEvent::Delivered { pulse, .. } = event {
            self.delivered.push(*pulse);
        }
    }
}

// ---------------------------------------------------------------------------
// First-low watcher
// ---------------------------------------------------------------------------

/// Remembers the first push in which `terminal` receives a low pulse.
#[derive(Debug, Clone)]
pub struct FirstLowWatcher {
    terminal: ModuleId,
    found: Option<PushIndex>,
}

impl FirstLowWatcher {
    pub fn new(terminal: ModuleId) -> Self {
        Self {
            terminal,
            found: None,
        }
    }

    pub fn found(&self) -> Option<PushIndex> {
        self.found
    }
}

impl PulseObserver for FirstLowWatcher {
    fn on_event(&mut self, event: &PulseEvent) {
        if self.found.is_some() {
            return;
        }
        if let PulseEvent::Delivered { push, pulse } = event {
            if pulse.target == self.terminal && pulse.level.is_low() {
                self.found = Some(*push);
            }
        }
    }

    fn is_done(&self) -> bool {
        self.found.is_some()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
