//! FIFO queue of in-flight pulses.
//!
//! Pulses are popped from the front and appended at the back, so every
//! consequence of an earlier pulse is queued before any later pulse is
//! handled.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::id::ModuleId;
use crate::module::Level;

/// Who sent a pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PulseSource {
    /// The external button that starts every push.
    Button,
    Module(ModuleId),
}

/// A pulse addressed to one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pulse {
    pub source: PulseSource,
    pub target: ModuleId,
    pub level: Level,
}

/// Strict FIFO carrier of pulses within one push.
#[derive(Debug, Clone, Default)]
pub struct PulseQueue {
    pending: VecDeque<Pulse>,
}

impl PulseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pulse: Pulse) {
        self.pending.push_back(pulse);
    }

    /// Queue one pulse from `source` to each of `targets`, in order.
    pub fn emit(&mut self, source: ModuleId, targets: &[ModuleId], level: Level) {
        for &target in targets {
            self.push(Pulse {
                source: PulseSource::Module(source),
                target,
                level,
            });
        }
    }

    pub fn pop(&mut self) -> Option<Pulse> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop all pending pulses. Used when a push aborts with an error.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn make_ids(count: usize) -> Vec<ModuleId> {
        let mut sm = SlotMap::<ModuleId, ()>::with_key();
        (0..count).map(|_| sm.insert(())).collect()
    }

    #[test]
    fn pops_in_insertion_order() {
        let ids = make_ids(3);
        let mut queue = PulseQueue::new();
        queue.push(Pulse {
            source: PulseSource::Button,
            target: ids[0],
            level: Level::Low,
        });
        queue.emit(ids[0], &[ids[1], ids[2]], Level::High);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop().map(|p| p.target), Some(ids[0]));
        let second = queue.pop().unwrap();
        assert_eq!(second.target, ids[1]);
        assert_eq!(second.source, PulseSource::Module(ids[0]));
        assert_eq!(second.level, Level::High);
        assert_eq!(queue.pop().map(|p| p.target), Some(ids[2]));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn emit_keeps_duplicate_destinations() {
        let ids = make_ids(2);
        let mut queue = PulseQueue::new();
        queue.emit(ids[0], &[ids[1], ids[1]], Level::Low);
        assert_eq!(queue.len(), 2);
        assert!(std::iter::from_fn(|| queue.pop()).all(|p| p.target == ids[1]));
    }

    #[test]
    fn later_emissions_wait_behind_earlier_ones() {
        let ids = make_ids(4);
        let mut queue = PulseQueue::new();
        queue.emit(ids[0], &[ids[1], ids[2]], Level::Low);

        // Handling the first pulse emits to ids[3]; it must land after ids[2].
        let first = queue.pop().unwrap();
        queue.emit(first.target, &[ids[3]], Level::High);

        let order: Vec<ModuleId> = std::iter::from_fn(|| queue.pop()).map(|p| p.target).collect();
        assert_eq!(order, vec![ids[2], ids[3]]);
    }

    #[test]
    fn clear_drops_pending() {
        let ids = make_ids(2);
        let mut queue = PulseQueue::new();
        queue.emit(ids[0], &[ids[1], ids[1]], Level::Low);
        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.pop().is_none());
    }
}
