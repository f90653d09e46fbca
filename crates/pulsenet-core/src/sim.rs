//! Deterministic state hashing.
//!
//! Two engines built from the same graph and pushed the same number of times
//! must hash identically. The hash covers the push counter, pulse totals, and
//! every entry of the state table in slot order.

use slotmap::Key;

use crate::counters::PulseCounters;
use crate::id::ModuleId;
use crate::module::{Level, ModuleState};

/// FNV-1a (64-bit). Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u8(&mut self, v: u8) {
        self.write(&[v]);
    }

    pub fn write_id(&mut self, id: ModuleId) {
        self.write_u64(id.data().as_ffi());
    }

    pub fn write_counters(&mut self, counters: &PulseCounters) {
        self.write_u64(counters.low);
        self.write_u64(counters.high);
    }

    pub fn write_state(&mut self, state: &ModuleState) {
        match state {
            ModuleState::Relay => self.write_u8(0),
            ModuleState::Toggle { on } => {
                self.write_u8(1);
                self.write_u8(*on as u8);
            }
            ModuleState::Conjunction { memory } => {
                self.write_u8(2);
                self.write_u64(memory.len() as u64);
                for (&input, &level) in memory {
                    self.write_id(input);
                    self.write_u8(matches!(level, Level::High) as u8);
                }
            }
        }
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleKind;
    use slotmap::SlotMap;

    #[test]
    fn hash_deterministic() {
        let mut h1 = StateHash::new();
        h1.write_u64(42);
        h1.write_state(&ModuleState::Toggle { on: true });

        let mut h2 = StateHash::new();
        h2.write_u64(42);
        h2.write_state(&ModuleState::Toggle { on: true });

        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn toggle_state_changes_hash() {
        let mut h1 = StateHash::new();
        h1.write_state(&ModuleState::Toggle { on: true });
        let mut h2 = StateHash::new();
        h2.write_state(&ModuleState::Toggle { on: false });
        assert_ne!(h1.finish(), h2.finish());
    }

    #[test]
    fn conjunction_memory_changes_hash() {
        let mut sm = SlotMap::<ModuleId, ()>::with_key();
        let a = sm.insert(());
        let low = ModuleState::initial(ModuleKind::Conjunction, &[a]);
        let mut high = low.clone();
        high.transition(Level::High, crate::queue::PulseSource::Module(a))
            .unwrap();

        let mut h1 = StateHash::new();
        h1.write_state(&low);
        let mut h2 = StateHash::new();
        h2.write_state(&high);
        assert_ne!(h1.finish(), h2.finish());
    }

    #[test]
    fn order_matters() {
        let mut h1 = StateHash::new();
        h1.write_counters(&PulseCounters { low: 1, high: 2 });
        let mut h2 = StateHash::new();
        h2.write_counters(&PulseCounters { low: 2, high: 1 });
        assert_ne!(h1.finish(), h2.finish());
    }
}
