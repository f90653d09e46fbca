//! Low/high pulse totals.

use serde::{Deserialize, Serialize};

use crate::id::PushIndex;
use crate::module::Level;

/// Running totals of delivered pulses, one count per dequeued event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PulseCounters {
    pub low: u64,
    pub high: u64,
}

impl PulseCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, level: Level) {
        match level {
            Level::Low => self.low += 1,
            Level::High => self.high += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.low + self.high
    }

    /// `low * high`, the figure reported by counting mode.
    pub fn product(&self) -> u64 {
        self.low * self.high
    }
}

impl std::ops::AddAssign for PulseCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.low += rhs.low;
        self.high += rhs.high;
    }
}

/// Outcome of a single push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushReport {
    /// One-based index of the push that just completed.
    pub push: PushIndex,
    /// Pulses delivered during this push only.
    pub pulses: PulseCounters,
}
