//! Shared graph builders for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::graph::{GraphBuilder, ModuleGraph};
use crate::module::ModuleKind;

// ===========================================================================
// Reference scenarios
// ===========================================================================

/// `broadcaster -> a, b, c`, a toggle ring closed through an inverter.
/// Every push delivers 8 low and 4 high pulses and restores the start state.
pub fn scenario_a() -> ModuleGraph {
    let mut b = GraphBuilder::new();
    b.declare("broadcaster", ModuleKind::Relay, ["a", "b", "c"]).unwrap();
    b.declare("a", ModuleKind::Toggle, ["b"]).unwrap();
    b.declare("b", ModuleKind::Toggle, ["c"]).unwrap();
    b.declare("c", ModuleKind::Toggle, ["inv"]).unwrap();
    b.declare("inv", ModuleKind::Conjunction, ["a"]).unwrap();
    b.build().unwrap()
}

/// Two toggles watched by a two-input conjunction that feeds the sink
/// `output`. Cycles every four pushes.
pub fn scenario_b() -> ModuleGraph {
    let mut b = GraphBuilder::new();
    b.declare("broadcaster", ModuleKind::Relay, ["a"]).unwrap();
    b.declare("a", ModuleKind::Toggle, ["inv", "con"]).unwrap();
    b.declare("inv", ModuleKind::Conjunction, ["b"]).unwrap();
    b.declare("b", ModuleKind::Toggle, ["con"]).unwrap();
    b.declare("con", ModuleKind::Conjunction, ["output"]).unwrap();
    b.build().unwrap()
}

/// A toggle is the only sentinel: it emits high on pushes 1, 3, 5, ...
/// so its period (2) does not match its first occurrence (1).
pub fn toggle_sentinel_network() -> ModuleGraph {
    let mut b = GraphBuilder::new();
    b.declare("broadcaster", ModuleKind::Relay, ["t"]).unwrap();
    b.declare("t", ModuleKind::Toggle, ["hub"]).unwrap();
    b.declare("hub", ModuleKind::Conjunction, ["rx"]).unwrap();
    b.build().unwrap()
}

// ===========================================================================
// Counter networks
// ===========================================================================

/// Declare a ripple counter that overflows every `period` pushes. Only odd
/// periods wrap cleanly to zero.
///
/// Toggles `p{period}_b{i}` form a binary counter fed at bit 0. The detector
/// conjunction `p{period}_c` watches the bits set in `period`; when they are all
/// on it emits low into the clear bits and bit 0, wrapping the counter to zero.
/// The inverter `p{period}_s` turns that low into the high pulse seen by `hub`.
///
/// Returns the name of bit 0, which the entry relay must feed.
fn declare_counter(b: &mut GraphBuilder, period: u64) -> String {
    assert!(
        period >= 3 && period % 2 == 1,
        "counter period must be odd and at least 3"
    );
    let width = (u64::BITS - period.leading_zeros()) as usize;
    let bit = |i: usize| format!("p{period}_b{i}");
    let detector = format!("p{period}_c");
    let sentinel = format!("p{period}_s");

    for i in 0..width {
        let mut dests = Vec::new();
        if i + 1 < width {
            dests.push(bit(i + 1));
        }
        if period & (1 << i) != 0 {
            dests.push(detector.clone());
        }
        b.declare(&bit(i), ModuleKind::Toggle, dests).unwrap();
    }

    let mut detector_dests: Vec<String> = (0..width)
        .filter(|&i| period & (1 << i) == 0)
        .map(bit)
        .collect();
    if period & 1 != 0 {
        detector_dests.insert(0, bit(0));
    }
    detector_dests.push(sentinel.clone());
    b.declare(&detector, ModuleKind::Conjunction, detector_dests)
        .unwrap();
    b.declare(&sentinel, ModuleKind::Conjunction, ["hub"]).unwrap();

    bit(0)
}

/// One counter per period, all sentinels combined by `hub`, which feeds `rx`.
///
/// `rx` first receives a low pulse at push `lcm(periods)`.
pub fn counter_network(periods: &[u64]) -> ModuleGraph {
    let mut b = GraphBuilder::new();
    let heads: Vec<String> = periods
        .iter()
        .map(|&p| declare_counter(&mut b, p))
        .collect();
    b.declare("hub", ModuleKind::Conjunction, ["rx"]).unwrap();
    b.declare("broadcaster", ModuleKind::Relay, heads).unwrap();
    b.build().unwrap()
}
