//! Pulsenet Core -- a discrete-event simulator for pulse-exchanging module
//! networks.
//!
//! A network is a fixed set of modules wired together by named destinations.
//! Modules exchange leveled pulses (low or high) and each one reacts according
//! to its kind: a relay repeats, a toggle flips on low input, a conjunction
//! remembers the last level from each input and emits low only when every
//! remembered level is high.
//!
//! # Push Pipeline
//!
//! Each call to [`engine::Engine::push`] runs one complete cascade:
//!
//! 1. **Inject** -- a low pulse from the external button is queued for the
//!    entry relay.
//! 2. **Drain** -- pulses are popped in strict FIFO order, counted, and handed
//!    to the destination module's transition.
//! 3. **Emit** -- any emitted level is appended to the queue once per
//!    destination, in declared order.
//! 4. **Settle** -- the push ends when the queue is empty. Module state carries
//!    over to the next push.
//!
//! # Graph Construction Pattern
//!
//! Graphs are declared first and frozen afterwards, so every conjunction knows
//! its full input set before the first pulse:
//!
//! ```rust,ignore
//! let mut builder = GraphBuilder::new();
//! builder.declare("broadcaster", ModuleKind::Relay, ["a"])?;
//! builder.declare("a", ModuleKind::Toggle, ["inv"])?;
//! builder.declare("inv", ModuleKind::Conjunction, ["a"])?;
//! let graph = builder.build()?;
//! ```
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- owns the state table and the pulse queue.
//! - [`graph::ModuleGraph`] -- frozen topology with reverse edges.
//! - [`module::ModuleState`] -- the three module variants and their transitions.
//! - [`analyzer::PeriodicAnalyzer`] -- lcm-of-periods shortcut for "first low
//!   pulse at terminal" queries.
//! - [`observer::PulseObserver`] -- synchronous hook into delivered and emitted
//!   pulses.
//! - [`serialize`] -- versioned state snapshots via bitcode.

pub mod analyzer;
pub mod config;
pub mod counters;
pub mod engine;
pub mod graph;
pub mod id;
pub mod module;
pub mod observer;
pub mod queue;
pub mod serialize;
pub mod sim;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
