//! Periodic-activation analysis: when does a terminal module first receive a
//! low pulse?
//!
//! The button signal is identical every push and the state space is finite, so
//! every module's emissions are eventually periodic. The analyzer handles the
//! common layout where the terminal is fed by exactly one conjunction. That
//! conjunction emits low only when it remembers high from all of its inputs
//! (the *sentinels*) at once. If each sentinel emits high once every `p_i`
//! pushes starting at push `p_i`, the first push where they coincide is
//! `lcm(p_1, ..., p_n)`.
//!
//! The zero-phase-offset assumption is checked, not trusted: with
//! [`AnalyzerConfig::verify_period`] set, each sentinel's second high emission
//! must land at exactly twice its first. Layouts that fail either the topology
//! or the period check are answered by [`simulate_until_low`] instead, via
//! [`presses_until_low`].

use crate::config::AnalyzerConfig;
use crate::engine::{Engine, SimError};
use crate::graph::ModuleGraph;
use crate::id::{ModuleId, PushIndex};
use crate::module::{Level, ModuleKind};
use crate::observer::{FirstLowWatcher, PulseEvent, PulseObserver};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the periodic analyzer and the exhaustive search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalyzerError {
    #[error("unknown terminal module '{0}'")]
    UnknownTerminal(String),
    #[error("unsupported topology at terminal '{terminal}': {reason}")]
    UnsupportedTopology { terminal: String, reason: String },
    #[error(
        "sentinel '{sentinel}' emitted high at pushes {first} and {second}; its period does not start at push 0"
    )]
    PhaseOffset {
        sentinel: String,
        first: PushIndex,
        second: PushIndex,
    },
    #[error("no answer within {0} pushes")]
    BudgetExhausted(u64),
    #[error("lcm of sentinel periods overflows u64")]
    Overflow,
    #[error(transparent)]
    Sim(#[from] SimError),
}

// ---------------------------------------------------------------------------
// Topology query
// ---------------------------------------------------------------------------

/// The feeding conjunction of a terminal and its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinels {
    pub feeder: ModuleId,
    pub members: Vec<ModuleId>,
}

/// Statically locate the terminal's single feeding conjunction and its inputs.
pub fn locate_sentinels(
    graph: &ModuleGraph,
    terminal: ModuleId,
) -> Result<Sentinels, AnalyzerError> {
    let unsupported = |reason: String| AnalyzerError::UnsupportedTopology {
        terminal: graph.display_name(terminal).to_string(),
        reason,
    };

    let feeders = graph.inputs(terminal);
    let feeder = match feeders {
        [] => return Err(unsupported("no module feeds it".into())),
        [single] => *single,
        many => return Err(unsupported(format!("{} modules feed it", many.len()))),
    };
    match graph.kind(feeder) {
        Some(ModuleKind::Conjunction) => {}
        other => {
            return Err(unsupported(format!(
                "feeder '{}' is {:?}, not a conjunction",
                graph.display_name(feeder),
                other
            )));
        }
    }

    let members = graph.inputs(feeder).to_vec();
    if members.is_empty() {
        return Err(unsupported(format!(
            "feeder '{}' has no inputs",
            graph.display_name(feeder)
        )));
    }
    Ok(Sentinels { feeder, members })
}

// ---------------------------------------------------------------------------
// Sentinel observer
// ---------------------------------------------------------------------------

/// Occurrence record for one sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelPeriod {
    pub module: ModuleId,
    /// First push in which the sentinel emitted high.
    pub first: PushIndex,
    /// Next distinct push with a high emission, when period verification ran.
    pub second: Option<PushIndex>,
}

/// Records the first (and optionally second) push in which each sentinel emits high.
#[derive(Debug)]
struct SentinelWatch {
    members: Vec<ModuleId>,
    first: Vec<Option<PushIndex>>,
    second: Vec<Option<PushIndex>>,
    verify: bool,
}

impl SentinelWatch {
    fn new(members: Vec<ModuleId>, verify: bool) -> Self {
        let n = members.len();
        Self {
            members,
            first: vec![None; n],
            second: vec![None; n],
            verify,
        }
    }

    fn periods(&self) -> Vec<SentinelPeriod> {
        self.members
            .iter()
            .zip(self.first.iter().zip(&self.second))
            .filter_map(|(&module, (&first, &second))| {
                first.map(|first| SentinelPeriod {
                    module,
                    first,
                    second,
                })
            })
            .collect()
    }
}

impl PulseObserver for SentinelWatch {
    fn on_event(&mut self, event: &PulseEvent) {
        let PulseEvent::Emitted {
            push,
            module,
            level: Level::High,
            ..
        } = *event
        else {
            return;
        };
        let Some(i) = self.members.iter().position(|&m| m == module) else {
            return;
        };
        match self.first[i] {
            None => {
                self.first[i] = Some(push);
                tracing::debug!(push, sentinel = ?module, "sentinel first emitted high");
            }
            Some(first) if self.verify && first != push && self.second[i].is_none() => {
                self.second[i] = Some(push);
            }
            Some(_) => {}
        }
    }

    fn is_done(&self) -> bool {
        self.first.iter().all(Option::is_some)
            && (!self.verify || self.second.iter().all(Option::is_some))
    }
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Result of a successful periodic analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub feeder: ModuleId,
    pub sentinels: Vec<SentinelPeriod>,
    /// Push at which the terminal first receives a low pulse.
    pub presses: PushIndex,
    /// Pushes actually simulated to reach the answer.
    pub pushes_simulated: PushIndex,
}

/// lcm-of-periods shortcut for first-low queries.
#[derive(Debug, Clone, Default)]
pub struct PeriodicAnalyzer {
    config: AnalyzerConfig,
}

impl PeriodicAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze `terminal` on a fresh engine built from `graph`.
    pub fn analyze(&self, graph: &ModuleGraph, terminal: &str) -> Result<Analysis, AnalyzerError> {
        let terminal_id = graph
            .id(terminal)
            .ok_or_else(|| AnalyzerError::UnknownTerminal(terminal.to_string()))?;
        let sentinels = locate_sentinels(graph, terminal_id)?;

        let mut engine = Engine::new(graph.clone());
        let mut watch = SentinelWatch::new(sentinels.members.clone(), self.config.verify_period);
        let pushes_simulated = engine
            .run_until(&mut watch, self.config.max_pushes)?
            .ok_or(AnalyzerError::BudgetExhausted(engine.pushes()))?;

        let periods = watch.periods();
        if self.config.verify_period {
            for period in &periods {
                let Some(second) = period.second else { continue };
                if second != period.first * 2 {
                    return Err(AnalyzerError::PhaseOffset {
                        sentinel: graph.display_name(period.module).to_string(),
                        first: period.first,
                        second,
                    });
                }
            }
        }

        let firsts: Vec<u64> = periods.iter().map(|p| p.first).collect();
        let presses = lcm(&firsts).ok_or(AnalyzerError::Overflow)?;

        tracing::debug!(
            terminal,
            presses,
            pushes_simulated,
            sentinels = periods.len(),
            "periodic analysis complete"
        );

        Ok(Analysis {
            feeder: sentinels.feeder,
            sentinels: periods,
            presses,
            pushes_simulated,
        })
    }
}

// ---------------------------------------------------------------------------
// Exhaustive search
// ---------------------------------------------------------------------------

/// Push a fresh engine until `terminal` receives a low pulse.
pub fn simulate_until_low(
    graph: &ModuleGraph,
    terminal: &str,
    max_pushes: Option<u64>,
) -> Result<PushIndex, AnalyzerError> {
    let terminal_id = graph
        .id(terminal)
        .ok_or_else(|| AnalyzerError::UnknownTerminal(terminal.to_string()))?;
    let mut engine = Engine::new(graph.clone());
    let mut watcher = FirstLowWatcher::new(terminal_id);
    engine
        .run_until(&mut watcher, max_pushes)?
        .ok_or(AnalyzerError::BudgetExhausted(engine.pushes()))
}

/// Periodic mode: the shortcut when the layout supports it, exhaustive
/// simulation otherwise.
pub fn presses_until_low(
    graph: &ModuleGraph,
    terminal: &str,
    config: &AnalyzerConfig,
) -> Result<PushIndex, AnalyzerError> {
    match PeriodicAnalyzer::new(config.clone()).analyze(graph, terminal) {
        Ok(analysis) => Ok(analysis.presses),
        Err(
            e @ (AnalyzerError::UnsupportedTopology { .. } | AnalyzerError::PhaseOffset { .. }),
        ) => {
            tracing::warn!(error = %e, "periodic shortcut unavailable, simulating exhaustively");
            simulate_until_low(graph, terminal, config.max_pushes)
        }
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Least common multiple of `values`. `None` on overflow; 1 for an empty slice.
pub fn lcm(values: &[u64]) -> Option<u64> {
    values.iter().try_fold(1u64, |acc, &v| {
        if v == 0 {
            return Some(0);
        }
        (acc / gcd(acc, v)).checked_mul(v)
    })
}

// ===========================================================================
// Tests
// ===========================================================================
