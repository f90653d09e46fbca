//! Run configuration.
//!
//! Every field has a default, so a partial config file (or none at all) is
//! valid. Files are loaded by `pulsenet-data`.

use serde::{Deserialize, Serialize};

use crate::engine::COUNTING_PUSHES;

/// Default push budget for searches that may not terminate.
pub const DEFAULT_MAX_PUSHES: u64 = 1_000_000;

/// Settings for the periodic analyzer and its exhaustive fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Require each sentinel's second high emission at exactly twice its first.
    pub verify_period: bool,
    /// Upper bound on pushes per search. `None` searches without limit.
    pub max_pushes: Option<u64>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            verify_period: true,
            max_pushes: Some(DEFAULT_MAX_PUSHES),
        }
    }
}

/// Top-level run settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Pushes run by counting mode.
    pub counting_pushes: u64,
    /// Module watched by periodic mode.
    pub terminal: String,
    pub analyzer: AnalyzerConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            counting_pushes: COUNTING_PUSHES,
            terminal: "rx".to_string(),
            analyzer: AnalyzerConfig::default(),
        }
    }
}
