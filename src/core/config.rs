//! Estimator configuration with documented defaults
//!
//! Every tunable used by the estimators lives here so a scenario file or the
//! CLI can override it in one place.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{OddsError, Result};

/// When the attacker withdraws during a simulated battle
///
/// A retreat ends the trial with both sides still standing and counts as a
/// defender win.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetreatPolicy {
    /// Withdraw after this many rounds have been fought
    pub after_round: Option<u32>,

    /// Withdraw once the attacker is down to this many units or fewer
    pub when_units_at_most: Option<usize>,
}

impl RetreatPolicy {
    /// Whether the attacker withdraws after `round` with `remaining` units
    pub fn should_retreat(&self, round: u32, remaining: usize) -> bool {
        let by_round = self.after_round.is_some_and(|r| round >= r);
        let by_losses = self.when_units_at_most.is_some_and(|n| remaining <= n);
        by_round || by_losses
    }
}

/// Configuration for both outcome estimators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OddsConfig {
    /// Number of independent trials run by the stochastic estimator
    ///
    /// 200 keeps the win-percentage error around a few points for typical
    /// battles while staying interactive.
    pub trial_count: usize,

    /// Hard cap on combat rounds inside one trial
    ///
    /// This is the only bound on the latency of a trial; a trial reaching it
    /// is aggregated in its capped state.
    pub max_rounds: u32,

    /// Exponent applied to unit counts by the analytical estimator, in (0, 1]
    ///
    /// 1.0 treats every extra unit as fully effective; lower values model
    /// diminishing returns from piling up units.
    pub attrition_factor: f64,

    /// Worker threads for trials (None = available hardware parallelism)
    pub worker_threads: Option<usize>,

    /// Base seed for trial RNGs (None = random per batch)
    pub seed: Option<u64>,

    /// Faces on the combat die; a roll strictly below power is a hit
    pub dice_sides: u32,

    /// Attacker retreat rules for simulated battles
    pub retreat: RetreatPolicy,
}

impl Default for OddsConfig {
    fn default() -> Self {
        Self {
            trial_count: 200,
            max_rounds: 100,
            attrition_factor: 0.8,
            worker_threads: None,
            seed: None,
            dice_sides: 6,
            retreat: RetreatPolicy::default(),
        }
    }
}

impl OddsConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.trial_count == 0 {
            return Err("trial_count must be at least 1".into());
        }

        if self.max_rounds == 0 {
            return Err("max_rounds must be at least 1".into());
        }

        if !(self.attrition_factor > 0.0 && self.attrition_factor <= 1.0) {
            return Err(format!(
                "attrition_factor ({}) must be in (0, 1]",
                self.attrition_factor
            ));
        }

        if self.worker_threads == Some(0) {
            return Err("worker_threads must be at least 1 when set".into());
        }

        if self.dice_sides == 0 {
            return Err("dice_sides must be at least 1".into());
        }

        Ok(())
    }

    /// Parse and validate a config from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: OddsConfig = toml::from_str(contents)?;
        config.validate().map_err(OddsError::Config)?;
        Ok(config)
    }

    /// Load and validate a config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Worker count for the trial pool
    pub fn resolved_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
