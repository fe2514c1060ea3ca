//! Repeated-simulation battle estimator
//!
//! Trials are independent: each one copies both rosters and owns a
//! `ChaCha8Rng` seeded from `base_seed + trial_index`, so a batch gives the
//! same aggregate for a given seed no matter how many workers run it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::combat::{expected_hits, CombatValueProvider, SupportMode};
use crate::core::config::OddsConfig;
use crate::core::error::{OddsError, Result};
use crate::core::types::Side;
use crate::odds::aggregate::AggregateResults;
use crate::odds::trial::{run_trial, TrialOutcome, TrialSetup};
use crate::rules::Ruleset;
use crate::units::Unit;

/// Shared flag that stops a batch from starting further trials
///
/// Trials already running finish normally.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome of one batch of trials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub results: AggregateResults,
    pub requested_trials: usize,
    /// True when the batch stopped early; `results` then covers only the
    /// trials that finished
    pub cancelled: bool,
    pub seed: u64,
}

enum TrialResult {
    Skipped,
    Finished(Box<TrialOutcome>),
    Failed,
    Fatal(OddsError),
}

/// Configurable stochastic estimator
#[derive(Debug, Clone, Default)]
pub struct StochasticEstimator {
    config: OddsConfig,
    cancel: CancelToken,
}

impl StochasticEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: OddsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &OddsConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Run the configured number of trials of `attackers` against `defenders`
    ///
    /// Blocks until every started trial has finished. Trials that error or
    /// panic are counted as failed and left out of the rates, except for
    /// errors that invalidate the whole batch: those stop scheduling and are
    /// returned.
    pub fn run(
        &self,
        attackers: &[Unit],
        defenders: &[Unit],
        provider: &dyn CombatValueProvider,
        ruleset: &Ruleset,
    ) -> Result<SimulationReport> {
        self.config
            .validate()
            .map_err(OddsError::InvalidArgument)?;
        if attackers.is_empty() {
            return Err(OddsError::InvalidArgument(
                "cannot simulate a battle without attacking units".into(),
            ));
        }
        ruleset.check_roster(attackers)?;
        ruleset.check_roster(defenders)?;
        // Surface provider errors once instead of once per trial
        let attack = provider.evaluate(attackers, defenders, Side::Attacker, SupportMode::Full)?;
        let defense = provider.evaluate(defenders, attackers, Side::Defender, SupportMode::Full)?;
        debug!(
            attacker_hits = expected_hits(&attack),
            defender_hits = expected_hits(&defense),
            "expected hits in the opening round"
        );

        let trial_count = self.config.trial_count;
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let threads = self.config.resolved_worker_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| OddsError::Config(format!("failed to build trial pool: {e}")))?;

        let setup = TrialSetup {
            attackers,
            defenders,
            provider,
            ruleset,
            max_rounds: self.config.max_rounds,
            retreat: &self.config.retreat,
        };
        let cancel = &self.cancel;
        let abort = AtomicBool::new(false);

        let start = Instant::now();
        let mut trials: Vec<TrialResult> = pool.install(|| {
            (0..trial_count)
                .into_par_iter()
                .map(|i| {
                    if cancel.is_cancelled() || abort.load(Ordering::Relaxed) {
                        return TrialResult::Skipped;
                    }
                    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
                    match panic::catch_unwind(AssertUnwindSafe(|| run_trial(&setup, &mut rng))) {
                        Ok(Ok(outcome)) => TrialResult::Finished(Box::new(outcome)),
                        Ok(Err(e)) if e.is_fatal_for_batch() => {
                            error!(trial = i, error = %e, "trial failed, stopping batch");
                            abort.store(true, Ordering::Relaxed);
                            TrialResult::Fatal(e)
                        }
                        Ok(Err(e)) => {
                            warn!(trial = i, error = %e, "trial failed");
                            TrialResult::Failed
                        }
                        Err(_) => {
                            warn!(trial = i, "trial panicked");
                            TrialResult::Failed
                        }
                    }
                })
                .collect()
        });

        if let Some(pos) = trials.iter().position(|t| matches!(t, TrialResult::Fatal(_))) {
            if let TrialResult::Fatal(e) = trials.swap_remove(pos) {
                return Err(e);
            }
        }
        let skipped = trials
            .iter()
            .filter(|t| matches!(t, TrialResult::Skipped))
            .count();

        let results = pool.install(|| {
            trials
                .par_iter()
                .fold(AggregateResults::new, |mut acc, trial| {
                    match trial {
                        TrialResult::Finished(outcome) => acc.absorb(outcome),
                        TrialResult::Failed => acc.record_failure(),
                        TrialResult::Skipped | TrialResult::Fatal(_) => {}
                    }
                    acc
                })
                .reduce(AggregateResults::new, AggregateResults::merge)
        });

        let cancelled = skipped > 0;
        if cancelled && results.trials == 0 {
            return Err(OddsError::Cancelled);
        }

        if results.timed_out > 0 {
            warn!(
                timed_out = results.timed_out,
                max_rounds = self.config.max_rounds,
                "trials reached the round cap"
            );
        }
        info!(
            trials = results.trials,
            failed = results.failed_trials,
            timed_out = results.timed_out,
            skipped,
            threads,
            seed,
            attacker_win_rate = results.win_rate(Side::Attacker),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "simulation finished"
        );

        Ok(SimulationReport {
            results,
            requested_trials: trial_count,
            cancelled,
            seed,
        })
    }
}

/// Simulate `trial_count` battles with default settings
///
/// `friendly` attacks `enemy`. Support comes from `ruleset`.
pub fn simulate_outcome(
    friendly: &[Unit],
    enemy: &[Unit],
    provider: &dyn CombatValueProvider,
    ruleset: &Ruleset,
    trial_count: usize,
) -> Result<SimulationReport> {
    let config = OddsConfig {
        trial_count,
        ..OddsConfig::default()
    };
    StochasticEstimator::new()
        .with_config(config)
        .run(friendly, enemy, provider, ruleset)
}
