//! Battle outcome estimators
//!
//! `analytical` is a closed-form estimate cheap enough for AI scoring;
//! `stochastic` plays the battle out many times on a worker pool.

pub mod aggregate;
pub mod analytical;
pub mod stochastic;
pub mod trial;

pub use aggregate::{AggregateResults, OddsSummary, SideTally};
pub use analytical::{estimate, predict_outcome, AnalyticalOutcome, SideStrength};
pub use stochastic::{simulate_outcome, CancelToken, SimulationReport, StochasticEstimator};
pub use trial::{run_trial, TrialOutcome, TrialSetup};
