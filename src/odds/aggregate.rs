//! Outcome tallies across many trials
//!
//! Everything is summed as integers so merging partial tallies from worker
//! threads is order independent; rates and averages are derived on demand.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{Side, UnitTypeId, Winner};
use crate::odds::trial::TrialOutcome;
use crate::units::Unit;

/// Survivor counts per unit type
pub type SurvivorCounts = BTreeMap<UnitTypeId, u64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideTally {
    pub wins: u64,
    pub units_left: u64,
    pub value_lost: u64,
    pub survivors: SurvivorCounts,
}

impl SideTally {
    fn count_survivors(&mut self, units: &[Unit]) {
        self.units_left += units.len() as u64;
        for unit in units {
            *self.survivors.entry(unit.unit_type.clone()).or_default() += 1;
        }
    }

    fn merge(&mut self, other: SideTally) {
        self.wins += other.wins;
        self.units_left += other.units_left;
        self.value_lost += other.value_lost;
        for (unit_type, count) in other.survivors {
            *self.survivors.entry(unit_type).or_default() += count;
        }
    }
}

/// Running totals over completed trials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResults {
    /// Trials that ran to completion
    pub trials: u64,
    pub attacker: SideTally,
    pub defender: SideTally,
    pub draws: u64,
    pub undecided: u64,
    pub timed_out: u64,
    pub retreats: u64,
    /// Trials that errored or panicked and were left out of every other count
    pub failed_trials: u64,
    pub total_rounds: u64,
}

impl AggregateResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, outcome: &TrialOutcome) {
        self.trials += 1;
        self.total_rounds += outcome.rounds as u64;
        match outcome.winner {
            Winner::Attacker => self.attacker.wins += 1,
            Winner::Defender => self.defender.wins += 1,
            Winner::Draw => self.draws += 1,
            Winner::Undecided => self.undecided += 1,
        }
        if outcome.timed_out {
            self.timed_out += 1;
        }
        if outcome.retreated {
            self.retreats += 1;
        }
        self.attacker.count_survivors(&outcome.attackers_left);
        self.defender.count_survivors(&outcome.defenders_left);
        self.attacker.value_lost += outcome.attacker_value_lost;
        self.defender.value_lost += outcome.defender_value_lost;
    }

    pub fn record_failure(&mut self) {
        self.failed_trials += 1;
    }

    pub fn merge(mut self, other: AggregateResults) -> Self {
        self.trials += other.trials;
        self.draws += other.draws;
        self.undecided += other.undecided;
        self.timed_out += other.timed_out;
        self.retreats += other.retreats;
        self.failed_trials += other.failed_trials;
        self.total_rounds += other.total_rounds;
        self.attacker.merge(other.attacker);
        self.defender.merge(other.defender);
        self
    }

    pub fn side(&self, side: Side) -> &SideTally {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    fn per_trial(&self, total: u64) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            total as f64 / self.trials as f64
        }
    }

    /// Fraction of completed trials won by `side`, in [0, 1]
    pub fn win_rate(&self, side: Side) -> f64 {
        self.per_trial(self.side(side).wins)
    }

    pub fn draw_rate(&self) -> f64 {
        self.per_trial(self.draws)
    }

    pub fn undecided_rate(&self) -> f64 {
        self.per_trial(self.undecided)
    }

    pub fn avg_rounds(&self) -> f64 {
        self.per_trial(self.total_rounds)
    }

    pub fn avg_units_left(&self, side: Side) -> f64 {
        self.per_trial(self.side(side).units_left)
    }

    pub fn avg_value_lost(&self, side: Side) -> f64 {
        self.per_trial(self.side(side).value_lost)
    }

    /// Mean survivors of each unit type per trial
    pub fn avg_survivors(&self, side: Side) -> BTreeMap<UnitTypeId, f64> {
        self.side(side)
            .survivors
            .iter()
            .map(|(unit_type, &count)| (unit_type.clone(), self.per_trial(count)))
            .collect()
    }

    pub fn summary(&self) -> OddsSummary {
        OddsSummary {
            trials: self.trials,
            failed_trials: self.failed_trials,
            attacker_win_rate: self.win_rate(Side::Attacker),
            defender_win_rate: self.win_rate(Side::Defender),
            draw_rate: self.draw_rate(),
            undecided_rate: self.undecided_rate(),
            avg_rounds: self.avg_rounds(),
            attacker_avg_units_left: self.avg_units_left(Side::Attacker),
            defender_avg_units_left: self.avg_units_left(Side::Defender),
            attacker_avg_value_lost: self.avg_value_lost(Side::Attacker),
            defender_avg_value_lost: self.avg_value_lost(Side::Defender),
            attacker_avg_survivors: self.avg_survivors(Side::Attacker),
            defender_avg_survivors: self.avg_survivors(Side::Defender),
        }
    }
}

/// Derived rates for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsSummary {
    pub trials: u64,
    pub failed_trials: u64,
    pub attacker_win_rate: f64,
    pub defender_win_rate: f64,
    pub draw_rate: f64,
    pub undecided_rate: f64,
    pub avg_rounds: f64,
    pub attacker_avg_units_left: f64,
    pub defender_avg_units_left: f64,
    pub attacker_avg_value_lost: f64,
    pub defender_avg_value_lost: f64,
    pub attacker_avg_survivors: BTreeMap<UnitTypeId, f64>,
    pub defender_avg_survivors: BTreeMap<UnitTypeId, f64>,
}
