//! Closed-form battle outcome estimate
//!
//! Each side's strength is `avg_power * unit_count^a`: the attrition factor
//! `a` discounts piling up units. The stronger side wins, keeping
//! `round(((winner - loser) / winner_avg_power)^(1/a))` units. Pure and O(1),
//! meant for scoring many candidate battles, not for exact odds.

use serde::{Deserialize, Serialize};

use crate::combat::{CombatValueProvider, SupportMode};
use crate::core::error::{OddsError, Result};
use crate::core::types::{Side, Winner};
use crate::units::Unit;

/// Aggregate strength of one side for the analytical model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideStrength {
    pub avg_power: f64,
    pub unit_count: u32,
    pub attrition_factor: f64,
}

impl SideStrength {
    pub fn new(avg_power: f64, unit_count: u32, attrition_factor: f64) -> Self {
        Self {
            avg_power,
            unit_count,
            attrition_factor,
        }
    }

    /// Strength of `units` fighting as `side`, support included
    pub fn evaluate(
        units: &[Unit],
        enemy: &[Unit],
        side: Side,
        provider: &dyn CombatValueProvider,
        attrition_factor: f64,
    ) -> Result<Self> {
        if units.is_empty() {
            return Ok(Self::new(0.0, 0, attrition_factor));
        }
        let values = provider.evaluate(units, enemy, side, SupportMode::Full)?;
        let avg_power = values.total_power() as f64 / units.len() as f64;
        Ok(Self::new(avg_power, units.len() as u32, attrition_factor))
    }

    /// `avg_power * unit_count^a`
    pub fn initial_power(&self) -> f64 {
        self.avg_power * (self.unit_count as f64).powf(self.attrition_factor)
    }

    fn validate(&self, label: &str) -> Result<()> {
        let a = self.attrition_factor;
        if !(a.is_finite() && a > 0.0 && a <= 1.0) {
            return Err(OddsError::InvalidArgument(format!(
                "{label} attrition factor {a} must be in (0, 1]"
            )));
        }
        if !(self.avg_power.is_finite() && self.avg_power >= 0.0) {
            return Err(OddsError::InvalidArgument(format!(
                "{label} average power {} must be finite and non-negative",
                self.avg_power
            )));
        }
        Ok(())
    }
}

/// Result of the analytical estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticalOutcome {
    /// `Attacker`, `Defender` or `Draw` on equal strength
    pub winner: Winner,
    pub expected_remaining_units: u32,
}

/// Estimate a battle between two sides sharing one attrition factor
pub fn estimate(attacker: &SideStrength, defender: &SideStrength) -> Result<AnalyticalOutcome> {
    attacker.validate("attacker")?;
    defender.validate("defender")?;
    if (attacker.attrition_factor - defender.attrition_factor).abs() > f64::EPSILON {
        return Err(OddsError::InvalidArgument(format!(
            "attrition factors differ: {} vs {}",
            attacker.attrition_factor, defender.attrition_factor
        )));
    }

    let attacker_power = attacker.initial_power();
    let defender_power = defender.initial_power();

    let (winner, strong, weak_power) = if attacker_power > defender_power {
        (Winner::Attacker, attacker, defender_power)
    } else if defender_power > attacker_power {
        (Winner::Defender, defender, attacker_power)
    } else {
        return Ok(AnalyticalOutcome {
            winner: Winner::Draw,
            expected_remaining_units: 0,
        });
    };

    let margin = (strong.initial_power() - weak_power) / strong.avg_power;
    let remaining = margin.powf(1.0 / strong.attrition_factor).round();
    let expected_remaining_units = (remaining.max(0.0) as u32).min(strong.unit_count);

    Ok(AnalyticalOutcome {
        winner,
        expected_remaining_units,
    })
}

/// Predict a battle with `friendly` attacking `enemy`
///
/// Either roster may be empty; an empty side has no strength.
pub fn predict_outcome(
    friendly: &[Unit],
    enemy: &[Unit],
    provider: &dyn CombatValueProvider,
    attrition_factor: f64,
) -> Result<AnalyticalOutcome> {
    let attacker =
        SideStrength::evaluate(friendly, enemy, Side::Attacker, provider, attrition_factor)?;
    let defender =
        SideStrength::evaluate(enemy, friendly, Side::Defender, provider, attrition_factor)?;
    estimate(&attacker, &defender)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_attrition_example() {
        let a = SideStrength::new(10.0, 10, 1.0);
        let b = SideStrength::new(10.0, 6, 1.0);
        assert_eq!(a.initial_power(), 100.0);
        assert_eq!(b.initial_power(), 60.0);

        let outcome = estimate(&a, &b).unwrap();
        assert_eq!(outcome.winner, Winner::Attacker);
        assert_eq!(outcome.expected_remaining_units, 4);
    }

    #[test]
    fn test_defender_can_win() {
        let a = SideStrength::new(2.0, 4, 1.0);
        let b = SideStrength::new(3.0, 5, 1.0);

        let outcome = estimate(&a, &b).unwrap();
        assert_eq!(outcome.winner, Winner::Defender);
        // (15 - 8) / 3 = 2.33
        assert_eq!(outcome.expected_remaining_units, 2);
    }

    #[test]
    fn test_equal_power_is_draw() {
        let a = SideStrength::new(3.0, 4, 0.5);
        let b = SideStrength::new(6.0, 1, 0.5);

        let outcome = estimate(&a, &b).unwrap();
        assert_eq!(outcome.winner, Winner::Draw);
        assert_eq!(outcome.expected_remaining_units, 0);
    }

    #[test]
    fn test_sublinear_attrition_discounts_numbers() {
        // 16 weak units vs 4 units twice as strong: a linear model favours
        // numbers, a = 0.5 evens the odds
        let swarm = SideStrength::new(1.0, 16, 0.5);
        let elite = SideStrength::new(2.0, 4, 0.5);
        assert_eq!(swarm.initial_power(), 4.0);
        assert_eq!(elite.initial_power(), 4.0);

        let swarm = SideStrength::new(1.0, 16, 1.0);
        let elite = SideStrength::new(2.0, 4, 1.0);
        assert_eq!(estimate(&swarm, &elite).unwrap().winner, Winner::Attacker);
    }

    #[test]
    fn test_remaining_uses_inverse_exponent() {
        let a = SideStrength::new(1.0, 16, 0.5);
        let b = SideStrength::new(1.0, 4, 0.5);
        // (4 - 2) / 1 = 2, squared = 4
        let outcome = estimate(&a, &b).unwrap();
        assert_eq!(outcome.expected_remaining_units, 4);
    }

    #[test]
    fn test_mismatched_attrition_factors() {
        let a = SideStrength::new(1.0, 3, 1.0);
        let b = SideStrength::new(1.0, 3, 0.5);
        assert!(matches!(estimate(&a, &b), Err(OddsError::InvalidArgument(_))));
    }

    #[test]
    fn test_attrition_factor_out_of_range() {
        let a = SideStrength::new(1.0, 3, 0.0);
        let b = SideStrength::new(1.0, 3, 0.0);
        assert!(matches!(estimate(&a, &b), Err(OddsError::InvalidArgument(_))));

        let a = SideStrength::new(1.0, 3, 1.2);
        let b = SideStrength::new(1.0, 3, 1.2);
        assert!(matches!(estimate(&a, &b), Err(OddsError::InvalidArgument(_))));
    }

    #[test]
    fn test_empty_side_loses_outright() {
        let a = SideStrength::new(2.0, 5, 0.8);
        let b = SideStrength::new(0.0, 0, 0.8);

        let outcome = estimate(&a, &b).unwrap();
        assert_eq!(outcome.winner, Winner::Attacker);
        assert_eq!(outcome.expected_remaining_units, 5);
    }
}
