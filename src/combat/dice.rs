//! Dice rolling for simulated combat rounds

use rand::Rng;

use crate::combat::values::CombatValueSnapshot;
use crate::units::Unit;

/// Roll every die of `units` and count hits
///
/// A die hits when it rolls strictly below the unit's power, so power is the
/// number of winning faces out of `dice_sides`.
pub fn roll_hits<R: Rng>(units: &[Unit], values: &CombatValueSnapshot, rng: &mut R) -> u32 {
    if values.dice_sides == 0 {
        return 0;
    }

    let mut hits = 0;
    for unit in units {
        let power = values.power(&unit.id);
        for _ in 0..values.rolls(&unit.id) {
            if rng.gen_range(0..values.dice_sides) < power {
                hits += 1;
            }
        }
    }
    hits
}

/// Expected hits per round, the mean of [`roll_hits`]
pub fn expected_hits(values: &CombatValueSnapshot) -> f64 {
    if values.dice_sides == 0 {
        return 0.0;
    }
    values.total_power() as f64 / values.dice_sides as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::values::UnitCombatValue;
    use crate::core::types::{PlayerId, Side};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn snapshot(units: &[Unit], power: u32) -> CombatValueSnapshot {
        let mut values = CombatValueSnapshot::new(Side::Attacker, 6);
        for unit in units {
            values.insert(unit.id, UnitCombatValue { power, rolls: 1 });
        }
        values
    }

    #[test]
    fn test_max_power_always_hits() {
        let units: Vec<_> = (0..10).map(|_| Unit::new("tank", PlayerId(1))).collect();
        let values = snapshot(&units, 6);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        assert_eq!(roll_hits(&units, &values, &mut rng), 10);
    }

    #[test]
    fn test_zero_power_never_hits() {
        let units: Vec<_> = (0..10).map(|_| Unit::new("transport", PlayerId(1))).collect();
        let values = snapshot(&units, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        assert_eq!(roll_hits(&units, &values, &mut rng), 0);
    }

    #[test]
    fn test_hit_rate_tracks_expectation() {
        let units: Vec<_> = (0..600).map(|_| Unit::new("infantry", PlayerId(1))).collect();
        let values = snapshot(&units, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let hits = roll_hits(&units, &values, &mut rng) as f64;
        let expected = expected_hits(&values);
        assert_eq!(expected, 200.0);
        assert!((hits - expected).abs() < 40.0, "hits={hits}");
    }
}
