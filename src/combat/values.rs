//! Combat value contract: per-unit power and rolls for one side
//!
//! The raw combat-value computation belongs to the rules engine; this crate
//! only consumes its output through [`CombatValueProvider`]. The bundled
//! [`RulesetCombatValues`] is a straightforward reference implementation
//! driven by a [`Ruleset`].

use ahash::{AHashMap, AHashSet};

use crate::core::error::Result;
use crate::core::types::{Side, UnitId, UnitTypeId};
use crate::rules::Ruleset;
use crate::units::{BonusCategory, Unit};

/// Which support effects to include in an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportMode {
    /// Power including support bonuses
    Full,
    /// Power without support rules; the casualty ranker applies those itself
    StaticOnly,
}

/// Power and dice of one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitCombatValue {
    pub power: u32,
    pub rolls: u32,
}

/// Per-unit combat values of one side, fixed for a casualty-selection episode
#[derive(Debug, Clone)]
pub struct CombatValueSnapshot {
    pub side: Side,
    pub dice_sides: u32,
    values: AHashMap<UnitId, UnitCombatValue>,
}

impl CombatValueSnapshot {
    pub fn new(side: Side, dice_sides: u32) -> Self {
        Self {
            side,
            dice_sides,
            values: AHashMap::new(),
        }
    }

    pub fn insert(&mut self, unit: UnitId, value: UnitCombatValue) {
        self.values.insert(unit, value);
    }

    pub fn get(&self, unit: &UnitId) -> Option<UnitCombatValue> {
        self.values.get(unit).copied()
    }

    /// Power of a unit, 0 for units not in the snapshot
    pub fn power(&self, unit: &UnitId) -> u32 {
        self.get(unit).map(|v| v.power).unwrap_or(0)
    }

    pub fn rolls(&self, unit: &UnitId) -> u32 {
        self.get(unit).map(|v| v.rolls).unwrap_or(0)
    }

    /// Dice rolled by the whole side
    pub fn total_rolls(&self) -> u32 {
        self.values.values().map(|v| v.rolls).sum()
    }

    /// Sum of power over every die the side rolls
    pub fn total_power(&self) -> u64 {
        self.values
            .values()
            .map(|v| v.power as u64 * v.rolls as u64)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Source of per-unit combat values
///
/// Implementations must be thread-safe: the stochastic estimator evaluates
/// from many trials at once.
pub trait CombatValueProvider: Send + Sync {
    /// Evaluate every unit of `friendly` fighting as `side` against `enemy`
    ///
    /// Unknown unit types are reported as `InvalidArgument`.
    fn evaluate(
        &self,
        friendly: &[Unit],
        enemy: &[Unit],
        side: Side,
        mode: SupportMode,
    ) -> Result<CombatValueSnapshot>;
}

/// Reference provider computing values from a [`Ruleset`]
///
/// Static power is the type's attack or defense, plus the marine bonus for
/// attackers that landed amphibiously. In `Full` mode each supporting unit
/// grants its bonus to at most one receiver per rule, strongest rules first,
/// and a receiver takes at most one bonus per category. Power is clamped to
/// `[0, dice_sides]`.
#[derive(Debug, Clone, Copy)]
pub struct RulesetCombatValues<'a> {
    ruleset: &'a Ruleset,
    dice_sides: u32,
}

impl<'a> RulesetCombatValues<'a> {
    pub fn new(ruleset: &'a Ruleset, dice_sides: u32) -> Self {
        Self {
            ruleset,
            dice_sides,
        }
    }

    pub fn ruleset(&self) -> &'a Ruleset {
        self.ruleset
    }

    fn static_power(&self, unit: &Unit, side: Side) -> Result<i64> {
        let def = self.ruleset.unit_type(unit)?;
        let mut power = def.base_power(side) as i64;
        if side == Side::Attacker && unit.was_amphibious {
            power += def.marine_bonus as i64;
        }
        Ok(power)
    }

    /// Support bonus received by each unit, indexed like `friendly`
    fn support_bonuses(&self, friendly: &[Unit], side: Side) -> Vec<i64> {
        let mut bonuses = vec![0i64; friendly.len()];
        let mut received: Vec<AHashSet<&BonusCategory>> = vec![AHashSet::new(); friendly.len()];

        let mut type_counts: AHashMap<&UnitTypeId, usize> = AHashMap::new();
        for unit in friendly {
            *type_counts.entry(&unit.unit_type).or_insert(0) += 1;
        }

        let mut rules: Vec<_> = self.ruleset.support.rules_for(side).collect();
        rules.sort_by_key(|(id, rule)| (std::cmp::Reverse(rule.bonus), *id));

        for (_, rule) in rules {
            let providers = type_counts.get(&rule.provider).copied().unwrap_or(0);
            // A lone unit cannot support its own type
            let mut capacity = if rule.provider == rule.receiver && providers < 2 {
                0
            } else {
                providers
            };

            for (i, unit) in friendly.iter().enumerate() {
                if capacity == 0 {
                    break;
                }
                if unit.unit_type != rule.receiver || received[i].contains(&rule.category) {
                    continue;
                }
                received[i].insert(&rule.category);
                bonuses[i] += rule.bonus as i64;
                capacity -= 1;
            }
        }

        bonuses
    }
}

impl CombatValueProvider for RulesetCombatValues<'_> {
    fn evaluate(
        &self,
        friendly: &[Unit],
        _enemy: &[Unit],
        side: Side,
        mode: SupportMode,
    ) -> Result<CombatValueSnapshot> {
        let support = match mode {
            SupportMode::Full => self.support_bonuses(friendly, side),
            SupportMode::StaticOnly => vec![0; friendly.len()],
        };

        let mut snapshot = CombatValueSnapshot::new(side, self.dice_sides);
        for (unit, bonus) in friendly.iter().zip(support) {
            let def = self.ruleset.unit_type(unit)?;
            let power = (self.static_power(unit, side)? + bonus).clamp(0, self.dice_sides as i64);
            snapshot.insert(
                unit.id,
                UnitCombatValue {
                    power: power as u32,
                    rolls: def.rolls,
                },
            );
        }

        Ok(snapshot)
    }
}
