//! Combat values and dice
//!
//! Everything here is the rules-engine side of combat: how strong each unit
//! is and how a round of fire turns into hits.

pub mod dice;
pub mod values;

pub use dice::{expected_hits, roll_hits};
pub use values::{
    CombatValueProvider, CombatValueSnapshot, RulesetCombatValues, SupportMode, UnitCombatValue,
};
