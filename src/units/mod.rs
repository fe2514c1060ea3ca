//! Units, unit type definitions and the support-rule table
//!
//! These are the attribute accessors the casualty and odds code consume:
//! type, owner, movement remaining, amphibious history and air capability.

pub mod support;
pub mod unit;
pub mod unit_type;

pub use support::{BonusCategory, RuleId, SupportRule, SupportSide, SupportTable};
pub use unit::{Roster, Unit};
pub use unit_type::{UnitTypeDef, UnitTypeRegistry};
