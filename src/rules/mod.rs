//! Rulesets and battle scenarios loaded from TOML

mod loader;

pub use loader::{load_scenario, parse_scenario, RosterEntry, Scenario};

use crate::core::error::Result;
use crate::units::{SupportTable, Unit, UnitTypeDef, UnitTypeRegistry};

/// Unit type definitions together with the support rules between them
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    pub unit_types: UnitTypeRegistry,
    pub support: SupportTable,
}

impl Ruleset {
    pub fn new(unit_types: UnitTypeRegistry, support: SupportTable) -> Self {
        Self { unit_types, support }
    }

    pub fn unit_type(&self, unit: &Unit) -> Result<&UnitTypeDef> {
        self.unit_types.require(&unit.unit_type)
    }

    /// Reject rosters that reference types this ruleset does not define
    pub fn check_roster(&self, units: &[Unit]) -> Result<()> {
        for unit in units {
            self.unit_type(unit)?;
        }
        Ok(())
    }
}
