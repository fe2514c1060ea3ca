//! Load battle scenarios from TOML files
//!
//! A scenario declares the unit types, the support rules between them and
//! both rosters, plus optional estimator overrides:
//!
//! ```toml
//! name = "Beach landing"
//!
//! [config]
//! trial_count = 500
//!
//! [[unit_types]]
//! name = "infantry"
//! attack = 1
//! defense = 2
//!
//! [[support]]
//! name = "artillery"
//! provider = "artillery"
//! receiver = "infantry"
//! category = "artillery"
//! bonus = 1
//! side = "attack"
//!
//! [[attackers]]
//! unit_type = "infantry"
//! owner = 1
//! count = 4
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::core::config::OddsConfig;
use crate::core::error::{OddsError, Result};
use crate::core::types::{PlayerId, UnitTypeId};
use crate::rules::Ruleset;
use crate::units::{Roster, SupportRule, SupportTable, Unit, UnitTypeDef, UnitTypeRegistry};

fn default_count() -> u32 {
    1
}

/// A batch of identical units in a scenario roster
#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
    pub unit_type: UnitTypeId,
    pub owner: u32,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub movement_left: u32,
    #[serde(default)]
    pub amphibious: bool,
    #[serde(default)]
    pub hits: u32,
}

impl RosterEntry {
    fn expand(&self) -> impl Iterator<Item = Unit> + '_ {
        (0..self.count).map(move |_| {
            let mut unit = Unit::new(self.unit_type.clone(), PlayerId(self.owner))
                .with_movement(self.movement_left)
                .with_hits(self.hits);
            unit.was_amphibious = self.amphibious;
            unit
        })
    }
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    config: OddsConfig,
    #[serde(default)]
    unit_types: Vec<UnitTypeDef>,
    #[serde(default)]
    support: Vec<SupportRule>,
    #[serde(default)]
    attackers: Vec<RosterEntry>,
    #[serde(default)]
    defenders: Vec<RosterEntry>,
}

/// A fully-resolved battle scenario
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub config: OddsConfig,
    pub ruleset: Ruleset,
    pub attackers: Roster,
    pub defenders: Roster,
}

/// Parse a scenario from TOML text
pub fn parse_scenario(contents: &str) -> Result<Scenario> {
    let file: ScenarioFile = toml::from_str(contents)?;
    file.config.validate().map_err(OddsError::Config)?;

    let unit_types: UnitTypeRegistry = file.unit_types.into_iter().collect();
    for rule in &file.support {
        for type_id in [&rule.provider, &rule.receiver] {
            if unit_types.get(type_id).is_none() {
                return Err(OddsError::Config(format!(
                    "support rule '{}' references unknown unit type '{}'",
                    rule.name, type_id
                )));
            }
        }
    }
    let support: SupportTable = file.support.into_iter().collect();
    let ruleset = Ruleset::new(unit_types, support);

    let attackers: Roster = file.attackers.iter().flat_map(|entry| entry.expand()).collect();
    let defenders: Roster = file.defenders.iter().flat_map(|entry| entry.expand()).collect();
    ruleset.check_roster(&attackers)?;
    ruleset.check_roster(&defenders)?;

    Ok(Scenario {
        name: file.name,
        config: file.config,
        ruleset,
        attackers,
        defenders,
    })
}

/// Load a scenario from a TOML file on disk
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let contents = fs::read_to_string(path)?;
    let mut scenario = parse_scenario(&contents)?;
    if scenario.name.is_empty() {
        scenario.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    Ok(scenario)
}
