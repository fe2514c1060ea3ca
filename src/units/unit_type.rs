//! Unit types and their combat properties

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{OddsError, Result};
use crate::core::types::{Side, UnitTypeId};

fn default_one() -> u32 {
    1
}

/// Combat properties shared by every unit of one type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTypeDef {
    pub name: UnitTypeId,
    pub attack: u32,
    pub defense: u32,
    /// Dice rolled per unit each round
    #[serde(default = "default_one")]
    pub rolls: u32,
    #[serde(default = "default_one")]
    pub hit_points: u32,
    #[serde(default)]
    pub is_air: bool,
    /// Attack modifier applied to units that assaulted from a transport
    #[serde(default)]
    pub marine_bonus: i32,
    /// Production cost, used to value losses
    #[serde(default)]
    pub cost: u32,
}

impl UnitTypeDef {
    pub fn new(name: impl Into<UnitTypeId>, attack: u32, defense: u32) -> Self {
        Self {
            name: name.into(),
            attack,
            defense,
            rolls: 1,
            hit_points: 1,
            is_air: false,
            marine_bonus: 0,
            cost: 0,
        }
    }

    /// Unmodified power for the given battle role
    pub fn base_power(&self, side: Side) -> u32 {
        match side {
            Side::Attacker => self.attack,
            Side::Defender => self.defense,
        }
    }
}

/// Lookup of unit types by name
#[derive(Debug, Clone, Default)]
pub struct UnitTypeRegistry {
    types: AHashMap<UnitTypeId, UnitTypeDef>,
}

impl UnitTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit type, replacing any previous definition of that name
    pub fn insert(&mut self, def: UnitTypeDef) {
        self.types.insert(def.name.clone(), def);
    }

    pub fn get(&self, id: &UnitTypeId) -> Option<&UnitTypeDef> {
        self.types.get(id)
    }

    /// Get a unit type, treating an unknown name as malformed input
    pub fn require(&self, id: &UnitTypeId) -> Result<&UnitTypeDef> {
        self.get(id)
            .ok_or_else(|| OddsError::InvalidArgument(format!("unknown unit type '{}'", id)))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<UnitTypeDef> for UnitTypeRegistry {
    fn from_iter<I: IntoIterator<Item = UnitTypeDef>>(iter: I) -> Self {
        let mut registry = Self::new();
        for def in iter {
            registry.insert(def);
        }
        registry
    }
}
