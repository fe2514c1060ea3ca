//! Individual units and rosters

use serde::{Deserialize, Serialize};

use crate::core::types::{PlayerId, UnitId, UnitTypeId};
use crate::units::unit_type::UnitTypeDef;

/// A single unit on one side of a battle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub unit_type: UnitTypeId,
    pub owner: PlayerId,
    /// Damage already taken
    #[serde(default)]
    pub hits: u32,
    /// Movement points left this turn
    #[serde(default)]
    pub movement_left: u32,
    /// Unit attacked from a transport this turn
    #[serde(default)]
    pub was_amphibious: bool,
}

impl Unit {
    pub fn new(unit_type: impl Into<UnitTypeId>, owner: PlayerId) -> Self {
        Self {
            id: UnitId::new(),
            unit_type: unit_type.into(),
            owner,
            hits: 0,
            movement_left: 0,
            was_amphibious: false,
        }
    }

    pub fn with_movement(mut self, movement_left: u32) -> Self {
        self.movement_left = movement_left;
        self
    }

    pub fn amphibious(mut self) -> Self {
        self.was_amphibious = true;
        self
    }

    pub fn with_hits(mut self, hits: u32) -> Self {
        self.hits = hits;
        self
    }

    /// Hits this unit can still absorb without dying
    pub fn damage_capacity(&self, def: &UnitTypeDef) -> u32 {
        def.hit_points.saturating_sub(1).saturating_sub(self.hits)
    }

    /// Hits needed to remove this unit from the battle
    pub fn hits_to_kill(&self, def: &UnitTypeDef) -> u32 {
        def.hit_points.saturating_sub(self.hits).max(1)
    }
}

/// Units fighting on one side of a battle
pub type Roster = Vec<Unit>;
