//! Casualty selection for one combat round
//!
//! Hits are absorbed as damage by multi-hit units first, since damage costs
//! no combat value. Every hit past the side's damage capacity kills one unit,
//! least valuable first according to the support-aware ranker. Refinement
//! then settles which individuals of each chosen group take the hits.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::casualty::ranker::CasualtyRanker;
use crate::casualty::refinement::{distribute_damage, refine_casualty_list};
use crate::combat::CombatValueProvider;
use crate::core::error::{OddsError, Result};
use crate::core::types::{Side, UnitId};
use crate::rules::Ruleset;
use crate::units::Unit;

/// Units marked killed or damaged during one selection episode
///
/// A unit appears in `damaged` once per hit it absorbs. A unit damaged and
/// then killed in the same episode appears in both lists, so the two lists
/// together always account for every hit applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasualtyList {
    killed: Vec<UnitId>,
    damaged: Vec<UnitId>,
}

impl CasualtyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_killed(&mut self, unit: UnitId) {
        self.killed.push(unit);
    }

    pub fn add_damaged(&mut self, unit: UnitId) {
        self.damaged.push(unit);
    }

    pub fn killed(&self) -> &[UnitId] {
        &self.killed
    }

    pub fn damaged(&self) -> &[UnitId] {
        &self.damaged
    }

    pub fn is_killed(&self, unit: &UnitId) -> bool {
        self.killed.contains(unit)
    }

    /// Damage entries recorded against a unit
    pub fn damage_taken(&self, unit: &UnitId) -> u32 {
        self.damaged.iter().filter(|id| *id == unit).count() as u32
    }

    /// Hits accounted for by this list
    pub fn hits_absorbed(&self) -> usize {
        self.killed.len() + self.damaged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.killed.is_empty() && self.damaged.is_empty()
    }

    pub(crate) fn replace(&mut self, killed: Vec<UnitId>, damaged: Vec<UnitId>) {
        self.killed = killed;
        self.damaged = damaged;
    }

    /// Apply this list to a roster: add damage, then drop killed units
    pub fn apply_to(&self, roster: &mut Vec<Unit>) {
        for unit in roster.iter_mut() {
            unit.hits += self.damage_taken(&unit.id);
        }
        roster.retain(|unit| !self.is_killed(&unit.id));
    }
}

/// Everything casualty selection needs besides the candidates themselves
#[derive(Clone, Copy)]
pub struct CasualtyContext<'a> {
    /// Units the candidates are fighting, passed through to the provider
    pub enemy: &'a [Unit],
    pub side: Side,
    pub provider: &'a dyn CombatValueProvider,
    pub ruleset: &'a Ruleset,
}

/// Hits a roster can take before every unit is dead
pub fn hit_capacity(units: &[Unit], ruleset: &Ruleset) -> Result<u32> {
    let mut capacity = 0;
    for unit in units {
        capacity += unit.hits_to_kill(ruleset.unit_type(unit)?);
    }
    Ok(capacity)
}

/// Choose exactly which candidates absorb `hits`
///
/// Fails with `InsufficientUnits` when the candidates cannot absorb that
/// many hits; callers that want "everyone dies" should clamp to
/// [`hit_capacity`] first.
pub fn select_casualties(
    candidates: &[Unit],
    hits: u32,
    ctx: &CasualtyContext<'_>,
) -> Result<CasualtyList> {
    let mut list = CasualtyList::new();
    if hits == 0 {
        return Ok(list);
    }

    let mut damage_pool = 0u32;
    for unit in candidates {
        damage_pool += unit.damage_capacity(ctx.ruleset.unit_type(unit)?);
    }
    let capacity = hit_capacity(candidates, ctx.ruleset)?;
    if hits > capacity {
        return Err(OddsError::InsufficientUnits {
            requested: hits as usize,
            available: capacity as usize,
        });
    }

    let damage_hits = hits.min(damage_pool) as usize;
    let kill_hits = (hits - damage_hits as u32) as usize;

    let mut ranker =
        CasualtyRanker::build(candidates, ctx.enemy, ctx.side, ctx.provider, ctx.ruleset)?;

    if damage_hits > 0 {
        let by_id: AHashMap<UnitId, &Unit> = candidates.iter().map(|u| (u.id, u)).collect();
        // Damage leaves group sizes alone, so one ranking covers the whole pass
        for group_id in ranker.ranking() {
            let remaining = damage_hits - list.damaged().len();
            if remaining == 0 {
                break;
            }
            let group = ranker.arena().group(group_id);
            let def = ctx.ruleset.unit_types.require(&group.unit_type)?;
            let members: Vec<&Unit> = group
                .members()
                .iter()
                .filter_map(|id| by_id.get(id).copied())
                .collect();
            for unit in distribute_damage(members, remaining, def) {
                list.add_damaged(unit);
            }
        }
    }

    if kill_hits > 0 {
        for pick in ranker.take_casualties(kill_hits)? {
            list.add_killed(pick.unit);
        }
    }

    refine_casualty_list(&mut list, candidates, ctx.ruleset)?;

    debug!(
        side = ?ctx.side,
        hits,
        killed = list.killed().len(),
        damaged = list.damaged().len(),
        "selected casualties"
    );

    Ok(list)
}
