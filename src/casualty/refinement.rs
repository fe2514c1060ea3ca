//! Choosing individual units within a ranked group
//!
//! The ranker decides how many units of each (owner, type) group are hit.
//! Refinement only decides which individuals those are, using per-unit
//! attributes the group valuation ignores:
//!
//! - air units being killed lose the one with the most movement left, air
//!   units being damaged take it on the one with the least;
//! - with a positive marine bonus non-amphibious units die first, with a
//!   negative one amphibious units die first.

use std::cmp::Ordering;

use ahash::AHashMap;

use crate::casualty::selection::CasualtyList;
use crate::core::error::{OddsError, Result};
use crate::core::types::{PlayerId, UnitId, UnitTypeId};
use crate::rules::Ruleset;
use crate::units::{Unit, UnitTypeDef};

/// What happens to a chosen unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    Kill,
    Damage,
}

fn marine_rank(unit: &Unit, def: &UnitTypeDef) -> u8 {
    match def.marine_bonus.cmp(&0) {
        // Keep the units earning the bonus
        Ordering::Greater => u8::from(unit.was_amphibious),
        // Lose the penalised units first
        Ordering::Less => u8::from(!unit.was_amphibious),
        Ordering::Equal => 0,
    }
}

fn compare_for(a: &Unit, b: &Unit, def: &UnitTypeDef, fate: Fate) -> Ordering {
    let marine = match fate {
        Fate::Kill => marine_rank(a, def).cmp(&marine_rank(b, def)),
        Fate::Damage => Ordering::Equal,
    };
    let movement = match (def.is_air, fate) {
        (false, _) => Ordering::Equal,
        (true, Fate::Kill) => b.movement_left.cmp(&a.movement_left),
        (true, Fate::Damage) => a.movement_left.cmp(&b.movement_left),
    };
    marine.then(movement)
}

/// Sort same-type candidates so the first ones are chosen first
///
/// The sort is stable: candidates equal under both policies keep their
/// roster order.
pub fn order_candidates(candidates: &mut [&Unit], def: &UnitTypeDef, fate: Fate) {
    candidates.sort_by(|a, b| compare_for(a, b, def, fate));
}

/// Pick which `count` of the candidates are killed
pub fn choose_kills(mut candidates: Vec<&Unit>, count: usize, def: &UnitTypeDef) -> Vec<UnitId> {
    order_candidates(&mut candidates, def, Fate::Kill);
    candidates.into_iter().take(count).map(|u| u.id).collect()
}

/// Spread `hits` of damage over the candidates, one entry per hit
///
/// Each unit absorbs up to its remaining damage capacity before the next one
/// is used. Returns fewer entries than `hits` when capacity runs out.
pub fn distribute_damage(mut candidates: Vec<&Unit>, hits: usize, def: &UnitTypeDef) -> Vec<UnitId> {
    order_candidates(&mut candidates, def, Fate::Damage);
    let mut damaged = Vec::with_capacity(hits);
    for unit in candidates {
        let capacity = unit.damage_capacity(def) as usize;
        let absorbed = capacity.min(hits - damaged.len());
        damaged.extend(std::iter::repeat(unit.id).take(absorbed));
        if damaged.len() == hits {
            break;
        }
    }
    damaged
}

/// Count entries per (owner, type) group, in first-seen order
fn tally<'a>(
    ids: &[UnitId],
    by_id: &AHashMap<UnitId, &'a Unit>,
) -> Result<Vec<((PlayerId, &'a UnitTypeId), usize)>> {
    let mut counts: Vec<((PlayerId, &'a UnitTypeId), usize)> = Vec::new();
    for id in ids {
        let unit: &'a Unit = by_id.get(id).copied().ok_or_else(|| {
            OddsError::InvalidArgument(format!("casualty {:?} is not in the roster", id))
        })?;
        let key = (unit.owner, &unit.unit_type);
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }
    Ok(counts)
}

/// Re-choose the individuals of a casualty list within each group
///
/// Counts per (owner, type) group and per fate are preserved; only the
/// identities change.
pub fn refine_casualty_list(list: &mut CasualtyList, roster: &[Unit], ruleset: &Ruleset) -> Result<()> {
    let by_id: AHashMap<UnitId, &Unit> = roster.iter().map(|u| (u.id, u)).collect();
    let members = |owner: PlayerId, unit_type: &UnitTypeId| -> Vec<&Unit> {
        roster
            .iter()
            .filter(|u| u.owner == owner && &u.unit_type == unit_type)
            .collect()
    };

    let mut killed = Vec::with_capacity(list.killed().len());
    for ((owner, unit_type), count) in tally(list.killed(), &by_id)? {
        let def = ruleset.unit_types.require(unit_type)?;
        killed.extend(choose_kills(members(owner, unit_type), count, def));
    }

    let mut damaged = Vec::with_capacity(list.damaged().len());
    for ((owner, unit_type), count) in tally(list.damaged(), &by_id)? {
        let def = ruleset.unit_types.require(unit_type)?;
        let chosen = distribute_damage(members(owner, unit_type), count, def);
        if chosen.len() < count {
            return Err(OddsError::InvalidArgument(format!(
                "{} damage on {} exceeds what its units can absorb",
                count, unit_type
            )));
        }
        damaged.extend(chosen);
    }

    list.replace(killed, damaged);
    Ok(())
}
