//! Support-aware casualty ranking
//!
//! Yields one unit at a time, least valuable first. Support availability
//! between groups depends on their current sizes, so the whole ranking is
//! rebuilt after every single removal instead of being computed up front.

use std::cmp::Reverse;

use tracing::debug;

use crate::casualty::groups::{GroupArena, GroupId, GroupValuation, UnsupportedStacking};
use crate::combat::{CombatValueProvider, SupportMode};
use crate::core::error::{OddsError, Result};
use crate::core::types::{Side, UnitId};
use crate::rules::Ruleset;
use crate::units::Unit;

/// One unit chosen by the ranker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pick {
    pub group: GroupId,
    pub unit: UnitId,
    /// Usefulness of the group at the moment of the pick
    pub usefulness: i64,
}

#[derive(Debug, Clone)]
struct CachedValuation {
    generation: u64,
    valuation: GroupValuation,
}

/// Ranks one side's units from safest to lose to most valuable
#[derive(Debug, Clone)]
pub struct CasualtyRanker {
    arena: GroupArena,
    cache: Vec<Option<CachedValuation>>,
    unsupported: Vec<UnsupportedStacking>,
}

impl CasualtyRanker {
    pub fn new(arena: GroupArena) -> Self {
        let cache = vec![None; arena.groups().len()];
        Self {
            arena,
            cache,
            unsupported: Vec::new(),
        }
    }

    /// Group `friendly` and link it by the ruleset's support rules
    ///
    /// Base power comes from a `StaticOnly` evaluation; dynamic support is
    /// applied by the ranker itself.
    pub fn build(
        friendly: &[Unit],
        enemy: &[Unit],
        side: Side,
        provider: &dyn CombatValueProvider,
        ruleset: &Ruleset,
    ) -> Result<Self> {
        let values = provider.evaluate(friendly, enemy, side, SupportMode::StaticOnly)?;
        let arena = GroupArena::build(friendly, &values, ruleset, side)?;
        Ok(Self::new(arena))
    }

    pub fn arena(&self) -> &GroupArena {
        &self.arena
    }

    /// Units not yet picked
    pub fn remaining(&self) -> usize {
        self.arena.unit_count()
    }

    /// Support stacking cases met so far, which were valued as zero
    pub fn unsupported_stacking(&self) -> &[UnsupportedStacking] {
        &self.unsupported
    }

    /// Current valuation of a group, recomputed if the arena changed
    pub fn valuation(&mut self, id: GroupId) -> GroupValuation {
        self.refresh(id);
        self.cache[id.0]
            .as_ref()
            .map(|cached| cached.valuation.clone())
            .unwrap_or_default()
    }

    fn refresh(&mut self, id: GroupId) {
        let generation = self.arena.generation();
        if matches!(&self.cache[id.0], Some(c) if c.generation == generation) {
            return;
        }

        let valuation = self.arena.valuation(id);
        for case in &valuation.unsupported {
            if !self.unsupported.contains(case) {
                debug!(
                    group = id.0,
                    category = %case.category,
                    partners = case.partners,
                    rules = case.rules,
                    "support stacking not modelled, valued as zero"
                );
                self.unsupported.push(case.clone());
            }
        }
        self.cache[id.0] = Some(CachedValuation {
            generation,
            valuation,
        });
    }

    pub fn usefulness(&mut self, id: GroupId) -> i64 {
        self.valuation(id).usefulness()
    }

    /// Live groups, next casualty source first
    ///
    /// Ascending usefulness; on ties the group receiving more full support
    /// goes first since losing it frees its supporter for others. Remaining
    /// ties fall back to lower cost, then unit type and owner.
    pub fn ranking(&mut self) -> Vec<GroupId> {
        let live: Vec<GroupId> = self.arena.live_groups().collect();
        let mut keyed: Vec<_> = live
            .into_iter()
            .map(|id| {
                let group = self.arena.group(id);
                let (cost, unit_type, owner) = (group.cost, group.unit_type.clone(), group.owner);
                let valuation = self.valuation(id);
                (
                    (
                        valuation.usefulness(),
                        Reverse(valuation.received),
                        cost,
                        unit_type,
                        owner,
                        id,
                    ),
                    id,
                )
            })
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        keyed.into_iter().map(|(_, id)| id).collect()
    }

    /// The group the next casualty would come from
    pub fn peek(&mut self) -> Option<GroupId> {
        self.ranking().into_iter().next()
    }

    /// Remove and return the single least valuable remaining unit
    pub fn next_casualty(&mut self) -> Option<Pick> {
        let group = self.peek()?;
        let usefulness = self.usefulness(group);
        let unit = self.arena.remove_one(group)?;
        debug!(group = group.0, usefulness, "picked casualty");
        Some(Pick {
            group,
            unit,
            usefulness,
        })
    }

    /// Pick exactly `count` casualties
    ///
    /// Fails without picking anything when fewer units remain.
    pub fn take_casualties(&mut self, count: usize) -> Result<Vec<Pick>> {
        let available = self.remaining();
        if count > available {
            return Err(OddsError::InsufficientUnits {
                requested: count,
                available,
            });
        }

        let mut picks = Vec::with_capacity(count);
        for _ in 0..count {
            match self.next_casualty() {
                Some(pick) => picks.push(pick),
                None => break,
            }
        }
        Ok(picks)
    }
}

impl Iterator for CasualtyRanker {
    type Item = Pick;

    fn next(&mut self) -> Option<Pick> {
        self.next_casualty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::RulesetCombatValues;
    use crate::core::types::PlayerId;
    use crate::units::{SupportRule, UnitTypeDef};
    use std::collections::HashSet;

    fn ruleset(rules: Vec<SupportRule>) -> Ruleset {
        let mut tank = UnitTypeDef::new("tank", 3, 3);
        tank.cost = 6;
        let mut artillery = UnitTypeDef::new("artillery", 2, 2);
        artillery.cost = 4;
        let mut infantry = UnitTypeDef::new("infantry", 1, 2);
        infantry.cost = 3;
        let mut militia = UnitTypeDef::new("militia", 2, 1);
        militia.cost = 2;
        Ruleset::new(
            [infantry, artillery, tank, militia].into_iter().collect(),
            rules.into_iter().collect(),
        )
    }

    fn artillery_rule() -> SupportRule {
        SupportRule::new("artillery", "artillery", "infantry", "artillery", 1)
    }

    fn roster(layout: &[(&str, usize)]) -> Vec<Unit> {
        layout.iter()
            .flat_map(|&(t, n)| (0..n).map(move |_| Unit::new(t, PlayerId(1))))
            .collect()
    }

    fn ranker(units: &[Unit], rules: &Ruleset) -> CasualtyRanker {
        let provider = RulesetCombatValues::new(rules, 6);
        CasualtyRanker::build(units, &[], Side::Attacker, &provider, rules).unwrap()
    }

    fn type_of(ranker: &CasualtyRanker, pick: &Pick) -> String {
        ranker.arena().group(pick.group).unit_type.to_string()
    }

    #[test]
    fn test_weakest_first_without_support() {
        let rules = ruleset(vec![]);
        let units = roster(&[("tank", 1), ("infantry", 1), ("artillery", 1)]);
        let mut ranker = ranker(&units, &rules);

        let picks = ranker.take_casualties(3).unwrap();
        let order: Vec<_> = picks.iter().map(|p| type_of(&ranker, p)).collect();
        assert_eq!(order, vec!["infantry", "artillery", "tank"]);
    }

    #[test]
    fn test_support_reorders_after_each_removal() {
        // Infantry 1+1 (covered by 1 artillery), artillery 2+1: infantry first,
        // then the lone artillery no longer gives anything away
        let rules = ruleset(vec![artillery_rule()]);
        let units = roster(&[("infantry", 1), ("artillery", 1), ("militia", 1)]);
        let mut ranker = ranker(&units, &rules);

        assert_eq!(ranker.usefulness(GroupId(0)), 2);
        assert_eq!(ranker.usefulness(GroupId(1)), 3);

        let first = ranker.next_casualty().unwrap();
        // militia (2) ties infantry (2) but infantry receives more support
        assert_eq!(type_of(&ranker, &first), "infantry");
        assert_eq!(ranker.usefulness(GroupId(1)), 2);

        let second = ranker.next_casualty().unwrap();
        // artillery (2) now ties militia (2); militia is cheaper
        assert_eq!(type_of(&ranker, &second), "militia");
    }

    #[test]
    fn test_uncovered_support_not_counted() {
        let rules = ruleset(vec![artillery_rule()]);
        let units = roster(&[("infantry", 3), ("artillery", 1)]);
        let mut ranker = ranker(&units, &rules);

        assert_eq!(ranker.usefulness(GroupId(0)), 1);
        assert_eq!(ranker.usefulness(GroupId(1)), 3);

        ranker.take_casualties(2).unwrap();
        // One infantry left, now fully covered
        assert_eq!(ranker.usefulness(GroupId(0)), 2);
    }

    #[test]
    fn test_never_returns_same_unit_twice() {
        let rules = ruleset(vec![artillery_rule()]);
        let units = roster(&[("infantry", 4), ("artillery", 2), ("tank", 3)]);
        let mut ranker = ranker(&units, &rules);

        let picks = ranker.take_casualties(units.len()).unwrap();
        let unique: HashSet<_> = picks.iter().map(|p| p.unit).collect();
        assert_eq!(unique.len(), units.len());
        assert_eq!(ranker.remaining(), 0);
        assert!(ranker.next_casualty().is_none());
    }

    #[test]
    fn test_insufficient_units() {
        let rules = ruleset(vec![]);
        let units = roster(&[("infantry", 2)]);
        let mut ranker = ranker(&units, &rules);

        let err = ranker.take_casualties(3).unwrap_err();
        assert!(matches!(
            err,
            OddsError::InsufficientUnits {
                requested: 3,
                available: 2
            }
        ));
        // Nothing was consumed
        assert_eq!(ranker.remaining(), 2);
    }

    #[test]
    fn test_empty_side() {
        let rules = ruleset(vec![]);
        let mut ranker = ranker(&[], &rules);

        assert!(ranker.ranking().is_empty());
        assert!(ranker.take_casualties(0).unwrap().is_empty());
        assert!(ranker.take_casualties(1).is_err());
    }

    #[test]
    fn test_cache_follows_generation() {
        let rules = ruleset(vec![artillery_rule()]);
        let units = roster(&[("infantry", 2), ("artillery", 2)]);
        let mut ranker = ranker(&units, &rules);

        assert_eq!(ranker.usefulness(GroupId(1)), 3);
        let generation = ranker.arena().generation();

        let pick = ranker.next_casualty().unwrap();
        assert_eq!(pick.group, GroupId(0));
        assert!(ranker.arena().generation() > generation);
        // One infantry left for two artillery: the giver side is no longer covered
        assert_eq!(ranker.usefulness(GroupId(1)), 2);
        assert_eq!(ranker.usefulness(GroupId(0)), 2);
    }

    #[test]
    fn test_unsupported_stacking_reported() {
        let rules = ruleset(vec![
            artillery_rule(),
            SupportRule::new("drill", "artillery", "infantry", "artillery", 1),
        ]);
        let units = roster(&[("infantry", 1), ("artillery", 1)]);
        let mut ranker = ranker(&units, &rules);

        ranker.ranking();
        assert!(!ranker.unsupported_stacking().is_empty());
    }

    #[test]
    fn test_iterator_drains_side() {
        let rules = ruleset(vec![]);
        let units = roster(&[("infantry", 2), ("tank", 1)]);
        let ranker = ranker(&units, &rules);

        assert_eq!(ranker.count(), 3);
    }
}
