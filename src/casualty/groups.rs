//! Unit groups and the support graph between them
//!
//! One side's units are partitioned into groups sharing (owner, unit type).
//! Groups live in an arena indexed by [`GroupId`]; support relations are
//! adjacency lists of edge indices. Removing a unit bumps the arena
//! generation so cached valuations can be recognised as stale.

use std::collections::BTreeMap;

use ahash::AHashMap;
use tracing::debug;

use crate::casualty::refinement::{order_candidates, Fate};
use crate::combat::CombatValueSnapshot;
use crate::core::error::Result;
use crate::core::types::{PlayerId, Side, UnitId, UnitTypeId};
use crate::rules::Ruleset;
use crate::units::{BonusCategory, RuleId, Unit};

/// Index of a group inside its arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub usize);

/// Units of one side sharing owner and unit type
///
/// Members are kept in the order refinement kills them, so the group is
/// always valued by the unit it would actually lose next.
#[derive(Debug, Clone)]
pub struct UnitGroup {
    pub id: GroupId,
    pub owner: PlayerId,
    pub unit_type: UnitTypeId,
    pub cost: u32,
    members: Vec<UnitId>,
    /// `StaticOnly` power of each member, indexed like `members`
    powers: Vec<i64>,
}

impl UnitGroup {
    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Remaining units, next casualty first
    pub fn members(&self) -> &[UnitId] {
        &self.members
    }

    /// Power of the next casualty, without dynamic support (0 when empty)
    pub fn base_power(&self) -> i64 {
        self.powers.first().copied().unwrap_or(0)
    }
}

/// Directed support relation between two groups for one bonus category
#[derive(Debug, Clone)]
pub struct SupportEdge {
    pub giver: GroupId,
    pub receiver: GroupId,
    pub category: BonusCategory,
    pub rules: Vec<RuleId>,
    /// Bonus of the single providing rule; multi-rule edges are unsupported
    pub bonus: i64,
}

/// Direction of a support relation, seen from the group being valued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SupportDirection {
    Given,
    Received,
}

/// A category whose support comes from several groups or several rules at once
///
/// How such bonuses should combine is not defined, so they count as zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnsupportedStacking {
    pub group: GroupId,
    pub category: BonusCategory,
    pub direction: SupportDirection,
    /// Distinct partner groups for the category
    pub partners: usize,
    /// Rules across those partners
    pub rules: usize,
}

/// Outcome of valuing one group against the current group sizes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupValuation {
    pub base_power: i64,
    pub given: i64,
    pub received: i64,
    pub unsupported: Vec<UnsupportedStacking>,
}

impl GroupValuation {
    pub fn usefulness(&self) -> i64 {
        self.base_power + self.given + self.received
    }
}

/// Arena of one side's groups plus their support graph
#[derive(Debug, Clone, Default)]
pub struct GroupArena {
    groups: Vec<UnitGroup>,
    edges: Vec<SupportEdge>,
    given: Vec<Vec<usize>>,
    received: Vec<Vec<usize>>,
    generation: u64,
}

impl GroupArena {
    /// Partition `units` into groups and link them by the side's support rules
    ///
    /// `values` should come from a `StaticOnly` evaluation so dynamic support
    /// is not counted twice.
    pub fn build(
        units: &[Unit],
        values: &CombatValueSnapshot,
        ruleset: &Ruleset,
        side: Side,
    ) -> Result<Self> {
        let mut arena = Self::default();
        let mut index: AHashMap<(PlayerId, &UnitTypeId), usize> = AHashMap::new();
        let mut grouped: Vec<Vec<&Unit>> = Vec::new();

        for unit in units {
            ruleset.unit_type(unit)?;
            let key = (unit.owner, &unit.unit_type);
            let slot = *index.entry(key).or_insert_with(|| {
                grouped.push(Vec::new());
                grouped.len() - 1
            });
            grouped[slot].push(unit);
        }

        for mut members in grouped {
            let Some(first) = members.first().copied() else {
                continue;
            };
            let def = ruleset.unit_type(first)?;
            order_candidates(&mut members, def, Fate::Kill);
            arena.groups.push(UnitGroup {
                id: GroupId(arena.groups.len()),
                owner: first.owner,
                unit_type: first.unit_type.clone(),
                cost: def.cost,
                powers: members.iter().map(|u| values.power(&u.id) as i64).collect(),
                members: members.iter().map(|u| u.id).collect(),
            });
        }

        arena.given = vec![Vec::new(); arena.groups.len()];
        arena.received = vec![Vec::new(); arena.groups.len()];

        let mut edge_index: AHashMap<(GroupId, GroupId, BonusCategory), usize> = AHashMap::new();
        for giver in &arena.groups {
            for receiver in &arena.groups {
                if giver.id == receiver.id {
                    continue;
                }
                for (rule_id, rule) in
                    ruleset.support.between(&giver.unit_type, &receiver.unit_type, side)
                {
                    let key = (giver.id, receiver.id, rule.category.clone());
                    match edge_index.get(&key) {
                        Some(&e) => arena.edges[e].rules.push(rule_id),
                        None => {
                            edge_index.insert(key, arena.edges.len());
                            arena.edges.push(SupportEdge {
                                giver: giver.id,
                                receiver: receiver.id,
                                category: rule.category.clone(),
                                rules: vec![rule_id],
                                bonus: rule.bonus as i64,
                            });
                        }
                    }
                }
            }
        }

        for (e, edge) in arena.edges.iter().enumerate() {
            arena.given[edge.giver.0].push(e);
            arena.received[edge.receiver.0].push(e);
        }

        debug!(
            groups = arena.groups.len(),
            edges = arena.edges.len(),
            ?side,
            "built casualty groups"
        );

        Ok(arena)
    }

    pub fn groups(&self) -> &[UnitGroup] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> &UnitGroup {
        &self.groups[id.0]
    }

    pub fn edges(&self) -> &[SupportEdge] {
        &self.edges
    }

    /// Bumped on every removal
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Units left across all groups
    pub fn unit_count(&self) -> usize {
        self.groups.iter().map(UnitGroup::size).sum()
    }

    /// Groups that still have units, in arena order
    pub fn live_groups(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.groups.iter().filter(|g| !g.is_empty()).map(|g| g.id)
    }

    /// Remove the next unit of a group
    pub fn remove_one(&mut self, id: GroupId) -> Option<UnitId> {
        let group = self.groups.get_mut(id.0)?;
        if group.members.is_empty() {
            return None;
        }
        let unit = group.members.remove(0);
        group.powers.remove(0);
        self.generation += 1;
        Some(unit)
    }

    pub fn base_power(&self, id: GroupId) -> i64 {
        self.group(id).base_power()
    }

    /// Support the group receives in full from its single giver per category
    pub fn fully_received_support(&self, id: GroupId) -> i64 {
        self.covered_support(id, SupportDirection::Received, &mut Vec::new())
    }

    /// Support the group gives in full to its single receiver per category
    pub fn fully_given_support(&self, id: GroupId) -> i64 {
        self.covered_support(id, SupportDirection::Given, &mut Vec::new())
    }

    /// `base_power + fully_given_support + fully_received_support`
    pub fn usefulness(&self, id: GroupId) -> i64 {
        self.valuation(id).usefulness()
    }

    /// Value a group against the current sizes of every group
    pub fn valuation(&self, id: GroupId) -> GroupValuation {
        let mut unsupported = Vec::new();
        let given = self.covered_support(id, SupportDirection::Given, &mut unsupported);
        let received = self.covered_support(id, SupportDirection::Received, &mut unsupported);
        GroupValuation {
            base_power: self.base_power(id),
            given,
            received,
            unsupported,
        }
    }

    /// Sum per-category bonuses whose partner side fully covers this group
    ///
    /// A category counts only when exactly one non-empty partner group
    /// provides it through exactly one rule, and the partners' combined size
    /// is at least this group's size.
    fn covered_support(
        &self,
        id: GroupId,
        direction: SupportDirection,
        unsupported: &mut Vec<UnsupportedStacking>,
    ) -> i64 {
        let size = self.group(id).size();
        let adjacency = match direction {
            SupportDirection::Given => &self.given[id.0],
            SupportDirection::Received => &self.received[id.0],
        };

        let mut by_category: BTreeMap<&BonusCategory, Vec<&SupportEdge>> = BTreeMap::new();
        for &e in adjacency {
            let edge = &self.edges[e];
            let partner = match direction {
                SupportDirection::Given => edge.receiver,
                SupportDirection::Received => edge.giver,
            };
            if self.group(partner).is_empty() {
                continue;
            }
            by_category.entry(&edge.category).or_default().push(edge);
        }

        let mut total = 0;
        for (category, edges) in by_category {
            let rules: usize = edges.iter().map(|e| e.rules.len()).sum();
            if edges.len() != 1 || rules != 1 {
                unsupported.push(UnsupportedStacking {
                    group: id,
                    category: category.clone(),
                    direction,
                    partners: edges.len(),
                    rules,
                });
                continue;
            }

            let edge = edges[0];
            let partner = match direction {
                SupportDirection::Given => edge.receiver,
                SupportDirection::Received => edge.giver,
            };
            if self.group(partner).size() >= size {
                total += edge.bonus;
            }
        }
        total
    }
}
