//! Support rules: units of one type granting a bonus or malus to another
//!
//! The table maps provider type -> receiver type -> bonus category -> amount.
//! Categories exist so that several rules describing the same mechanical
//! effect are not summed twice.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::{Side, UnitTypeId};

/// Named class of support bonus
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BonusCategory(pub String);

impl From<&str> for BonusCategory {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for BonusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Battle roles a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportSide {
    Attack,
    Defense,
    #[default]
    Both,
}

impl SupportSide {
    pub fn applies_to(self, side: Side) -> bool {
        matches!(
            (self, side),
            (SupportSide::Both, _)
                | (SupportSide::Attack, Side::Attacker)
                | (SupportSide::Defense, Side::Defender)
        )
    }
}

/// Index of a rule inside its `SupportTable`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleId(pub usize);

/// One configured support relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportRule {
    pub name: String,
    pub provider: UnitTypeId,
    pub receiver: UnitTypeId,
    pub category: BonusCategory,
    /// Signed power modifier granted to each supported unit
    pub bonus: i32,
    #[serde(default)]
    pub side: SupportSide,
}

impl SupportRule {
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<UnitTypeId>,
        receiver: impl Into<UnitTypeId>,
        category: impl Into<BonusCategory>,
        bonus: i32,
    ) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            receiver: receiver.into(),
            category: category.into(),
            bonus,
            side: SupportSide::Both,
        }
    }

    pub fn on(mut self, side: SupportSide) -> Self {
        self.side = side;
        self
    }
}

impl From<String> for BonusCategory {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// All support rules of a ruleset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupportTable {
    rules: Vec<SupportRule>,
}

impl SupportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: SupportRule) -> RuleId {
        self.rules.push(rule);
        RuleId(self.rules.len() - 1)
    }

    pub fn get(&self, id: RuleId) -> Option<&SupportRule> {
        self.rules.get(id.0)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Rules that apply to the given battle role, with their ids
    pub fn rules_for(&self, side: Side) -> impl Iterator<Item = (RuleId, &SupportRule)> {
        self.rules
            .iter()
            .enumerate()
            .filter(move |(_, rule)| rule.side.applies_to(side))
            .map(|(i, rule)| (RuleId(i), rule))
    }

    /// Rules by which `provider` supports `receiver` in the given role
    pub fn between<'a>(
        &'a self,
        provider: &'a UnitTypeId,
        receiver: &'a UnitTypeId,
        side: Side,
    ) -> impl Iterator<Item = (RuleId, &'a SupportRule)> + 'a {
        self.rules_for(side)
            .filter(move |(_, rule)| &rule.provider == provider && &rule.receiver == receiver)
    }
}

impl FromIterator<SupportRule> for SupportTable {
    fn from_iter<I: IntoIterator<Item = SupportRule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_filter() {
        let table: SupportTable = [
            SupportRule::new("artillery", "artillery", "infantry", "artillery", 1)
                .on(SupportSide::Attack),
            SupportRule::new("aa-cover", "fighter", "tank", "air-cover", 1)
                .on(SupportSide::Defense),
        ]
        .into_iter()
        .collect();

        let attack: Vec<_> = table.rules_for(Side::Attacker).map(|(id, _)| id).collect();
        let defense: Vec<_> = table.rules_for(Side::Defender).map(|(id, _)| id).collect();

        assert_eq!(attack, vec![RuleId(0)]);
        assert_eq!(defense, vec![RuleId(1)]);
    }

    #[test]
    fn test_between_lookup() {
        let mut table = SupportTable::new();
        let id = table.push(SupportRule::new("artillery", "artillery", "infantry", "artillery", 1));

        let provider = UnitTypeId::from("artillery");
        let receiver = UnitTypeId::from("infantry");
        let found: Vec<_> = table.between(&provider, &receiver, Side::Defender).collect();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, id);
        assert_eq!(table.between(&receiver, &provider, Side::Attacker).count(), 0);
    }
}
