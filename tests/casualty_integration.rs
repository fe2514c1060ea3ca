//! Casualty selection integration tests
//!
//! Exercise the ranker, refinement and `select_casualties` together through
//! the public API with the reference combat-value provider.

use battle_odds::casualty::{select_casualties, CasualtyContext, CasualtyRanker};
use battle_odds::combat::RulesetCombatValues;
use battle_odds::core::error::OddsError;
use battle_odds::core::types::{PlayerId, Side, UnitTypeId};
use battle_odds::rules::Ruleset;
use battle_odds::units::{SupportRule, SupportSide, Unit, UnitTypeDef};

fn ruleset() -> Ruleset {
    let mut marine = UnitTypeDef::new("marine", 1, 2);
    marine.marine_bonus = 1;
    let mut raider = UnitTypeDef::new("raider", 2, 2);
    raider.marine_bonus = -1;
    let mut fighter = UnitTypeDef::new("fighter", 3, 4);
    fighter.is_air = true;
    let mut bomber = UnitTypeDef::new("bomber", 4, 1);
    bomber.is_air = true;
    bomber.hit_points = 2;

    Ruleset::new(
        [
            UnitTypeDef::new("infantry", 1, 2),
            UnitTypeDef::new("artillery", 2, 2),
            UnitTypeDef::new("tank", 3, 3),
            marine,
            raider,
            fighter,
            bomber,
        ]
        .into_iter()
        .collect(),
        [SupportRule::new("artillery", "artillery", "infantry", "artillery", 1)
            .on(SupportSide::Attack)]
        .into_iter()
        .collect(),
    )
}

fn units(unit_type: &str, n: usize) -> Vec<Unit> {
    (0..n).map(|_| Unit::new(unit_type, PlayerId(1))).collect()
}

fn type_of<'a>(roster: &'a [Unit], id: &battle_odds::core::types::UnitId) -> &'a UnitTypeId {
    &roster.iter().find(|u| &u.id == id).unwrap().unit_type
}

/// Two infantry backed by two artillery: infantry go first, and once the
/// artillery has spare capacity the supported infantry still leaves before it
#[test]
fn test_supported_pair_loses_infantry_first() {
    let rules = ruleset();
    let provider = RulesetCombatValues::new(&rules, 6);
    let mut army = units("infantry", 2);
    army.extend(units("artillery", 2));

    let mut ranker = CasualtyRanker::build(&army, &[], Side::Attacker, &provider, &rules).unwrap();
    let picks = ranker.take_casualties(3).unwrap();

    let types: Vec<&str> = picks
        .iter()
        .map(|p| type_of(&army, &p.unit).as_str())
        .collect();
    assert_eq!(types, ["infantry", "infantry", "artillery"]);
    assert_eq!(picks[0].usefulness, 2);
    assert_eq!(ranker.remaining(), 1);
}

#[test]
fn test_weakest_type_dies_without_support() {
    let rules = ruleset();
    let provider = RulesetCombatValues::new(&rules, 6);
    let mut army = units("tank", 2);
    army.extend(units("infantry", 1));

    let ctx = CasualtyContext {
        enemy: &[],
        side: Side::Defender,
        provider: &provider,
        ruleset: &rules,
    };
    let list = select_casualties(&army, 1, &ctx).unwrap();
    assert_eq!(list.killed().len(), 1);
    assert_eq!(type_of(&army, &list.killed()[0]).as_str(), "infantry");
}

#[test]
fn test_killed_air_unit_has_most_movement() {
    let rules = ruleset();
    let provider = RulesetCombatValues::new(&rules, 6);
    let army = vec![
        Unit::new("fighter", PlayerId(1)).with_movement(1),
        Unit::new("fighter", PlayerId(1)).with_movement(4),
        Unit::new("fighter", PlayerId(1)).with_movement(2),
    ];
    let ctx = CasualtyContext {
        enemy: &[],
        side: Side::Defender,
        provider: &provider,
        ruleset: &rules,
    };

    let list = select_casualties(&army, 1, &ctx).unwrap();
    assert_eq!(list.killed(), &[army[1].id]);
}

#[test]
fn test_damaged_air_unit_has_least_movement() {
    let rules = ruleset();
    let provider = RulesetCombatValues::new(&rules, 6);
    let army = vec![
        Unit::new("bomber", PlayerId(1)).with_movement(4),
        Unit::new("bomber", PlayerId(1)).with_movement(1),
    ];
    let ctx = CasualtyContext {
        enemy: &[],
        side: Side::Attacker,
        provider: &provider,
        ruleset: &rules,
    };

    let list = select_casualties(&army, 1, &ctx).unwrap();
    assert!(list.killed().is_empty());
    assert_eq!(list.damaged(), &[army[1].id]);
}

#[test]
fn test_positive_marine_bonus_keeps_amphibious_units() {
    let rules = ruleset();
    let provider = RulesetCombatValues::new(&rules, 6);
    let army = vec![
        Unit::new("marine", PlayerId(1)).amphibious(),
        Unit::new("marine", PlayerId(1)),
        Unit::new("marine", PlayerId(1)).amphibious(),
    ];
    let ctx = CasualtyContext {
        enemy: &[],
        side: Side::Attacker,
        provider: &provider,
        ruleset: &rules,
    };

    let list = select_casualties(&army, 1, &ctx).unwrap();
    assert_eq!(list.killed(), &[army[1].id]);
}

#[test]
fn test_negative_marine_bonus_loses_amphibious_units() {
    let rules = ruleset();
    let provider = RulesetCombatValues::new(&rules, 6);
    let army = vec![
        Unit::new("raider", PlayerId(1)),
        Unit::new("raider", PlayerId(1)).amphibious(),
        Unit::new("raider", PlayerId(1)),
    ];
    let ctx = CasualtyContext {
        enemy: &[],
        side: Side::Attacker,
        provider: &provider,
        ruleset: &rules,
    };

    let list = select_casualties(&army, 1, &ctx).unwrap();
    assert_eq!(list.killed(), &[army[1].id]);
}

/// A landed marine hits as hard as a tank, a walked one does not; the walked
/// marine is the cheapest loss wherever it sits in the roster
#[test]
fn test_marine_casualty_ignores_roster_order() {
    let mut marine = UnitTypeDef::new("marine", 1, 2);
    marine.marine_bonus = 2;
    marine.cost = 3;
    let mut tank = UnitTypeDef::new("tank", 3, 3);
    tank.cost = 2;
    let rules = Ruleset::new([marine, tank].into_iter().collect(), Default::default());
    let provider = RulesetCombatValues::new(&rules, 6);

    let landed = Unit::new("marine", PlayerId(1)).amphibious();
    let walked = Unit::new("marine", PlayerId(1));
    let tank = Unit::new("tank", PlayerId(1));
    let ctx = CasualtyContext {
        enemy: &[],
        side: Side::Attacker,
        provider: &provider,
        ruleset: &rules,
    };

    for army in [
        vec![landed.clone(), walked.clone(), tank.clone()],
        vec![walked.clone(), landed.clone(), tank.clone()],
        vec![tank.clone(), landed.clone(), walked.clone()],
    ] {
        let list = select_casualties(&army, 1, &ctx).unwrap();
        assert_eq!(list.killed(), &[walked.id]);
    }
}

#[test]
fn test_every_hit_is_accounted_for() {
    let rules = ruleset();
    let provider = RulesetCombatValues::new(&rules, 6);
    let mut army = units("bomber", 2);
    army.extend(units("infantry", 3));
    let ctx = CasualtyContext {
        enemy: &[],
        side: Side::Defender,
        provider: &provider,
        ruleset: &rules,
    };

    // 2 damage on the bombers, then 3 kills
    let list = select_casualties(&army, 5, &ctx).unwrap();
    assert_eq!(list.hits_absorbed(), 5);
    assert_eq!(list.damaged().len(), 2);
    assert_eq!(list.killed().len(), 3);

    let mut survivors = army.clone();
    list.apply_to(&mut survivors);
    assert_eq!(survivors.len(), 2);
}

#[test]
fn test_too_many_hits_rejected() {
    let rules = ruleset();
    let provider = RulesetCombatValues::new(&rules, 6);
    let army = units("infantry", 2);
    let ctx = CasualtyContext {
        enemy: &[],
        side: Side::Defender,
        provider: &provider,
        ruleset: &rules,
    };

    let err = select_casualties(&army, 3, &ctx).unwrap_err();
    assert!(matches!(
        err,
        OddsError::InsufficientUnits {
            requested: 3,
            available: 2
        }
    ));
}

#[test]
fn test_zero_hits_selects_nothing() {
    let rules = ruleset();
    let provider = RulesetCombatValues::new(&rules, 6);
    let army = units("tank", 3);
    let ctx = CasualtyContext {
        enemy: &[],
        side: Side::Attacker,
        provider: &provider,
        ruleset: &rules,
    };

    assert!(select_casualties(&army, 0, &ctx).unwrap().is_empty());
}
