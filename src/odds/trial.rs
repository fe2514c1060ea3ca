//! One randomized playthrough of a hypothetical battle

use rand::Rng;
use tracing::debug;

use crate::casualty::{hit_capacity, select_casualties, CasualtyContext};
use crate::combat::{roll_hits, CombatValueProvider, SupportMode};
use crate::core::config::RetreatPolicy;
use crate::core::error::{OddsError, Result};
use crate::core::types::{Side, Winner};
use crate::rules::Ruleset;
use crate::units::{Roster, Unit};

/// Inputs shared by every trial of a batch
#[derive(Clone, Copy)]
pub struct TrialSetup<'a> {
    pub attackers: &'a [Unit],
    pub defenders: &'a [Unit],
    pub provider: &'a dyn CombatValueProvider,
    pub ruleset: &'a Ruleset,
    pub max_rounds: u32,
    pub retreat: &'a RetreatPolicy,
}

/// Final state of one trial
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub winner: Winner,
    pub rounds: u32,
    pub attackers_left: Roster,
    pub defenders_left: Roster,
    /// Cost of the units each side lost
    pub attacker_value_lost: u64,
    pub defender_value_lost: u64,
    pub timed_out: bool,
    pub retreated: bool,
}

fn roster_value(units: &[Unit], ruleset: &Ruleset) -> Result<u64> {
    let mut value = 0u64;
    for unit in units {
        value += ruleset.unit_type(unit)?.cost as u64;
    }
    Ok(value)
}

/// Fight one battle to the end on private copies of both rosters
///
/// Each round both sides roll against their pre-round strength, pick
/// casualties for the hits they took, and remove them together. The battle
/// ends when a side is wiped out, the attacker retreats (a defender win), or
/// the round cap is reached (undecided).
pub fn run_trial<R: Rng>(setup: &TrialSetup<'_>, rng: &mut R) -> Result<TrialOutcome> {
    let mut attackers: Roster = setup.attackers.to_vec();
    let mut defenders: Roster = setup.defenders.to_vec();
    let mut rounds = 0;
    let mut timed_out = false;
    let mut retreated = false;

    while !attackers.is_empty() && !defenders.is_empty() {
        if rounds >= setup.max_rounds {
            timed_out = true;
            let capped = OddsError::SimulationTimeout { rounds };
            debug!(error = %capped, "trial stopped at round cap");
            break;
        }
        rounds += 1;

        let attack =
            setup
                .provider
                .evaluate(&attackers, &defenders, Side::Attacker, SupportMode::Full)?;
        let defense =
            setup
                .provider
                .evaluate(&defenders, &attackers, Side::Defender, SupportMode::Full)?;
        let attacker_hits = roll_hits(&attackers, &attack, rng);
        let defender_hits = roll_hits(&defenders, &defense, rng);

        let defender_casualties = select_casualties(
            &defenders,
            attacker_hits.min(hit_capacity(&defenders, setup.ruleset)?),
            &CasualtyContext {
                enemy: &attackers,
                side: Side::Defender,
                provider: setup.provider,
                ruleset: setup.ruleset,
            },
        )?;
        let attacker_casualties = select_casualties(
            &attackers,
            defender_hits.min(hit_capacity(&attackers, setup.ruleset)?),
            &CasualtyContext {
                enemy: &defenders,
                side: Side::Attacker,
                provider: setup.provider,
                ruleset: setup.ruleset,
            },
        )?;

        defender_casualties.apply_to(&mut defenders);
        attacker_casualties.apply_to(&mut attackers);

        if !attackers.is_empty()
            && !defenders.is_empty()
            && setup.retreat.should_retreat(rounds, attackers.len())
        {
            retreated = true;
            break;
        }
    }

    let winner = match (attackers.is_empty(), defenders.is_empty()) {
        (true, true) => Winner::Draw,
        (false, true) => Winner::Attacker,
        (true, false) => Winner::Defender,
        (false, false) if retreated => Winner::Defender,
        (false, false) => Winner::Undecided,
    };

    let attacker_value_lost = roster_value(setup.attackers, setup.ruleset)?
        .saturating_sub(roster_value(&attackers, setup.ruleset)?);
    let defender_value_lost = roster_value(setup.defenders, setup.ruleset)?
        .saturating_sub(roster_value(&defenders, setup.ruleset)?);

    Ok(TrialOutcome {
        winner,
        rounds,
        attackers_left: attackers,
        defenders_left: defenders,
        attacker_value_lost,
        defender_value_lost,
        timed_out,
        retreated,
    })
}
