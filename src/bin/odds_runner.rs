//! Headless Odds Runner
//!
//! Loads a battle scenario, runs both estimators and prints the odds.

use std::path::PathBuf;
use std::process::ExitCode;

use battle_odds::combat::RulesetCombatValues;
use battle_odds::core::error::Result;
use battle_odds::core::types::Winner;
use battle_odds::odds::{predict_outcome, AnalyticalOutcome, OddsSummary, StochasticEstimator};
use battle_odds::rules::load_scenario;
use clap::Parser;
use serde::Serialize;

/// Headless Odds Runner - estimate a battle from a scenario file
#[derive(Parser, Debug)]
#[command(name = "odds_runner")]
#[command(about = "Estimate battle odds for a scenario with the analytical and stochastic models")]
struct Args {
    /// Scenario TOML file (see data/scenarios/)
    #[arg(long)]
    scenario: PathBuf,

    /// Number of stochastic trials (overrides the scenario config)
    #[arg(long)]
    trials: Option<usize>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Attrition factor for the analytical estimate, in (0, 1]
    #[arg(long)]
    attrition: Option<f64>,

    /// Worker threads for trials
    #[arg(long)]
    threads: Option<usize>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

/// JSON output structure
#[derive(Serialize)]
struct OddsResult {
    scenario: String,
    attackers: usize,
    defenders: usize,
    analytical: AnalyticalOutcome,
    simulated: OddsSummary,
    cancelled: bool,
    seed: u64,
}

fn run(args: &Args) -> Result<OddsResult> {
    let scenario = load_scenario(&args.scenario)?;
    let mut config = scenario.config.clone();
    if let Some(trials) = args.trials {
        config.trial_count = trials;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(attrition) = args.attrition {
        config.attrition_factor = attrition;
    }
    if args.threads.is_some() {
        config.worker_threads = args.threads;
    }

    let provider = RulesetCombatValues::new(&scenario.ruleset, config.dice_sides);
    let analytical = predict_outcome(
        &scenario.attackers,
        &scenario.defenders,
        &provider,
        config.attrition_factor,
    )?;
    let report = StochasticEstimator::new().with_config(config).run(
        &scenario.attackers,
        &scenario.defenders,
        &provider,
        &scenario.ruleset,
    )?;

    Ok(OddsResult {
        scenario: scenario.name,
        attackers: scenario.attackers.len(),
        defenders: scenario.defenders.len(),
        analytical,
        simulated: report.results.summary(),
        cancelled: report.cancelled,
        seed: report.seed,
    })
}

fn print_text(result: &OddsResult) {
    let sim = &result.simulated;
    println!("Battle Odds: {}", result.scenario);
    println!("=============");
    println!("Attackers: {}  Defenders: {}", result.attackers, result.defenders);
    println!();
    let winner = match result.analytical.winner {
        Winner::Attacker => "attacker",
        Winner::Defender => "defender",
        Winner::Draw => "draw",
        Winner::Undecided => "undecided",
    };
    println!(
        "Analytical: {} with {} units left",
        winner, result.analytical.expected_remaining_units
    );
    println!();
    println!("Simulated ({} trials, {} failed)", sim.trials, sim.failed_trials);
    println!("Attacker wins: {:.1}%", sim.attacker_win_rate * 100.0);
    println!("Defender wins: {:.1}%", sim.defender_win_rate * 100.0);
    println!("Draws: {:.1}%", sim.draw_rate * 100.0);
    println!("Undecided: {:.1}%", sim.undecided_rate * 100.0);
    println!("Average rounds: {:.2}", sim.avg_rounds);
    println!(
        "Average units left: attacker {:.2}, defender {:.2}",
        sim.attacker_avg_units_left, sim.defender_avg_units_left
    );
    println!(
        "Average value lost: attacker {:.1}, defender {:.1}",
        sim.attacker_avg_value_lost, sim.defender_avg_value_lost
    );
    for (unit_type, avg) in &sim.attacker_avg_survivors {
        println!("  attacker {}: {:.2}", unit_type, avg);
    }
    for (unit_type, avg) in &sim.defender_avg_survivors {
        println!("  defender {}: {:.2}", unit_type, avg);
    }
    if result.cancelled {
        println!("(cancelled early)");
    }
    println!();
    println!("Seed: {}", result.seed);
}

fn print_json(result: &OddsResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("battle_odds=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let outcome = run(&args).and_then(|result| match args.format.as_str() {
        "text" => {
            print_text(&result);
            Ok(())
        }
        "json" => print_json(&result),
        other => {
            eprintln!("Unknown format '{}', defaulting to json", other);
            print_json(&result)
        }
    });

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "odds run failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
