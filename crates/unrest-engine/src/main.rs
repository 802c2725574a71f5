//! Turn engine binary for the unrest simulation.
//!
//! Loads a scenario, runs the configured number of turns and prints the
//! final save state as JSON on stdout. Strikes are left to run their
//! course: each turn the government waits every active strike out.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the path given as the first argument, or
//!    `unrest-config.yaml`
//! 2. Initialize structured logging (tracing) at the configured level
//! 3. Seed the nation and run the turn loop
//! 4. Log a closing outlook for every territory
//! 5. Print the save state

mod error;

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use unrest_core::{TurnInputs, TurnRunner, TurnSummary, UnrestConfig};
use unrest_types::TerritoryId;

use crate::error::EngineError;

/// Default scenario file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "unrest-config.yaml";

/// Turns ahead shown in the closing outlook.
const OUTLOOK_TURNS: u32 = 5;

/// Application entry point for the turn engine.
///
/// # Errors
///
/// Returns an error if the configuration is unreadable or invalid, or if
/// the simulation state fails verification.
fn main() -> Result<(), EngineError> {
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    // 1. Load configuration. Logging is not up yet, so note the fallback
    //    once it is.
    let (config, from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("unrest-engine starting");
    if !from_file {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        territories = config.territories.len(),
        turns = config.simulation.turns,
        seed = ?config.simulation.seed,
        "Configuration loaded"
    );

    // 3. Run the turn loop.
    let mut runner = TurnRunner::from_config(&config)?;
    let inputs = TurnInputs::default();
    for _ in 0..config.simulation.turns {
        let summary = runner.run_turn(&inputs)?;
        log_summary(&summary);
        wait_out_strikes(&mut runner);
    }

    // 4. Closing outlook.
    let ids: Vec<TerritoryId> = runner.profiles().keys().cloned().collect();
    for id in &ids {
        if let Some(outlook) = runner.territory_outlook(id, OUTLOOK_TURNS) {
            info!(
                territory = %outlook.territory_id,
                morale = outlook.morale,
                trend = ?outlook.trend,
                stability = outlook.stability,
                forecast = ?outlook.forecast,
                production_modifier = outlook.production_modifier,
                recruitment_modifier = outlook.recruitment_modifier,
                "Territory outlook"
            );
        }
    }

    // 5. Save state.
    println!("{}", runner.save_json()?);

    let stats = runner.strikes().get_statistics();
    info!(
        turn = runner.turn(),
        active_strikes = stats.total_strikes,
        halted_territories = stats.halted_territories,
        total_resolution_cost = %stats.total_resolution_cost,
        "unrest-engine shutdown complete"
    );

    Ok(())
}

/// Load the scenario at `path`, or the defaults if no file exists there.
///
/// The flag reports whether the file was read.
fn load_config(path: &Path) -> Result<(UnrestConfig, bool), EngineError> {
    if path.exists() {
        Ok((UnrestConfig::from_file(path)?, true))
    } else {
        Ok((UnrestConfig::default(), false))
    }
}

/// Let every active strike run another turn.
fn wait_out_strikes(runner: &mut TurnRunner) {
    for territory in runner.strikes().active_territories() {
        if let Some(outcome) = runner.wait_out(&territory).filter(|o| o.escalated) {
            warn!(
                territory = %territory,
                resolution_cost = %outcome.resolution_cost,
                production_penalty = outcome.production_penalty,
                "Strike escalated while waiting"
            );
        }
    }
}

/// Log the headline numbers of a finished turn.
fn log_summary(summary: &TurnSummary) {
    info!(
        turn = summary.turn,
        national_morale = summary.national.average,
        lowest = summary.national.lowest,
        volatility = summary.national.volatility,
        event_effects = summary.event_effects,
        strikes_started = summary.strikes_started.len(),
        strikes_ended = summary.strikes_ended.len(),
        active_strikes = summary.active_strikes,
        production_lost = summary.production_lost,
        "Turn complete"
    );
    for territory in &summary.critical_territories {
        warn!(turn = summary.turn, territory = %territory, "Territory morale critical");
    }
}
