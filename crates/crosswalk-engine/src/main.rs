//! Headless engine binary for the Crosswalk simulation.
//!
//! Loads configuration, drives one session at the configured frame rate with
//! a stand-in player, and writes the decision log to the export path.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `crosswalk-config.yaml` (or `CROSSWALK_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the session, input gateway, and player
//! 4. Run the frame loop until the finish line or the frame limit
//! 5. Log the decision log and how it compares with the reference splits
//!
//! # Environment
//!
//! - `CROSSWALK_CONFIG`: path to the YAML configuration
//! - `CROSSWALK_PLAYER`: `idle` (default), `left`, `right`, or `random`
//! - `CROSSWALK_SEED`: seed for the random player
//! - `RUST_LOG`: log filter, overriding `logging.level`

mod error;
mod player;
mod progress;

use std::path::PathBuf;

use crosswalk_core::clock::{SystemTimeSource, TimeSource};
use crosswalk_core::config::{LoggingConfig, SimulationConfig};
use crosswalk_core::export::{JsonFileExporter, ResultsSummary};
use crosswalk_core::gateway::InputGateway;
use crosswalk_core::runner::{self, RunBounds};
use crosswalk_core::session::Session;
use rand::Rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::player::PlayerKind;
use crate::progress::ProgressCallback;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "crosswalk-config.yaml";

/// Frames between progress lines (one per second at 60 fps).
const PROGRESS_EVERY_FRAMES: u64 = 60;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, session setup, or the run fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so report where the
    //    config came from once it is.
    let (config, config_source) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(source = %config_source, "crosswalk-engine starting");

    // 3-5. Build, run, and report.
    run(&config).await?;
    Ok(())
}

/// Build the session and its collaborators, run it, and log the results.
///
/// # Errors
///
/// Returns [`EngineError`] if the player selection, the session, or the
/// run bounds are invalid.
async fn run(config: &SimulationConfig) -> Result<(), EngineError> {
    // 3. Build the session and its collaborators.
    let mut session = build_session(config, SystemTimeSource::new())?;
    let gateway = InputGateway::new(&config.input);
    let player_kind = match std::env::var("CROSSWALK_PLAYER") {
        Ok(value) => value.parse::<PlayerKind>()?,
        Err(_) => PlayerKind::Idle,
    };
    let seed = std::env::var("CROSSWALK_SEED")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or_else(|| rand::rng().random());
    let mut player = player_kind.build(session.controller().encounter_count(), seed);
    let mut exporter = JsonFileExporter::new(&config.export.path);
    let mut callback = ProgressCallback::new(PROGRESS_EVERY_FRAMES);
    let bounds = RunBounds::from_config(config);
    info!(
        session_id = %session.id(),
        player = ?player_kind,
        seed,
        encounters = session.controller().encounter_count(),
        export_path = %exporter.path().display(),
        "Session assembled, entering frame loop"
    );

    // 4. Run.
    let result = runner::run_session(
        &mut session,
        &gateway,
        player.as_mut(),
        &mut exporter,
        &mut callback,
        &bounds,
    )
    .await?;

    // 5. Report.
    runner::log_session_end(&result);
    let summary = ResultsSummary::build(&result.history, &config.effective_scenarios());
    info!(
        windows_opened = callback.windows_opened(),
        majority_agreements = summary.majority_agreements,
        comparable = summary.comparable,
        "Results summary"
    );
    match serde_json::to_string(&summary) {
        Ok(json) => info!(summary = %json, "Results summary detail"),
        Err(e) => warn!(error = %e, "Failed to serialize results summary"),
    }

    info!(
        end_reason = ?result.end_reason,
        frames = result.frames,
        "crosswalk-engine shutdown complete"
    );
    Ok(())
}

/// Build a session on `time`, surfacing construction failures as
/// [`EngineError::Session`].
fn build_session<T: TimeSource>(
    config: &SimulationConfig,
    time: T,
) -> Result<Session<T>, EngineError> {
    Ok(Session::new(config, time)?)
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level; `logging.json` switches to
/// JSON lines.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load the simulation configuration.
///
/// Uses `CROSSWALK_CONFIG` if set, otherwise `crosswalk-config.yaml` in the
/// working directory. A missing default file means built-in defaults.
fn load_config() -> Result<(SimulationConfig, String), EngineError> {
    let explicit = std::env::var("CROSSWALK_CONFIG").ok().map(PathBuf::from);
    let is_explicit = explicit.is_some();
    let path = explicit.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    if is_explicit || path.exists() {
        let config = SimulationConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides();
        Ok((config, "built-in defaults".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use crosswalk_core::clock::ManualTimeSource;

    use super::*;

    #[test]
    fn invalid_clock_config_is_a_session_error() {
        let mut config = SimulationConfig::default();
        config.clock.target_fps = 0;
        let result = build_session(&config, ManualTimeSource::new());
        assert!(matches!(result, Err(EngineError::Session { .. })));
    }

    #[test]
    fn default_config_builds_a_session() {
        let result = build_session(&SimulationConfig::default(), ManualTimeSource::new());
        assert!(result.is_ok_and(|session| session.controller().encounter_count() == 6));
    }
}
