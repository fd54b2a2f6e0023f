//! Game engine binary for the Chroma simulation core.
//!
//! Wires the session, the adaptive scheduler, the saver and the lux display
//! smoother together and runs until interrupted or until the configured
//! cycle limit is reached.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `chroma-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Open the configured save store
//! 4. Load the saved session, merging every key over defaults
//! 5. Apply an import bundle if `CHROMA_IMPORT_PATH` is set
//! 6. Estimate the starting performance mode and build loop control
//! 7. Register production systems and seed offline time
//! 8. Spawn the saver, display smoother and interrupt watcher
//! 9. Run the game loop
//! 10. Flush the final save, write an export if `CHROMA_EXPORT_PATH` is set

mod error;
mod feedback;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chroma_core::config::{GameConfig, LoggingConfig};
use chroma_core::control::LoopControl;
use chroma_core::display::run_display_smoother;
use chroma_core::publish::SnapshotPublisher;
use chroma_core::scheduler::{self, ModePolicy, Scheduler};
use chroma_core::session::GameSession;
use chroma_core::systems::default_systems;
use chroma_db::{SaveCadence, SaveStore, export_text, load_snapshot, parse_import, run_saver};
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::feedback::TracingSink;

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "chroma-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, the save store or a background task
/// fails.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("chroma-engine starting");
    info!(
        from_file,
        backend = ?config.persistence.backend,
        max_cycles = config.scheduler.max_cycles,
        catchup_threshold_secs = config.production.catchup_threshold_secs,
        "Configuration loaded"
    );

    // 3. Open the save store.
    let store = Arc::new(SaveStore::open(&config.persistence).await?);

    // 4. Load the saved session.
    let snapshot = load_snapshot(&*store).await?;
    let (sink, tally) = TracingSink::new();
    let mut session = GameSession::from_snapshot(snapshot, &config.production, Box::new(sink));
    info!(session_id = %session.id(), "Session restored");

    // 5. Optional import.
    if let Some(path) = env_path("CHROMA_IMPORT_PATH") {
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| bundle_error(&path, source))?;
        let bundle = parse_import(&text)?;
        session.apply_import(bundle);
        info!(path = %path.display(), "Save bundle imported");
    }

    // 6. Starting mode and loop control.
    let offline = offline_duration(session.offline_seconds(Utc::now()));
    let policy = ModePolicy::new(config.scheduler.clone());
    let mode = policy.estimate_mode(session.ledgers().upgrades.state());
    let control = Arc::new(LoopControl::new(
        mode,
        policy.interval_ms(mode),
        config.scheduler.max_cycles,
    ));
    info!(
        mode = ?mode,
        interval_ms = control.interval_ms(),
        offline_secs = offline.as_secs_f64(),
        "Loop control initialized"
    );

    // 7. Scheduler and production systems.
    let session = Arc::new(Mutex::new(session));
    let scheduler = Scheduler::new(Arc::clone(&session), policy, Arc::clone(&control));
    for system in default_systems() {
        scheduler.register_boxed(system).await;
    }
    scheduler.seed_offline(offline).await;
    info!(
        systems = scheduler.system_count().await,
        "Production systems registered"
    );

    // 8. Background tasks.
    let (mut publisher, rx) = SnapshotPublisher::channel();
    let saver = tokio::spawn(run_saver(
        Arc::clone(&store),
        rx,
        SaveCadence::from_config(&config.persistence),
    ));
    let smoother = tokio::spawn(run_display_smoother(
        Arc::clone(&session),
        Arc::clone(&control),
        config.lux.clone(),
    ));
    let interrupt = tokio::spawn(watch_interrupt(Arc::clone(&control)));

    // 9. Run the game loop.
    let summary = scheduler.run(&mut publisher).await;
    scheduler::log_loop_end(&summary);

    // 10. Shut down. Dropping the publisher lets the saver flush and exit.
    control.request_stop();
    drop(publisher);
    let saves = saver.await.map_err(|e| join_error("saver", &e))?;
    let smoothing_steps = smoother.await.map_err(|e| join_error("display", &e))?;
    interrupt.await.map_err(|e| join_error("interrupt", &e))?;

    if let Some(path) = env_path("CHROMA_EXPORT_PATH") {
        let bundle = session.lock().await.export(Utc::now());
        let text = export_text(&bundle)?;
        tokio::fs::write(&path, text)
            .await
            .map_err(|source| bundle_error(&path, source))?;
        info!(path = %path.display(), "Save bundle exported");
    }

    info!(
        end_reason = ?summary.end_reason,
        cycles = summary.cycles,
        saves = saves.saves,
        save_failures = saves.failures,
        smoothing_steps,
        pixels_produced = tally.pixels(),
        white_produced = tally.white(),
        colors_produced = tally.colors(),
        "chroma-engine shutdown complete"
    );
    Ok(())
}

/// Load configuration from [`CONFIG_PATH`], falling back to defaults.
///
/// Returns the configuration and whether it came from the file.
fn load_config() -> Result<(GameConfig, bool), EngineError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        Ok((GameConfig::from_file(path)?, true))
    } else {
        let mut config = GameConfig::default();
        config.apply_env_overrides();
        Ok((config, false))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
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

/// Stop the loop on Ctrl-C. Returns once a stop was requested either way.
async fn watch_interrupt(control: Arc<LoopControl>) {
    tokio::select! {
        biased;
        () = control.stopped() => {}
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("Interrupt received, stopping"),
                Err(e) => warn!(error = %e, "Interrupt handler failed, stopping"),
            }
            control.request_stop();
        }
    }
}

/// Offline gap as a duration. Negative or non-finite gaps count as none.
fn offline_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
}

fn env_path(var: &str) -> Option<std::path::PathBuf> {
    std::env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(Into::into)
}

fn bundle_error(path: &Path, source: std::io::Error) -> EngineError {
    EngineError::BundleFile {
        path: path.display().to_string(),
        source,
    }
}

fn join_error(task: &'static str, e: &tokio::task::JoinError) -> EngineError {
    EngineError::Task {
        task,
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_duration_rejects_bad_gaps() {
        assert_eq!(offline_duration(-3.0), Duration::ZERO);
        assert_eq!(offline_duration(f64::NAN), Duration::ZERO);
        assert_eq!(offline_duration(90.5), Duration::from_millis(90_500));
    }
}
