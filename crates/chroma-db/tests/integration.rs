//! Integration tests for the `chroma-db` save layer.
//!
//! File and memory tests run everywhere. The `Dragonfly` tests need a live
//! instance and are marked `#[ignore]`:
//!
//! ```bash
//! docker compose up -d dragonfly
//! cargo test -p chroma-db -- --ignored
//! ```

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use chroma_core::config::{PersistenceConfig, ProductionConfig, StoreBackend};
use chroma_core::feedback::NoOpSink;
use chroma_core::publish::SnapshotPublisher;
use chroma_core::scheduler::{CycleObserver, CycleReport};
use chroma_core::production::TickPath;
use chroma_core::session::GameSession;
use chroma_db::{
    DragonflyStore, FileStore, KeyValueStore, SaveCadence, SaveKey, SaveStore, clear_all,
    export_text, load_snapshot, parse_import, run_saver, save_snapshot,
};
use chroma_types::{Channel, PerformanceMode, PixelState, SessionSnapshot};
use uuid::Uuid;

const DRAGONFLY_URL: &str = "redis://localhost:6379";

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("chroma-db-it-{}", Uuid::new_v4()))
}

fn session_with_white(white: u64) -> GameSession {
    let snapshot = SessionSnapshot {
        pixels: PixelState {
            red: 4,
            green: 4,
            blue: 4,
            white,
            lifetime_white: white,
        },
        ..SessionSnapshot::default()
    };
    GameSession::from_snapshot(snapshot, &ProductionConfig::default(), Box::new(NoOpSink))
}

fn report(cycle: u64) -> CycleReport {
    CycleReport {
        cycle,
        dt: 0.1,
        path: TickPath::Iterative,
        production: 0.0,
        previous_mode: PerformanceMode::Normal,
        mode: PerformanceMode::Normal,
        interval_changed: false,
        faults: Vec::new(),
    }
}

// =============================================================================
// File store
// =============================================================================

#[tokio::test]
async fn session_survives_a_restart_through_the_file_store() {
    let dir = scratch_dir();
    let mut session = session_with_white(25);
    session.click(Channel::Green);
    let before = session.snapshot();

    {
        let store = FileStore::open(&dir).await.unwrap();
        save_snapshot(&store, &before).await.unwrap();
    }

    let store = FileStore::open(&dir).await.unwrap();
    for key in SaveKey::ALL {
        assert!(store.get(key.as_str()).await.unwrap().is_some(), "{key:?} missing");
    }
    let loaded = load_snapshot(&store).await.unwrap();
    assert_eq!(loaded, before);

    let restored =
        GameSession::from_snapshot(loaded, &ProductionConfig::default(), Box::new(NoOpSink));
    assert_eq!(restored.snapshot().pixels, before.pixels);
    assert_eq!(restored.snapshot().game_stats.total_clicks, 1);

    clear_all(&store).await.unwrap();
    assert_eq!(load_snapshot(&store).await.unwrap(), SessionSnapshot::default());
    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn configured_file_backend_round_trips_through_saver() {
    let dir = scratch_dir();
    let config = PersistenceConfig {
        backend: StoreBackend::File,
        save_dir: dir.clone(),
        ..PersistenceConfig::default()
    };
    let store = Arc::new(SaveStore::open(&config).await.unwrap());
    assert_eq!(store.name(), "file");

    let (mut publisher, rx) = SnapshotPublisher::channel();
    let saver = tokio::spawn(run_saver(
        Arc::clone(&store),
        rx,
        SaveCadence::from_config(&config),
    ));

    let mut session = session_with_white(10);
    for cycle in 1..=3 {
        session.click(Channel::Red);
        publisher.on_cycle(&report(cycle), &session);
    }
    drop(publisher);

    let summary = saver.await.unwrap();
    assert!(summary.saves >= 1);
    assert_eq!(summary.failures, 0);

    let loaded = load_snapshot(&*store).await.unwrap();
    assert_eq!(loaded.game_stats.total_clicks, 3);
    assert_eq!(loaded.pixels.red, 7);
    let _ = tokio::fs::remove_dir_all(&dir).await;
}

// =============================================================================
// Export / import
// =============================================================================

#[test]
fn exported_session_imports_into_a_fresh_one() {
    let mut source = session_with_white(33);
    source.click(Channel::Blue);
    let text = export_text(&source.export(Utc::now())).unwrap();

    let bundle = parse_import(&text).unwrap();
    let mut target = GameSession::new(&ProductionConfig::default(), Box::new(NoOpSink));
    let epoch = target.reset_epoch();
    target.apply_import(bundle);

    assert_eq!(target.snapshot().pixels, source.snapshot().pixels);
    assert_eq!(target.snapshot().game_stats.total_clicks, 1);
    assert!(target.reset_epoch() > epoch);
}

#[test]
fn rejected_import_leaves_session_untouched() {
    let mut session = session_with_white(5);
    let before = session.snapshot();
    let result = parse_import(r#"{"version": 1, "pixels": {}}"#);
    assert!(result.is_err());
    if let Ok(bundle) = result {
        session.apply_import(bundle);
    }
    assert_eq!(session.snapshot().pixels, before.pixels);
}

// =============================================================================
// Dragonfly
// =============================================================================

#[tokio::test]
#[ignore = "requires live Dragonfly instance (docker compose up -d dragonfly)"]
async fn dragonfly_snapshot_round_trip() {
    let prefix = format!("chroma-test-{}", Uuid::new_v4());
    let store = DragonflyStore::connect(DRAGONFLY_URL, &prefix)
        .await
        .expect("Failed to connect to Dragonfly");

    let snapshot = session_with_white(12).snapshot();
    save_snapshot(&store, &snapshot).await.unwrap();
    assert_eq!(load_snapshot(&store).await.unwrap(), snapshot);

    clear_all(&store).await.unwrap();
    assert!(store.get(SaveKey::Pixels.as_str()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance (docker compose up -d dragonfly)"]
async fn dragonfly_keys_are_namespaced() {
    let prefix = format!("chroma-test-{}", Uuid::new_v4());
    let store = DragonflyStore::connect(DRAGONFLY_URL, &prefix)
        .await
        .expect("Failed to connect to Dragonfly");
    assert_eq!(store.namespaced("lux"), format!("{prefix}:lux"));

    store.set("lux", r#"{"amount": 3.0}"#).await.unwrap();
    let loaded = load_snapshot(&store).await.unwrap();
    assert!((loaded.lux.amount - 3.0).abs() < f64::EPSILON);
    store.remove("lux").await.unwrap();
}
