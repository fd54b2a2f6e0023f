//! Background saver.
//!
//! The saver owns the receiving end of the snapshot channel and writes the
//! newest snapshot at most once per mode-dependent interval: every second
//! in normal mode, less often as production climbs. Snapshots published
//! inside the interval replace each other, so only the newest one is ever
//! written. When the publisher is dropped the saver flushes whatever is
//! still pending and returns.
//!
//! A failed write is logged and counted; the next snapshot retries.

use std::sync::Arc;
use std::time::Duration;

use chroma_core::config::{ModeDurations, PersistenceConfig};
use chroma_core::publish::SnapshotReceiver;
use chroma_types::{PerformanceMode, PublishedSnapshot};
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::persistence::save_snapshot;
use crate::store::KeyValueStore;

/// Minimum gap between saves, per performance mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveCadence {
    intervals: ModeDurations,
}

impl SaveCadence {
    /// Cadence from explicit per-mode durations.
    pub const fn new(intervals: ModeDurations) -> Self {
        Self { intervals }
    }

    /// Cadence from the persistence section of the configuration.
    pub const fn from_config(config: &PersistenceConfig) -> Self {
        Self::new(config.save_intervals)
    }

    /// Minimum gap in `mode`.
    pub const fn interval(&self, mode: PerformanceMode) -> Duration {
        Duration::from_millis(self.intervals.get(mode))
    }
}

/// What the saver did over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaverSummary {
    /// Snapshots written.
    pub saves: u64,
    /// Writes that failed.
    pub failures: u64,
    /// Snapshots replaced by a newer one before they were written.
    pub superseded: u64,
}

/// Write published snapshots until the publisher goes away.
pub async fn run_saver<S: KeyValueStore>(
    store: Arc<S>,
    mut rx: SnapshotReceiver,
    cadence: SaveCadence,
) -> SaverSummary {
    info!("Saver starting");
    let mut summary = SaverSummary::default();
    let mut pending: Option<PublishedSnapshot> = None;
    let mut last_saved: Option<Instant> = None;

    loop {
        let due = pending.as_ref().map(|snapshot| {
            last_saved.map_or_else(Instant::now, |at| at + cadence.interval(snapshot.mode))
        });

        tokio::select! {
            biased;
            () = wait_until(due) => {
                if let Some(snapshot) = pending.take() {
                    write(&*store, &snapshot, &mut summary).await;
                    last_saved = Some(Instant::now());
                }
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = rx.borrow_and_update().clone();
                if let Some(snapshot) = latest
                    && pending.replace(snapshot).is_some()
                {
                    summary.superseded = summary.superseded.saturating_add(1);
                }
            }
        }
    }

    if let Some(snapshot) = pending.take() {
        debug!(cycle = snapshot.cycle, "Flushing final snapshot");
        write(&*store, &snapshot, &mut summary).await;
    }
    info!(
        saves = summary.saves,
        failures = summary.failures,
        superseded = summary.superseded,
        "Saver stopped"
    );
    summary
}

async fn wait_until(due: Option<Instant>) {
    match due {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn write(
    store: &impl KeyValueStore,
    published: &PublishedSnapshot,
    summary: &mut SaverSummary,
) {
    match save_snapshot(store, &published.snapshot).await {
        Ok(()) => {
            summary.saves = summary.saves.saturating_add(1);
            debug!(cycle = published.cycle, mode = ?published.mode, "Snapshot saved");
        }
        Err(e) => {
            summary.failures = summary.failures.saturating_add(1);
            error!(cycle = published.cycle, error = %e, "Save failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use chroma_types::{GameStats, SessionSnapshot};
    use tokio::sync::watch;

    use super::*;
    use crate::persistence::load_snapshot;
    use crate::store::MemoryStore;

    fn published(cycle: u64, clicks: u64) -> Option<PublishedSnapshot> {
        Some(PublishedSnapshot {
            snapshot: SessionSnapshot {
                game_stats: GameStats {
                    total_clicks: clicks,
                    ..GameStats::default()
                },
                ..SessionSnapshot::default()
            },
            mode: PerformanceMode::Normal,
            cycle,
            taken_at: Utc::now(),
        })
    }

    fn cadence() -> SaveCadence {
        SaveCadence::from_config(&PersistenceConfig::default())
    }

    #[test]
    fn cadence_lengthens_with_mode() {
        let cadence = cadence();
        assert_eq!(cadence.interval(PerformanceMode::Normal), Duration::from_secs(1));
        assert!(cadence.interval(PerformanceMode::Extreme) > cadence.interval(PerformanceMode::High));
    }

    #[tokio::test(start_paused = true)]
    async fn burst_is_coalesced_and_flushed_on_close() {
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(run_saver(Arc::clone(&store), rx, cadence()));

        tx.send_replace(published(1, 1));
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send_replace(published(2, 2));
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send_replace(published(3, 3));
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(tx);

        let summary = task.await.unwrap();
        assert_eq!(summary.saves, 2);
        assert_eq!(summary.superseded, 1);
        assert_eq!(summary.failures, 0);
        let saved = load_snapshot(&*store).await.unwrap();
        assert_eq!(saved.game_stats.total_clicks, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_snapshot_is_written_when_interval_elapses() {
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(run_saver(Arc::clone(&store), rx, cadence()));

        tx.send_replace(published(1, 1));
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send_replace(published(2, 2));
        tokio::time::sleep(Duration::from_secs(2)).await;

        let saved = load_snapshot(&*store).await.unwrap();
        assert_eq!(saved.game_stats.total_clicks, 2);

        drop(tx);
        let summary = task.await.unwrap();
        assert_eq!(summary.saves, 2);
        assert_eq!(summary.superseded, 0);
    }

    #[tokio::test]
    async fn closed_channel_without_snapshots_saves_nothing() {
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = watch::channel(None);
        drop(tx);
        let summary = run_saver(Arc::clone(&store), rx, cadence()).await;
        assert_eq!(summary, SaverSummary::default());
        assert!(store.is_empty().await);
    }
}
