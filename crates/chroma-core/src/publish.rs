//! Hands cycle results to the outside world.
//!
//! The loop never writes to storage. After each cycle the
//! [`SnapshotPublisher`] flattens the session into a [`PublishedSnapshot`]
//! and sends it on a `watch` channel; the saver keeps only the newest
//! value and writes at its own cadence.
//!
//! Before publishing, the new snapshot is audited against the last one that
//! was published. A snapshot that breaks a ledger invariant is logged and
//! withheld, so corruption never reaches the store. Snapshots on either
//! side of a reset or import are not compared.

use chrono::Utc;
use chroma_ledger::AuditResult;
use chroma_types::{PublishedSnapshot, SessionSnapshot};
use tokio::sync::watch;
use tracing::{error, trace};

use crate::scheduler::{CycleObserver, CycleReport};
use crate::session::GameSession;

/// Receiving end handed to the saver.
pub type SnapshotReceiver = watch::Receiver<Option<PublishedSnapshot>>;

/// Publishes one audited snapshot per cycle.
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: watch::Sender<Option<PublishedSnapshot>>,
    previous: Option<(u64, SessionSnapshot)>,
    withheld: u64,
}

impl SnapshotPublisher {
    /// Create a publisher and the receiver the saver reads from.
    pub fn channel() -> (Self, SnapshotReceiver) {
        let (tx, rx) = watch::channel(None);
        (
            Self {
                tx,
                previous: None,
                withheld: 0,
            },
            rx,
        )
    }

    /// Another receiver on the same channel.
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.tx.subscribe()
    }

    /// Snapshots withheld because they failed the audit.
    pub const fn withheld(&self) -> u64 {
        self.withheld
    }

    /// Audit and publish the session's current state.
    ///
    /// Returns `false` when the snapshot was withheld.
    pub fn publish(&mut self, report: &CycleReport, session: &GameSession) -> bool {
        let snapshot = session.snapshot();
        let epoch = session.reset_epoch();

        if let Some((previous_epoch, previous)) = &self.previous
            && *previous_epoch == epoch
            && let AuditResult::Anomaly(anomaly) = chroma_ledger::audit(previous, &snapshot)
        {
            self.withheld = self.withheld.saturating_add(1);
            error!(
                cycle = report.cycle,
                violations = anomaly.violations.len(),
                anomaly = %anomaly,
                "Snapshot failed ledger audit, not published"
            );
            return false;
        }

        let published = PublishedSnapshot {
            snapshot: snapshot.clone(),
            mode: report.mode,
            cycle: report.cycle,
            taken_at: Utc::now(),
        };
        self.previous = Some((epoch, snapshot));
        // No receiver means nobody saves; the loop keeps running.
        self.tx.send_replace(Some(published));
        trace!(cycle = report.cycle, "Snapshot published");
        true
    }
}

impl CycleObserver<GameSession> for SnapshotPublisher {
    fn on_cycle(&mut self, report: &CycleReport, world: &GameSession) {
        self.publish(report, world);
    }
}
