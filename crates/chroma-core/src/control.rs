//! Shared control state for the game loop.
//!
//! The loop task, the display smoother, the saver and any command handler
//! share one [`LoopControl`] behind an [`Arc`](std::sync::Arc). Every
//! field the loop reads on its hot path is atomic, so checking for a pause
//! or reading the current mode never takes a lock.
//!
//! # Stopping
//!
//! [`LoopControl::request_stop`] sets a flag and wakes every task parked in
//! [`LoopControl::stopped`]. A task that starts waiting after the request
//! returns immediately, so no stop can be lost between a check and a wait.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use chroma_types::PerformanceMode;
use tokio::sync::Notify;

/// Shared loop control state.
#[derive(Debug)]
pub struct LoopControl {
    /// Whether the loop is paused.
    paused: AtomicBool,

    /// Wakes the loop when resumed.
    resume_notify: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wakes every task waiting for a stop.
    stop_notify: Notify,

    /// Current performance mode, as [`mode_to_u8`].
    mode: AtomicU8,

    /// Current tick interval in milliseconds.
    interval_ms: AtomicU64,

    /// Timer restarts caused by interval changes.
    restarts: AtomicU64,

    /// Last reported frame rate, as `f64` bits.
    fps_bits: AtomicU64,

    /// Whether any frame rate was reported yet.
    fps_reported: AtomicBool,

    /// Wall-clock time the control was created.
    started_at: DateTime<Utc>,

    /// Maximum number of cycles (0 = unlimited).
    max_cycles: u64,
}

impl LoopControl {
    /// Create control state starting in `mode` at `interval_ms`.
    pub fn new(mode: PerformanceMode, interval_ms: u64, max_cycles: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            mode: AtomicU8::new(mode_to_u8(mode)),
            interval_ms: AtomicU64::new(interval_ms),
            restarts: AtomicU64::new(0),
            fps_bits: AtomicU64::new(0),
            fps_reported: AtomicBool::new(false),
            started_at: Utc::now(),
            max_cycles,
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether the loop is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the loop. The current cycle finishes; no new one starts.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the loop and wake it.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the loop is no longer paused.
    pub async fn wait_if_paused(&self) {
        while self.paused.load(Ordering::Acquire) {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop of the loop and every helper task.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_waiters();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Resolve once a stop has been requested.
    pub async fn stopped(&self) {
        let notified = self.stop_notify.notified();
        tokio::pin!(notified);
        loop {
            // Register before checking the flag so a concurrent request
            // cannot slip between the two.
            notified.as_mut().enable();
            if self.is_stop_requested() {
                return;
            }
            notified.as_mut().await;
            notified.set(self.stop_notify.notified());
        }
    }

    // -----------------------------------------------------------------------
    // Mode / Interval
    // -----------------------------------------------------------------------

    /// Current performance mode.
    pub fn mode(&self) -> PerformanceMode {
        mode_from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Current tick interval in milliseconds.
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms.load(Ordering::Acquire)
    }

    /// Store a new mode and interval. Returns the previous mode.
    pub(crate) fn set_mode(&self, mode: PerformanceMode, interval_ms: u64) -> PerformanceMode {
        self.interval_ms.store(interval_ms, Ordering::Release);
        mode_from_u8(self.mode.swap(mode_to_u8(mode), Ordering::AcqRel))
    }

    /// Timer restarts so far.
    pub fn restarts(&self) -> u64 {
        self.restarts.load(Ordering::Acquire)
    }

    pub(crate) fn record_restart(&self) -> u64 {
        self.restarts.fetch_add(1, Ordering::AcqRel).saturating_add(1)
    }

    // -----------------------------------------------------------------------
    // Frame rate
    // -----------------------------------------------------------------------

    /// Report the UI frame rate. Non-finite or negative values are ignored.
    pub fn report_fps(&self, fps: f64) {
        if !fps.is_finite() || fps < 0.0 {
            return;
        }
        self.fps_bits.store(fps.to_bits(), Ordering::Release);
        self.fps_reported.store(true, Ordering::Release);
    }

    /// Last reported frame rate, `None` when nothing was reported.
    pub fn reported_fps(&self) -> Option<f64> {
        self.fps_reported
            .load(Ordering::Acquire)
            .then(|| f64::from_bits(self.fps_bits.load(Ordering::Acquire)))
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Whether `cycle` reached the configured limit.
    pub const fn cycle_limit_reached(&self, cycle: u64) -> bool {
        self.max_cycles > 0 && cycle >= self.max_cycles
    }

    /// Configured cycle limit (0 = unlimited).
    pub const fn max_cycles(&self) -> u64 {
        self.max_cycles
    }

    /// Wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Encode a mode for atomic storage.
pub const fn mode_to_u8(mode: PerformanceMode) -> u8 {
    match mode {
        PerformanceMode::Normal => 0,
        PerformanceMode::Medium => 1,
        PerformanceMode::High => 2,
        PerformanceMode::Extreme => 3,
        PerformanceMode::Emergency => 4,
    }
}

/// Decode a stored mode. Unknown values read as emergency.
pub const fn mode_from_u8(value: u8) -> PerformanceMode {
    match value {
        0 => PerformanceMode::Normal,
        1 => PerformanceMode::Medium,
        2 => PerformanceMode::High,
        3 => PerformanceMode::Extreme,
        _ => PerformanceMode::Emergency,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    fn control() -> LoopControl {
        LoopControl::new(PerformanceMode::Normal, 100, 0)
    }

    #[test]
    fn initial_state_is_running() {
        let state = control();
        assert!(!state.is_paused());
        assert!(!state.is_stop_requested());
        assert_eq!(state.mode(), PerformanceMode::Normal);
        assert_eq!(state.interval_ms(), 100);
        assert!(state.reported_fps().is_none());
    }

    #[test]
    fn pause_and_resume() {
        let state = control();
        state.pause();
        assert!(state.is_paused());
        state.resume();
        assert!(!state.is_paused());
    }

    #[test]
    fn mode_round_trips_through_atomic() {
        let state = control();
        for mode in PerformanceMode::ALL {
            state.set_mode(mode, 1);
            assert_eq!(state.mode(), mode);
        }
    }

    #[test]
    fn bad_fps_reports_are_ignored() {
        let state = control();
        state.report_fps(f64::NAN);
        assert!(state.reported_fps().is_none());
        state.report_fps(24.0);
        assert_eq!(state.reported_fps().map(f64::to_bits), Some(24.0_f64.to_bits()));
    }

    #[test]
    fn cycle_limit_zero_means_unlimited() {
        assert!(!control().cycle_limit_reached(u64::MAX));
        let bounded = LoopControl::new(PerformanceMode::Normal, 100, 3);
        assert!(!bounded.cycle_limit_reached(2));
        assert!(bounded.cycle_limit_reached(3));
    }

    #[tokio::test]
    async fn stop_before_wait_is_not_lost() {
        let state = control();
        state.request_stop();
        let waited = tokio::time::timeout(Duration::from_secs(1), state.stopped()).await;
        assert!(waited.is_ok());
    }

    #[tokio::test]
    async fn stop_wakes_every_waiter() {
        let state = Arc::new(control());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let state = Arc::clone(&state);
                tokio::spawn(async move { state.stopped().await })
            })
            .collect();
        tokio::task::yield_now().await;
        state.request_stop();
        for waiter in waiters {
            let joined = tokio::time::timeout(Duration::from_secs(1), waiter).await;
            assert!(matches!(joined, Ok(Ok(()))));
        }
    }
}
