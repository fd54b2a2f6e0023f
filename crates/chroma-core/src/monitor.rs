//! Tick-rate monitor.
//!
//! Counts loop cycles in one-second windows and compares each closed window
//! against the budget the current interval allows. The loop is driven by a
//! timer, so an over-budget window means something is calling
//! [`Scheduler::run_cycle`](crate::scheduler::Scheduler::run_cycle) outside
//! the timer or the timer was recreated too often.

use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

const WINDOW: Duration = Duration::from_secs(1);

/// Counts for one closed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStats {
    /// Cycles run in the window.
    pub ticks: u64,
    /// Cycles allowed in the window.
    pub budget: u64,
}

impl WindowStats {
    /// Whether the window ran more cycles than allowed.
    pub const fn over_budget(&self) -> bool {
        self.ticks > self.budget
    }
}

/// Rolling one-second tick counter.
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    window_start: Instant,
    ticks: u64,
    budget: u64,
    previous: Option<WindowStats>,
    over_budget_windows: u64,
}

impl PerformanceMonitor {
    /// Start counting at `now` for a loop running every `interval_ms`.
    pub const fn new(now: Instant, interval_ms: u64) -> Self {
        Self {
            window_start: now,
            ticks: 0,
            budget: budget_for(interval_ms),
            previous: None,
            over_budget_windows: 0,
        }
    }

    /// Change the budget after an interval change. The open window keeps
    /// its count.
    pub const fn set_interval(&mut self, interval_ms: u64) {
        self.budget = budget_for(interval_ms);
    }

    /// Count one cycle at `now`, closing the window first if it is a
    /// second old. Returns the closed window, if any.
    pub fn record_tick(&mut self, now: Instant) -> Option<WindowStats> {
        let closed = if now.saturating_duration_since(self.window_start) >= WINDOW {
            let stats = WindowStats {
                ticks: self.ticks,
                budget: self.budget,
            };
            if stats.over_budget() {
                self.over_budget_windows = self.over_budget_windows.saturating_add(1);
                warn!(
                    ticks = stats.ticks,
                    budget = stats.budget,
                    "Tick budget exceeded"
                );
            }
            self.previous = Some(stats);
            self.window_start = now;
            self.ticks = 0;
            Some(stats)
        } else {
            None
        };
        self.ticks = self.ticks.saturating_add(1);
        closed
    }

    /// The most recent closed window, stable for display.
    pub const fn last_window(&self) -> Option<WindowStats> {
        self.previous
    }

    /// Closed windows that ran over budget.
    pub const fn over_budget_windows(&self) -> u64 {
        self.over_budget_windows
    }
}

/// Cycles per second a loop at `interval_ms` may run, with one cycle of
/// slack for timer jitter.
pub const fn budget_for(interval_ms: u64) -> u64 {
    if interval_ms == 0 {
        return u64::MAX;
    }
    1000 / interval_ms + 1
}
