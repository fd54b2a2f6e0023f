//! Gameplay counters.

use chroma_types::GameStats;

/// Owning wrapper over [`GameStats`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsLedger {
    state: GameStats,
}

impl StatsLedger {
    /// Wrap a loaded state.
    pub fn from_state(mut state: GameStats) -> Self {
        if !state.playtime_seconds.is_finite() || state.playtime_seconds < 0.0 {
            state.playtime_seconds = 0.0;
        }
        Self { state }
    }

    /// Current counters.
    pub const fn state(&self) -> &GameStats {
        &self.state
    }

    /// Successful conversions so far.
    pub const fn total_conversions(&self) -> u64 {
        self.state.total_conversions
    }

    /// Count one manual click.
    pub const fn record_click(&mut self) {
        self.state.total_clicks = self.state.total_clicks.saturating_add(1);
    }

    /// Count successful conversions.
    pub const fn record_conversions(&mut self, n: u64) {
        self.state.total_conversions = self.state.total_conversions.saturating_add(n);
    }

    /// Accumulate play time. Ignores negative and non-finite input.
    pub fn add_playtime(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.state.playtime_seconds += seconds;
        }
    }
}
