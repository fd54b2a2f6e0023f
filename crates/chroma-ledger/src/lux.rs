//! Lux ledger: the second prestige currency.
//!
//! `amount` is authoritative. `display_amount` trails it for the UI and is
//! never read by game logic. Prestige empties `amount` and `display_amount`
//! but leaves `lifetime_total` and `best_amount` untouched.

use chroma_types::LuxState;
use tracing::debug;

use crate::LedgerError;
use crate::lumen::{check_amount, sanitize};

/// Differences at or below this snap the display copy to the real value.
pub const DISPLAY_SNAP_EPSILON: f64 = 0.01;

/// Owning wrapper over [`LuxState`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LuxLedger {
    state: LuxState,
}

impl LuxLedger {
    /// Wrap a loaded state, clamping negative or non-finite values to zero.
    pub fn from_state(mut state: LuxState) -> Self {
        state.amount = sanitize(state.amount);
        state.display_amount = sanitize(state.display_amount);
        state.lifetime_total = sanitize(state.lifetime_total).max(state.amount);
        state.best_amount = sanitize(state.best_amount).max(state.amount);
        state.total_lumen_earned = sanitize(state.total_lumen_earned);
        Self { state }
    }

    /// Current state.
    pub const fn state(&self) -> &LuxState {
        &self.state
    }

    /// Authoritative balance.
    pub const fn amount(&self) -> f64 {
        self.state.amount
    }

    /// Smoothed display copy.
    pub const fn display_amount(&self) -> f64 {
        self.state.display_amount
    }

    /// Prestige resets performed.
    pub const fn prestige_level(&self) -> u32 {
        self.state.prestige_level
    }

    /// Credit lux.
    pub fn add(&mut self, amount: f64) -> Result<(), LedgerError> {
        check_amount(amount)?;
        self.state.amount += amount;
        self.state.lifetime_total += amount;
        self.state.best_amount = self.state.best_amount.max(self.state.amount);
        Ok(())
    }

    /// Deduct lux. Returns `false` with no mutation when short.
    pub fn spend(&mut self, amount: f64) -> bool {
        if !amount.is_finite() || amount < 0.0 || self.state.amount < amount {
            return false;
        }
        self.state.amount = (self.state.amount - amount).max(0.0);
        true
    }

    /// Empty the balance for a prestige reset and bank the lumen reward.
    ///
    /// Returns the lux that was given up. Lifetime and best are untouched.
    pub fn reset_for_prestige(&mut self, lumen_reward: f64) -> f64 {
        let given_up = self.state.amount;
        self.state.amount = 0.0;
        self.state.display_amount = 0.0;
        self.state.prestige_level = self.state.prestige_level.saturating_add(1);
        self.state.total_lumen_earned += sanitize(lumen_reward);
        debug!(
            given_up,
            lumen_reward,
            prestige_level = self.state.prestige_level,
            "Lux prestige reset"
        );
        given_up
    }

    /// Move the display copy toward the real balance.
    ///
    /// Closes `rate * dt` of the gap per call and snaps once the gap is at
    /// most [`DISPLAY_SNAP_EPSILON`]. Touches nothing but `display_amount`.
    pub fn smooth_display(&mut self, dt: f64, rate: f64) {
        let diff = self.state.amount - self.state.display_amount;
        if diff.abs() > DISPLAY_SNAP_EPSILON {
            let step = (dt * rate).clamp(0.0, 1.0);
            self.state.display_amount += diff * step;
        } else {
            self.state.display_amount = self.state.amount;
        }
        self.state.display_amount = sanitize(self.state.display_amount);
    }
}
