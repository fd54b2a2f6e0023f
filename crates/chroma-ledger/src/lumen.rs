//! Lumen ledger: the first prestige currency and the lux generators it buys.

use chroma_types::{LumenGeneratorId, LumenState, LumenUpgradeId, OwnedLevel};

use crate::LedgerError;

/// Owning wrapper over [`LumenState`].
///
/// After every mutation `best_lumen >= total` and `lifetime_lumen` has not
/// decreased.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LumenLedger {
    state: LumenState,
}

impl LumenLedger {
    /// Wrap a loaded state, clamping negative or non-finite balances to zero.
    pub fn from_state(mut state: LumenState) -> Self {
        state.total = sanitize(state.total);
        state.lifetime_lumen = sanitize(state.lifetime_lumen).max(state.total);
        state.best_lumen = sanitize(state.best_lumen).max(state.total);
        Self { state }
    }

    /// Current state.
    pub const fn state(&self) -> &LumenState {
        &self.state
    }

    /// Spendable lumen.
    pub const fn total(&self) -> f64 {
        self.state.total
    }

    /// Lumen ever earned.
    pub const fn lifetime(&self) -> f64 {
        self.state.lifetime_lumen
    }

    /// Credit lumen.
    ///
    /// Rejects negative and non-finite amounts so a bad rate can never
    /// poison the balance.
    pub fn add(&mut self, amount: f64) -> Result<(), LedgerError> {
        check_amount(amount)?;
        self.state.total += amount;
        self.state.lifetime_lumen += amount;
        self.state.best_lumen = self.state.best_lumen.max(self.state.total);
        Ok(())
    }

    /// Whether `amount` is held.
    pub fn can_afford(&self, amount: f64) -> bool {
        self.state.total >= amount
    }

    /// Deduct lumen. Returns `false` with no mutation when short.
    pub fn spend(&mut self, amount: f64) -> bool {
        if !amount.is_finite() || amount < 0.0 || !self.can_afford(amount) {
            return false;
        }
        self.state.total = (self.state.total - amount).max(0.0);
        true
    }

    /// Level of an upgrade.
    pub fn upgrade_level(&self, id: LumenUpgradeId) -> u32 {
        self.state.upgrade_level(id)
    }

    /// Level and ownership of a generator.
    pub fn generator(&self, id: LumenGeneratorId) -> OwnedLevel {
        self.state.generator(id)
    }

    /// Buy one upgrade level at `cost`, refusing at `max_level`.
    pub fn buy_upgrade(&mut self, id: LumenUpgradeId, cost: f64, max_level: u32) -> bool {
        let level = self.upgrade_level(id);
        if level >= max_level || !self.spend(cost) {
            return false;
        }
        self.state.upgrades.insert(id, level.saturating_add(1));
        true
    }

    /// Buy one generator level at `cost`.
    ///
    /// Refuses at `max_level` and when the prerequisite generator is not
    /// owned.
    pub fn buy_generator(&mut self, id: LumenGeneratorId, cost: f64, max_level: u32) -> bool {
        let current = self.generator(id);
        if current.level >= max_level {
            return false;
        }
        if let Some(required) = id.requires()
            && !self.generator(required).owned
        {
            return false;
        }
        if !self.spend(cost) {
            return false;
        }
        self.state.generators.insert(
            id,
            OwnedLevel {
                level: current.level.saturating_add(1),
                owned: true,
            },
        );
        true
    }

    /// Record a prestige reset on the lumen side.
    pub const fn record_prestige(&mut self) {
        self.state.prestige_level = self.state.prestige_level.saturating_add(1);
    }
}

pub(crate) fn check_amount(amount: f64) -> Result<(), LedgerError> {
    if !amount.is_finite() {
        return Err(LedgerError::NonFiniteAmount { amount });
    }
    if amount < 0.0 {
        return Err(LedgerError::NegativeAmount { amount });
    }
    Ok(())
}

pub(crate) fn sanitize(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}
