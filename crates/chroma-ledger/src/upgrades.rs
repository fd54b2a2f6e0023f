//! White-pixel purchases: generators, powerups and breakthroughs.
//!
//! Prices are computed by the caller from the tuning tables. The ledger
//! enforces the level cap and performs the check-and-deduct.

use chroma_types::{BreakthroughId, GeneratorId, OwnedLevel, PowerupId, UpgradeState};

use crate::capability::PixelSpender;

/// Owning wrapper over [`UpgradeState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeLedger {
    state: UpgradeState,
}

impl UpgradeLedger {
    /// Wrap a loaded state.
    pub const fn from_state(state: UpgradeState) -> Self {
        Self { state }
    }

    /// Current state.
    pub const fn state(&self) -> &UpgradeState {
        &self.state
    }

    /// Level of a generator.
    pub fn generator_level(&self, id: GeneratorId) -> u32 {
        self.state.generator_level(id)
    }

    /// Level of a powerup.
    pub fn powerup_level(&self, id: PowerupId) -> u32 {
        self.state.powerup_level(id)
    }

    /// Whether a breakthrough was bought.
    pub fn has_breakthrough(&self, id: BreakthroughId) -> bool {
        self.state.has_breakthrough(id)
    }

    /// Buy one generator level.
    pub fn buy_generator(
        &mut self,
        id: GeneratorId,
        cost: u64,
        max_level: u32,
        pixels: &mut impl PixelSpender,
    ) -> bool {
        let level = self.generator_level(id);
        if level >= max_level || !pixels.spend_white(cost) {
            return false;
        }
        self.state.generators.insert(
            id,
            OwnedLevel {
                level: level.saturating_add(1),
                owned: true,
            },
        );
        true
    }

    /// Buy one powerup level.
    pub fn buy_powerup(
        &mut self,
        id: PowerupId,
        cost: u64,
        max_level: u32,
        pixels: &mut impl PixelSpender,
    ) -> bool {
        let level = self.powerup_level(id);
        if level >= max_level || !pixels.spend_white(cost) {
            return false;
        }
        self.state.powerups.insert(id, level.saturating_add(1));
        true
    }

    /// Buy a one-shot breakthrough.
    pub fn buy_breakthrough(
        &mut self,
        id: BreakthroughId,
        cost: u64,
        pixels: &mut impl PixelSpender,
    ) -> bool {
        if self.has_breakthrough(id) || !pixels.spend_white(cost) {
            return false;
        }
        self.state.breakthroughs.insert(id, true);
        true
    }
}

#[cfg(test)]
mod tests {
    use chroma_types::{PixelKind, PixelState};

    use super::*;
    use crate::PixelLedger;

    fn white(amount: u64) -> PixelLedger {
        PixelLedger::from_state(PixelState {
            white: amount,
            ..PixelState::default()
        })
    }

    #[test]
    fn generator_purchase_marks_owned() {
        let mut upgrades = UpgradeLedger::default();
        let mut pixels = white(10);
        assert!(upgrades.buy_generator(GeneratorId::Red, 3, 10, &mut pixels));
        assert_eq!(upgrades.generator_level(GeneratorId::Red), 1);
        assert!(
            upgrades
                .state()
                .generators
                .get(&GeneratorId::Red)
                .is_some_and(|g| g.owned)
        );
        assert_eq!(pixels.amount(PixelKind::White), 7);
    }

    #[test]
    fn purchase_refused_at_cap_without_charge() {
        let mut upgrades = UpgradeLedger::default();
        let mut pixels = white(1000);
        assert!(upgrades.buy_powerup(PowerupId::UltraSpeed, 10, 1, &mut pixels));
        assert!(!upgrades.buy_powerup(PowerupId::UltraSpeed, 10, 1, &mut pixels));
        assert_eq!(pixels.amount(PixelKind::White), 990);
    }

    #[test]
    fn breakthrough_is_one_shot() {
        let mut upgrades = UpgradeLedger::default();
        let mut pixels = white(1000);
        assert!(upgrades.buy_breakthrough(BreakthroughId::BulkConverter, 500, &mut pixels));
        assert!(!upgrades.buy_breakthrough(BreakthroughId::BulkConverter, 500, &mut pixels));
        assert_eq!(pixels.amount(PixelKind::White), 500);
    }

    #[test]
    fn insufficient_white_changes_nothing() {
        let mut upgrades = UpgradeLedger::default();
        let mut pixels = white(2);
        assert!(!upgrades.buy_generator(GeneratorId::Blue, 3, 10, &mut pixels));
        assert_eq!(upgrades, UpgradeLedger::default());
        assert_eq!(pixels.amount(PixelKind::White), 2);
    }
}
