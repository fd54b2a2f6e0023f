//! The full set of ledgers owned by one game session.

use chroma_types::{AudioSettings, GameLoopState, SessionSnapshot};

use crate::{
    ColorLedger, ConverterLedger, LumenLedger, LuxLedger, PixelLedger, StatsLedger, UpgradeLedger,
};

/// Every ledger of one session, built from and flattened to a
/// [`SessionSnapshot`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledgers {
    /// Pixel balances.
    pub pixels: PixelLedger,
    /// Composite colors.
    pub colors: ColorLedger,
    /// Lumen economy.
    pub lumen: LumenLedger,
    /// Lux economy.
    pub lux: LuxLedger,
    /// White-pixel upgrades.
    pub upgrades: UpgradeLedger,
    /// Auto-converter ownership.
    pub converters: ConverterLedger,
    /// Counters.
    pub stats: StatsLedger,
    /// Audio preferences, stored for the UI.
    pub audio: AudioSettings,
}

impl Ledgers {
    /// Build every ledger from a snapshot already merged over defaults.
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            pixels: PixelLedger::from_state(snapshot.pixels),
            colors: ColorLedger::from_state(&snapshot.composite_colors),
            lumen: LumenLedger::from_state(snapshot.lumen),
            lux: LuxLedger::from_state(snapshot.lux),
            upgrades: UpgradeLedger::from_state(snapshot.upgrades),
            converters: ConverterLedger::from_state(snapshot.auto_converters),
            stats: StatsLedger::from_state(snapshot.game_stats),
            audio: snapshot.audio_settings,
        }
    }

    /// Flatten every ledger into a persistable snapshot.
    ///
    /// `game_loop` is left empty; the session fills it in.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            pixels: *self.pixels.state(),
            composite_colors: self.colors.state().clone(),
            lumen: self.lumen.state().clone(),
            lux: self.lux.state().clone(),
            upgrades: self.upgrades.state().clone(),
            auto_converters: self.converters.state().clone(),
            game_stats: self.stats.state().clone(),
            audio_settings: self.audio.clone(),
            game_loop: GameLoopState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chroma_types::ColorId;

    use super::*;
    use crate::ColorMutator;

    #[test]
    fn empty_snapshot_yields_fresh_game() {
        let ledgers = Ledgers::from_snapshot(SessionSnapshot::default());
        assert_eq!(ledgers, Ledgers::default());
        assert!(ledgers.colors.is_unlocked(ColorId::Orange));
    }

    #[test]
    fn snapshot_reload_is_stable() {
        let mut ledgers = Ledgers::default();
        ledgers.pixels.add_channel(chroma_types::Channel::Red, 12);
        let reloaded = Ledgers::from_snapshot(ledgers.snapshot());
        assert_eq!(reloaded, ledgers);
    }
}
