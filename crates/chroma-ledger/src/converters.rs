//! Auto-converter ownership: levels and the enabled flag.
//!
//! Fractional progress between ticks belongs to the production engine and
//! is never stored here.

use chroma_types::{AutoConverterState, ConverterId, ConverterProgress};

use crate::capability::PixelSpender;

/// Owning wrapper over [`AutoConverterState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConverterLedger {
    state: AutoConverterState,
}

impl ConverterLedger {
    /// Wrap a loaded state.
    pub const fn from_state(state: AutoConverterState) -> Self {
        Self { state }
    }

    /// Current state.
    pub const fn state(&self) -> &AutoConverterState {
        &self.state
    }

    /// Progress on one converter.
    pub fn progress(&self, id: ConverterId) -> ConverterProgress {
        self.state.get(&id).copied().unwrap_or_default()
    }

    /// Whether the converter should run this tick.
    pub fn is_active(&self, id: ConverterId) -> bool {
        let p = self.progress(id);
        p.enabled && p.level > 0
    }

    /// Buy one level for `cost` white. A purchase always enables the
    /// converter.
    pub fn upgrade(
        &mut self,
        id: ConverterId,
        cost: u64,
        max_level: u32,
        pixels: &mut impl PixelSpender,
    ) -> bool {
        let current = self.progress(id);
        if current.level >= max_level || !pixels.spend_white(cost) {
            return false;
        }
        self.state.insert(
            id,
            ConverterProgress {
                level: current.level.saturating_add(1),
                enabled: true,
            },
        );
        true
    }

    /// Flip the enabled flag of a purchased converter.
    ///
    /// Returns the new flag, or `None` when the converter was never bought.
    pub fn toggle(&mut self, id: ConverterId) -> Option<bool> {
        let entry = self.state.get_mut(&id).filter(|p| p.level > 0)?;
        entry.enabled = !entry.enabled;
        Some(entry.enabled)
    }

    /// Disable every purchased converter. Returns how many changed.
    pub fn pause_all(&mut self) -> usize {
        self.set_all(false)
    }

    /// Enable every purchased converter. Returns how many changed.
    pub fn resume_all(&mut self) -> usize {
        self.set_all(true)
    }

    fn set_all(&mut self, enabled: bool) -> usize {
        let mut changed = 0;
        for progress in self.state.values_mut().filter(|p| p.level > 0) {
            if progress.enabled != enabled {
                progress.enabled = enabled;
                changed += 1;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use chroma_types::PixelState;

    use super::*;
    use crate::PixelLedger;

    fn white(amount: u64) -> PixelLedger {
        PixelLedger::from_state(PixelState {
            white: amount,
            ..PixelState::default()
        })
    }

    #[test]
    fn upgrade_auto_enables() {
        let mut converters = ConverterLedger::default();
        let mut pixels = white(5);
        assert!(!converters.is_active(ConverterId::WhiteConverter));
        assert!(converters.upgrade(ConverterId::WhiteConverter, 5, 10, &mut pixels));
        assert!(converters.is_active(ConverterId::WhiteConverter));
    }

    #[test]
    fn toggle_requires_purchase() {
        let mut converters = ConverterLedger::default();
        assert_eq!(converters.toggle(ConverterId::CyanMixer), None);

        let mut pixels = white(8);
        assert!(converters.upgrade(ConverterId::CyanMixer, 8, 6, &mut pixels));
        assert_eq!(converters.toggle(ConverterId::CyanMixer), Some(false));
        assert!(!converters.is_active(ConverterId::CyanMixer));
        assert_eq!(converters.toggle(ConverterId::CyanMixer), Some(true));
    }

    #[test]
    fn pause_and_resume_touch_only_purchased() {
        let mut converters = ConverterLedger::default();
        let mut pixels = white(100);
        assert!(converters.upgrade(ConverterId::WhiteConverter, 5, 10, &mut pixels));
        assert!(converters.upgrade(ConverterId::LimeMixer, 8, 6, &mut pixels));

        assert_eq!(converters.pause_all(), 2);
        assert_eq!(converters.pause_all(), 0);
        assert!(!converters.is_active(ConverterId::LimeMixer));
        assert_eq!(converters.resume_all(), 2);
        assert!(!converters.is_active(ConverterId::SapphireForge));
    }
}
