//! Composite color ledger: unlock and mix.
//!
//! Each color moves through `locked -> unlocked -> unlocked(count++)`.
//! Unlocking never reverts and counts never decrease. Recipe, name and
//! swatch are always taken from [`ColorId`], so a tampered save can change
//! progress but never the rules.

use chroma_types::{ColorEntry, ColorFamily, ColorId, ColorState, RgbAmount};
use tracing::debug;

use crate::capability::{ColorMutator, PixelSpender};

/// Color unlocked on a fresh game.
pub const DEFAULT_UNLOCKED: ColorId = ColorId::Orange;

/// Owning wrapper over the nine [`ColorEntry`] records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorLedger {
    entries: ColorState,
}

impl Default for ColorLedger {
    fn default() -> Self {
        Self::from_state(&ColorState::new())
    }
}

impl ColorLedger {
    /// Build from a loaded state, keeping only `count` and `unlocked`.
    ///
    /// Colors absent from the save take their defaults. A saved count on a
    /// locked color is kept but cannot grow until the color is unlocked.
    pub fn from_state(saved: &ColorState) -> Self {
        let entries = ColorId::ALL
            .into_iter()
            .map(|id| {
                let (count, unlocked) = saved
                    .get(&id)
                    .map_or((0, id == DEFAULT_UNLOCKED), |e| (e.count, e.unlocked));
                let unlocked = unlocked || id == DEFAULT_UNLOCKED;
                (id, ColorEntry::from_table(id, count, unlocked))
            })
            .collect();
        Self { entries }
    }

    /// All entries, for snapshots and display.
    pub const fn state(&self) -> &ColorState {
        &self.entries
    }

    /// One entry.
    pub fn entry(&self, color: ColorId) -> Option<&ColorEntry> {
        self.entries.get(&color)
    }

    /// Units mixed so far.
    pub fn count(&self, color: ColorId) -> u64 {
        self.entries.get(&color).map_or(0, |e| e.count)
    }

    /// Number of unlocked colors in a family.
    pub fn unlocked_in_family(&self, family: ColorFamily) -> u32 {
        let n = self
            .entries
            .values()
            .filter(|e| e.family == family && e.unlocked)
            .count();
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    /// Number of unlocks in a family that were paid for.
    ///
    /// The color unlocked on a fresh game is free and does not raise the
    /// price of the next unlock.
    pub fn purchased_in_family(&self, family: ColorFamily) -> u32 {
        let free = u32::from(DEFAULT_UNLOCKED.family() == family);
        self.unlocked_in_family(family).saturating_sub(free)
    }

    /// First locked color of the family in offer order.
    pub fn next_unlock(&self, family: ColorFamily) -> Option<ColorId> {
        let order: &[ColorId] = match family {
            ColorFamily::Mixed => &ColorId::MIXED_UNLOCK_ORDER,
            ColorFamily::Pure => &ColorId::PURE_UNLOCK_ORDER,
        };
        order.iter().copied().find(|c| !self.is_unlocked(*c))
    }

    /// Unlock a color for the given price.
    ///
    /// Returns `false` with no mutation when the color is already unlocked
    /// or the pixels do not cover `cost`.
    pub fn unlock(
        &mut self,
        color: ColorId,
        cost: RgbAmount,
        pixels: &mut impl PixelSpender,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(&color) else {
            return false;
        };
        if entry.unlocked || !pixels.spend_rgb(cost) {
            return false;
        }
        entry.unlocked = true;
        debug!(color = ?color, cost = cost.total(), "Color unlocked");
        true
    }

    /// Mix one unit, paying the recipe.
    pub fn mix(&mut self, color: ColorId, pixels: &mut impl PixelSpender) -> bool {
        let Some(entry) = self.entries.get_mut(&color) else {
            return false;
        };
        if !entry.unlocked || !pixels.spend_rgb(entry.recipe) {
            return false;
        }
        entry.count = entry.count.saturating_add(1);
        true
    }

    /// Counts of the three pure colors as `(crimson, emerald, sapphire)`.
    pub fn pure_counts(&self) -> (u64, u64, u64) {
        (
            self.count(ColorId::Crimson),
            self.count(ColorId::Emerald),
            self.count(ColorId::Sapphire),
        )
    }
}

impl ColorMutator for ColorLedger {
    fn is_unlocked(&self, color: ColorId) -> bool {
        self.entries.get(&color).is_some_and(|e| e.unlocked)
    }

    fn add_color_bulk(&mut self, color: ColorId, count: u64) -> bool {
        match self.entries.get_mut(&color) {
            Some(entry) if entry.unlocked => {
                entry.count = entry.count.saturating_add(count);
                true
            }
            _ => false,
        }
    }
}
