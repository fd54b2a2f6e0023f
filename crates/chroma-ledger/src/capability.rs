//! Narrow capability traits handed to code that must not see whole ledgers.
//!
//! Purchases and auto-converters only need to check and deduct pixels, or
//! credit a composite color. Passing `&mut impl PixelSpender` instead of the
//! full [`PixelLedger`](crate::PixelLedger) keeps the borrow small and makes
//! the allowed mutations explicit at the call site.

use chroma_types::{ColorId, RgbAmount};

/// Check-and-deduct access to pixel balances.
pub trait PixelSpender {
    /// Whether the RGB cost is covered.
    fn can_afford_rgb(&self, cost: RgbAmount) -> bool;

    /// Deduct an RGB cost. Returns `false` with no mutation when short.
    fn spend_rgb(&mut self, cost: RgbAmount) -> bool;

    /// White pixels currently held.
    fn white(&self) -> u64;

    /// Deduct white pixels. Returns `false` with no mutation when short.
    fn spend_white(&mut self, amount: u64) -> bool;

    /// Credit white pixels, advancing the lifetime counter.
    fn credit_white(&mut self, amount: u64);
}

/// Access to composite color counts without unlock or pricing rights.
pub trait ColorMutator {
    /// Whether the color may currently be produced.
    fn is_unlocked(&self, color: ColorId) -> bool;

    /// Credit `count` units without deducting pixels.
    ///
    /// Returns `false` with no mutation when the color is locked.
    fn add_color_bulk(&mut self, color: ColorId, count: u64) -> bool;
}
