//! Pixel balances and the RGB to white conversion.
//!
//! The ledger is mechanism only: it knows how to check and deduct, never
//! what things cost. Prices arrive as a [`ConversionQuote`] or an
//! [`RgbAmount`] computed by the formula layer.
//!
//! # Atomicity
//!
//! Every spending method checks every balance it touches before writing any
//! of them. A `false` return therefore always means "nothing changed".

use chroma_types::{Channel, PixelKind, PixelState, RgbAmount};

use crate::capability::PixelSpender;
use crate::numeric::floor_u64;

/// Priced terms for one call to [`PixelLedger::convert_to_white`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionQuote {
    /// Pixels of each primary channel consumed per set.
    pub cost_per_channel: u64,
    /// Conversion efficiency, already floored at its minimum.
    pub efficiency: f64,
    /// Maximum sets per call when bulk conversion is owned.
    pub bulk_sets: Option<u64>,
}

/// Result of a successful conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    /// Sets of RGB consumed.
    pub sets: u64,
    /// White pixels credited.
    pub white: u64,
}

/// Owning wrapper over [`PixelState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelLedger {
    state: PixelState,
}

impl PixelLedger {
    /// Wrap a loaded state.
    ///
    /// A save where `lifetime_white` lags behind `white` is lifted so the
    /// lifetime counter is never below the current balance.
    pub fn from_state(mut state: PixelState) -> Self {
        state.lifetime_white = state.lifetime_white.max(state.white);
        Self { state }
    }

    /// Current balances.
    pub const fn state(&self) -> &PixelState {
        &self.state
    }

    /// Balance of one pixel kind.
    pub const fn amount(&self, kind: PixelKind) -> u64 {
        match kind {
            PixelKind::Red => self.state.red,
            PixelKind::Green => self.state.green,
            PixelKind::Blue => self.state.blue,
            PixelKind::White => self.state.white,
        }
    }

    /// White pixels ever credited.
    pub const fn lifetime_white(&self) -> u64 {
        self.state.lifetime_white
    }

    /// Balances of the three primary channels.
    pub const fn rgb(&self) -> RgbAmount {
        RgbAmount {
            red: self.state.red,
            green: self.state.green,
            blue: self.state.blue,
        }
    }

    /// Sum of the three primary channels.
    pub const fn total_rgb(&self) -> u64 {
        self.rgb().total()
    }

    /// Credit pixels of any kind. White credits advance the lifetime counter.
    pub const fn add(&mut self, kind: PixelKind, amount: u64) {
        let slot = self.slot_mut(kind);
        *slot = slot.saturating_add(amount);
        if matches!(kind, PixelKind::White) {
            self.state.lifetime_white = self.state.lifetime_white.saturating_add(amount);
        }
    }

    /// Credit one primary channel.
    pub const fn add_channel(&mut self, channel: Channel, amount: u64) {
        self.add(pixel_kind(channel), amount);
    }

    /// Whether `amount` of `kind` is held.
    pub const fn can_afford(&self, kind: PixelKind, amount: u64) -> bool {
        self.amount(kind) >= amount
    }

    /// Deduct pixels. Returns `false` with no mutation when short.
    pub const fn spend(&mut self, kind: PixelKind, amount: u64) -> bool {
        let slot = self.slot_mut(kind);
        if *slot < amount {
            return false;
        }
        *slot -= amount;
        true
    }

    /// How many whole copies of `cost` the current balances cover.
    pub const fn affordable_sets(&self, cost: RgbAmount) -> u64 {
        let mut sets = u64::MAX;
        let have = self.rgb();
        if cost.red > 0 {
            sets = min(sets, have.red / cost.red);
        }
        if cost.green > 0 {
            sets = min(sets, have.green / cost.green);
        }
        if cost.blue > 0 {
            sets = min(sets, have.blue / cost.blue);
        }
        sets
    }

    /// Convert RGB into white at the quoted terms.
    ///
    /// Without bulk conversion one set is consumed and at least one white
    /// pixel is credited. With bulk conversion up to `bulk_sets` sets are
    /// consumed and each yields `floor(efficiency)` white. Returns `None`
    /// with no mutation when not even one set is affordable.
    pub fn convert_to_white(&mut self, quote: &ConversionQuote) -> Option<Conversion> {
        let cost = RgbAmount::uniform(quote.cost_per_channel);
        let affordable = self.affordable_sets(cost);
        if affordable == 0 || quote.efficiency <= 0.0 {
            return None;
        }
        let whole = floor_u64(quote.efficiency);
        let (sets, white) = match quote.bulk_sets {
            Some(cap) => {
                let sets = affordable.min(cap.max(1));
                (sets, whole.saturating_mul(sets))
            }
            None => (1, whole.max(1)),
        };
        if !self.spend_rgb(cost.times(sets)) {
            return None;
        }
        self.add(PixelKind::White, white);
        Some(Conversion { sets, white })
    }

    const fn slot_mut(&mut self, kind: PixelKind) -> &mut u64 {
        match kind {
            PixelKind::Red => &mut self.state.red,
            PixelKind::Green => &mut self.state.green,
            PixelKind::Blue => &mut self.state.blue,
            PixelKind::White => &mut self.state.white,
        }
    }
}

impl PixelSpender for PixelLedger {
    fn can_afford_rgb(&self, cost: RgbAmount) -> bool {
        self.state.red >= cost.red && self.state.green >= cost.green && self.state.blue >= cost.blue
    }

    fn spend_rgb(&mut self, cost: RgbAmount) -> bool {
        if !self.can_afford_rgb(cost) {
            return false;
        }
        self.state.red -= cost.red;
        self.state.green -= cost.green;
        self.state.blue -= cost.blue;
        true
    }

    fn white(&self) -> u64 {
        self.state.white
    }

    fn spend_white(&mut self, amount: u64) -> bool {
        self.spend(PixelKind::White, amount)
    }

    fn credit_white(&mut self, amount: u64) {
        self.add(PixelKind::White, amount);
    }
}

const fn pixel_kind(channel: Channel) -> PixelKind {
    match channel {
        Channel::Red => PixelKind::Red,
        Channel::Green => PixelKind::Green,
        Channel::Blue => PixelKind::Blue,
    }
}

const fn min(a: u64, b: u64) -> u64 {
    if a < b { a } else { b }
}
