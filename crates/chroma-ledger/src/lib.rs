//! Resource ledgers for the Chroma simulation core.
//!
//! Every balance in the game lives in one of these ledgers and changes only
//! through their methods. Ledgers are mechanism: they check and deduct, they
//! never price. Costs arrive from the formula layer in `chroma-core`.
//!
//! # Architecture
//!
//! - [`pixels`] -- [`PixelLedger`]: RGB and white balances, conversion.
//! - [`colors`] -- [`ColorLedger`]: composite color unlock and mix.
//! - [`lumen`] -- [`LumenLedger`]: lumen balance, upgrades, lux generators.
//! - [`lux`] -- [`LuxLedger`]: lux balance, prestige reset, display smoothing.
//! - [`upgrades`] -- [`UpgradeLedger`]: generators, powerups, breakthroughs.
//! - [`converters`] -- [`ConverterLedger`]: auto-converter levels and flags.
//! - [`stats`] -- [`StatsLedger`]: gameplay counters.
//! - [`capability`] -- [`PixelSpender`] and [`ColorMutator`] narrow traits.
//! - [`book`] -- [`Ledgers`]: the full set, to and from a snapshot.
//! - [`invariants`] -- Snapshot-to-snapshot audit.
//! - [`numeric`] -- Saturating float-to-integer conversions.
//!
//! # No Partial Mutation
//!
//! A spending call either applies completely or returns `false` having
//! changed nothing. Multi-field checks always run before the first write.
//!
//! # Usage
//!
//! ```
//! use chroma_ledger::{ColorLedger, PixelLedger, PixelSpender};
//! use chroma_types::{ColorId, PixelState};
//!
//! let mut pixels = PixelLedger::from_state(PixelState { red: 4, green: 2, ..PixelState::default() });
//! let mut colors = ColorLedger::default();
//!
//! assert!(colors.mix(ColorId::Orange, &mut pixels));
//! assert_eq!(colors.count(ColorId::Orange), 1);
//! assert!(!pixels.can_afford_rgb(ColorId::Purple.recipe()));
//! ```

pub mod book;
pub mod capability;
pub mod colors;
pub mod converters;
pub mod invariants;
pub mod lumen;
pub mod lux;
pub mod numeric;
pub mod pixels;
pub mod stats;
pub mod upgrades;

// Re-export primary types at crate root.
pub use book::Ledgers;
pub use capability::{ColorMutator, PixelSpender};
pub use colors::ColorLedger;
pub use converters::ConverterLedger;
pub use invariants::{AuditResult, audit};
pub use lumen::LumenLedger;
pub use lux::LuxLedger;
pub use pixels::{Conversion, ConversionQuote, PixelLedger};
pub use stats::StatsLedger;
pub use upgrades::UpgradeLedger;

use chroma_types::ColorId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from crediting a floating-point currency.
///
/// Integer pixel ledgers cannot fail a credit. Lumen and lux credits come
/// from rate formulas and are rejected rather than stored when the rate
/// misbehaves.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    /// The amount was NaN or infinite.
    #[error("ledger amount must be finite, got {amount}")]
    NonFiniteAmount {
        /// The invalid amount.
        amount: f64,
    },

    /// The amount was below zero.
    #[error("ledger amount must not be negative, got {amount}")]
    NegativeAmount {
        /// The invalid amount.
        amount: f64,
    },
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// One broken invariant found by [`audit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// A counter that may only grow went down.
    CounterDecreased {
        /// Which counter.
        counter: &'static str,
        /// Value in the earlier snapshot.
        before: f64,
        /// Value in the later snapshot.
        after: f64,
    },
    /// An unlocked color became locked again.
    ColorRelocked {
        /// The color.
        color: ColorId,
    },
    /// `best_lumen` fell below the current total.
    BestBelowTotal {
        /// Recorded best.
        best: f64,
        /// Current total.
        total: f64,
    },
    /// A floating-point balance is negative or not finite.
    InvalidBalance {
        /// Which field.
        field: &'static str,
        /// The bad value.
        value: f64,
    },
}

/// An invariant violation detected between two snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerAnomaly {
    /// Every violation found.
    pub violations: Vec<Violation>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
