//! Cross-currency synergy resolver.
//!
//! Synergies are read-only: they look at several ledgers and return
//! multipliers, never mutate. [`Synergies::resolve`] is called once at the
//! top of a cycle so every system in that cycle sees the same figures, no
//! matter in which order the systems run.
//!
//! # Multiplier Composition
//!
//! ```text
//! effective_rate = base_rate * level
//!                * powerups * lumen_rgb * overflow
//!                * pure(channel)            (random generator: random)
//!                * soft_cap_ratio
//! ```

use chroma_ledger::Ledgers;
use chroma_types::{Channel, ColorId, GeneratorId, GeneratorOutput, LumenUpgradeId};

use crate::formulas;
use crate::tables::{self, PURE_MILESTONES};

/// Coefficient on the effective count in the composite pure multiplier.
const PURE_COUNT_COEFFICIENT: f64 = 0.005;

/// Coefficient used by the legacy per-channel multiplier.
const LEGACY_PURE_COUNT_COEFFICIENT: f64 = 0.01;

// ---------------------------------------------------------------------------
// Pure colors
// ---------------------------------------------------------------------------

fn pure_multiplier_with(count: u64, all_pure_owned: bool, count_coefficient: f64) -> f64 {
    if count == 0 {
        return 1.0;
    }
    let c = count as f64;
    let base_boost = c.sqrt() * 0.1;
    let milestones = PURE_MILESTONES.iter().filter(|m| count >= **m).count() as f64;

    let mut effective = c;
    if c > 100.0 {
        effective = 100.0 + (c - 100.0).powf(0.8);
    }
    if c > 500.0 {
        effective = 400.0 + (c - 500.0).powf(0.6);
    }

    let synergy = if all_pure_owned {
        (c + 1.0).log10() * 0.2
    } else {
        0.0
    };

    let raw = 1.0 + base_boost + milestones * 0.15 + effective * count_coefficient + synergy;
    if raw > 20.0 {
        18.0 + (raw - 20.0).powf(0.3)
    } else if raw > 10.0 {
        9.0 + (raw - 10.0).powf(0.5)
    } else if raw > 5.0 {
        5.0 + (raw - 5.0).powf(0.7)
    } else {
        raw
    }
}

/// Production multiplier a channel gets from its pure color count.
///
/// Exactly 1 at count 0. `all_pure_owned` adds the spectrum bonus and is
/// true only when all three pure colors are unlocked with a non-zero count.
pub fn pure_color_multiplier(count: u64, all_pure_owned: bool) -> f64 {
    pure_multiplier_with(count, all_pure_owned, PURE_COUNT_COEFFICIENT)
}

/// The older, steeper per-channel curve. Kept for balance comparisons;
/// production never calls it.
pub fn legacy_pure_color_multiplier(count: u64, all_pure_owned: bool) -> f64 {
    pure_multiplier_with(count, all_pure_owned, LEGACY_PURE_COUNT_COEFFICIENT)
}

/// Multiplier for the random generator from the three pure counts.
pub fn random_generator_multiplier(red: u64, green: u64, blue: u64) -> f64 {
    let total = red.saturating_add(green).saturating_add(blue);
    if total == 0 {
        return 1.0;
    }
    let total = total as f64;
    let average = total / 3.0;
    let min = red.min(green).min(blue) as f64;
    let max = red.max(green).max(blue).max(1) as f64;
    let balance_bonus = min / max * 0.5;
    let spectrum = if red > 0 && green > 0 && blue > 0 {
        (total + 1.0).log10() * 0.3
    } else {
        0.0
    };
    1.0 + average * 0.05 + balance_bonus + spectrum
}

// ---------------------------------------------------------------------------
// Lumen
// ---------------------------------------------------------------------------

/// RGB boost from lifetime lumen (chromatic resonance).
pub fn lumen_rgb_multiplier(lifetime_lumen: f64, resonance_level: u32) -> f64 {
    if resonance_level == 0 {
        return 1.0;
    }
    let effect = tables::lumen_upgrade(LumenUpgradeId::ChromaticResonance).effect;
    1.0 + (lifetime_lumen.max(0.0) + 10.0).log10() * effect * f64::from(resonance_level)
}

/// RGB boost from lumen generation above 100 per second (luminous overflow).
pub fn lumen_overflow_multiplier(lumen_per_second: f64, overflow_level: u32) -> f64 {
    if overflow_level == 0 || lumen_per_second <= 100.0 {
        return 1.0;
    }
    let effect = tables::lumen_upgrade(LumenUpgradeId::LuminousOverflow).effect;
    1.0 + (lumen_per_second - 100.0) * effect * f64::from(overflow_level) / 100.0
}

/// Conversion cost factor from held lumen (white pixel catalyst).
///
/// Each full thousand lumen cuts the cost by 10% per level, down to 10% of
/// the original.
pub fn conversion_cost_reduction(lumen_total: f64, catalyst_level: u32) -> f64 {
    if catalyst_level == 0 {
        return 1.0;
    }
    let effect = tables::lumen_upgrade(LumenUpgradeId::WhitePixelCatalyst).effect;
    let thousands = (lumen_total.max(0.0) / 1000.0).floor();
    (1.0 - effect * f64::from(catalyst_level) * thousands).max(0.1)
}

// ---------------------------------------------------------------------------
// Resolved set
// ---------------------------------------------------------------------------

/// Per-channel pure color multipliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PureMultipliers {
    /// From crimson.
    pub red: f64,
    /// From emerald.
    pub green: f64,
    /// From sapphire.
    pub blue: f64,
}

impl PureMultipliers {
    /// Multiplier for one channel.
    pub const fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
        }
    }
}

/// Every multiplier a cycle needs, resolved once from the ledgers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Synergies {
    /// Aggregate theoretical production before caps and synergies.
    pub theoretical: f64,
    /// Combined powerup multiplier.
    pub powerups: f64,
    /// `smooth_scale(T) / T`, breakthroughs included.
    pub soft_cap_ratio: f64,
    /// Chromatic resonance.
    pub lumen_rgb: f64,
    /// Luminous overflow.
    pub overflow: f64,
    /// Pure color multipliers per channel.
    pub pure: PureMultipliers,
    /// Random generator multiplier.
    pub random: f64,
    /// Conversion cost factor from the white pixel catalyst.
    pub conversion_reduction: f64,
    /// Lumen generated per second from the current white balance.
    pub lumen_per_second: f64,
}

impl Synergies {
    /// Read every ledger and resolve the cycle's multipliers.
    pub fn resolve(ledgers: &Ledgers) -> Self {
        let upgrades = ledgers.upgrades.state();
        let lumen = &ledgers.lumen;

        let theoretical = formulas::theoretical_production(upgrades);
        let breakthroughs = formulas::production_breakthrough_multiplier(upgrades);

        let lumen_per_second = formulas::lumen_per_second(
            ledgers.pixels.state().white,
            lumen.upgrade_level(LumenUpgradeId::QuantumEfficiency),
            lumen.upgrade_level(LumenUpgradeId::PhotonAmplifier),
        );

        let pure_count = |color: ColorId| {
            ledgers
                .colors
                .entry(color)
                .filter(|e| e.unlocked)
                .map_or(0, |e| e.count)
        };
        let red = pure_count(ColorId::Crimson);
        let green = pure_count(ColorId::Emerald);
        let blue = pure_count(ColorId::Sapphire);
        let all_pure = red > 0 && green > 0 && blue > 0;

        Self {
            theoretical,
            powerups: formulas::powerup_multiplier(upgrades),
            soft_cap_ratio: formulas::soft_cap_ratio(theoretical, breakthroughs),
            lumen_rgb: lumen_rgb_multiplier(
                lumen.lifetime(),
                lumen.upgrade_level(LumenUpgradeId::ChromaticResonance),
            ),
            overflow: lumen_overflow_multiplier(
                lumen_per_second,
                lumen.upgrade_level(LumenUpgradeId::LuminousOverflow),
            ),
            pure: PureMultipliers {
                red: pure_color_multiplier(red, all_pure),
                green: pure_color_multiplier(green, all_pure),
                blue: pure_color_multiplier(blue, all_pure),
            },
            random: random_generator_multiplier(red, green, blue),
            conversion_reduction: conversion_cost_reduction(
                lumen.total(),
                lumen.upgrade_level(LumenUpgradeId::WhitePixelCatalyst),
            ),
            lumen_per_second,
        }
    }

    /// Units per second one generator produces at `level`.
    pub fn generator_rate(&self, id: GeneratorId, level: u32) -> f64 {
        let color_bonus = match id.output() {
            GeneratorOutput::Fixed(channel) => self.pure.get(channel),
            GeneratorOutput::Random => self.random,
        };
        tables::generator(id).base_rate
            * f64::from(level)
            * self.powerups
            * self.lumen_rgb
            * self.overflow
            * color_bonus
            * self.soft_cap_ratio
    }
}
