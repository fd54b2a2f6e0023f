//! Static tuning tables.
//!
//! Every number a designer would tweak lives here as a `const fn` lookup on
//! a closed key. Formulas in [`crate::formulas`] read these tables; nothing
//! else does arithmetic on raw constants.

use chroma_types::{
    BreakthroughId, ColorFamily, ColorId, ConverterId, ConverterKind, GeneratorId,
    LumenGeneratorId, LumenUpgradeId, PowerupId, Tab,
};

// ---------------------------------------------------------------------------
// Upgrades
// ---------------------------------------------------------------------------

/// A pixel generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorSpec {
    /// Pixels per second per level.
    pub base_rate: f64,
    /// White cost of the first level.
    pub base_cost: f64,
    /// Cost growth per level.
    pub cost_multiplier: f64,
    /// Level cap.
    pub max_level: u32,
}

/// Generator table.
pub const fn generator(id: GeneratorId) -> GeneratorSpec {
    match id {
        GeneratorId::Red | GeneratorId::Green | GeneratorId::Blue => GeneratorSpec {
            base_rate: 0.3,
            base_cost: 3.0,
            cost_multiplier: 1.25,
            max_level: 10,
        },
        GeneratorId::Random => GeneratorSpec {
            base_rate: 0.9,
            base_cost: 5.0,
            cost_multiplier: 1.6,
            max_level: 15,
        },
    }
}

/// A production powerup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerupSpec {
    /// Nominal multiplier; each level adds `multiplier - 1`.
    pub multiplier: f64,
    /// White cost of the first level.
    pub base_cost: f64,
    /// Cost growth per level.
    pub cost_multiplier: f64,
    /// Level cap.
    pub max_level: u32,
}

/// Powerup table.
pub const fn powerup(id: PowerupId) -> PowerupSpec {
    match id {
        PowerupId::SpeedBoost => PowerupSpec {
            multiplier: 1.5,
            base_cost: 50.0,
            cost_multiplier: 4.0,
            max_level: 5,
        },
        PowerupId::MegaSpeed => PowerupSpec {
            multiplier: 2.0,
            base_cost: 500.0,
            cost_multiplier: 5.0,
            max_level: 3,
        },
        PowerupId::UltraSpeed => PowerupSpec {
            multiplier: 2.5,
            base_cost: 5000.0,
            cost_multiplier: 6.0,
            max_level: 2,
        },
    }
}

/// A one-shot breakthrough.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakthroughSpec {
    /// White cost.
    pub cost: u64,
    /// Effect size; meaning depends on the breakthrough.
    pub effect: f64,
}

/// Breakthrough table.
pub const fn breakthrough(id: BreakthroughId) -> BreakthroughSpec {
    let (cost, effect) = match id {
        BreakthroughId::Efficiency1 => (100, 1.15),
        BreakthroughId::Efficiency2 => (2500, 1.25),
        BreakthroughId::Efficiency3 => (50_000, 1.4),
        BreakthroughId::ConversionCatalyst => (150, 0.25),
        BreakthroughId::EfficiencyStabilizer => (300, 0.5),
        BreakthroughId::BulkConverter => (500, 10.0),
        BreakthroughId::WhiteAmplifier => (750, 0.25),
    };
    BreakthroughSpec { cost, effect }
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Efficiency decay exponent before the stabilizer.
pub const EFFICIENCY_DECAY: f64 = 0.2;
/// Conversions per efficiency decay step.
pub const EFFICIENCY_DECAY_SCALE: f64 = 50.0;
/// Efficiency never drops below this.
pub const EFFICIENCY_FLOOR: f64 = 0.1;

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// Unlock price curve for one color family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnlockCurve {
    /// Total RGB cost of the first unlock.
    pub base_cost: f64,
    /// Growth per unlocked color.
    pub multiplier: f64,
    /// Unlock count where the soft cap starts.
    pub soft_cap_threshold: u32,
    /// Exponent applied to growth past the threshold.
    pub soft_cap_power: f64,
}

/// Unlock curve table.
pub const fn unlock_curve(family: ColorFamily) -> UnlockCurve {
    match family {
        ColorFamily::Mixed => UnlockCurve {
            base_cost: 1000.0,
            multiplier: 1.8,
            soft_cap_threshold: 3,
            soft_cap_power: 0.7,
        },
        ColorFamily::Pure => UnlockCurve {
            base_cost: 5000.0,
            multiplier: 2.2,
            soft_cap_threshold: 2,
            soft_cap_power: 0.6,
        },
    }
}

/// How an unlock total is split across `[red, green, blue]`.
pub const fn unlock_split(color: ColorId) -> [f64; 3] {
    match color {
        ColorId::Crimson => [0.75, 0.15, 0.10],
        ColorId::Emerald => [0.10, 0.75, 0.15],
        ColorId::Sapphire => [0.15, 0.10, 0.75],
        _ => [0.35, 0.33, 0.32],
    }
}

/// Pure color counts where a flat bonus is granted.
pub const PURE_MILESTONES: [u64; 7] = [10, 25, 50, 100, 250, 500, 1000];

// ---------------------------------------------------------------------------
// Auto-converters
// ---------------------------------------------------------------------------

/// An auto-converter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConverterSpec {
    /// White cost of the first level.
    pub base_cost: f64,
    /// Cost growth per level.
    pub cost_multiplier: f64,
    /// Conversions per second at level 1.
    pub base_rate: f64,
    /// Rate growth per level past the first.
    pub rate_multiplier: f64,
    /// Level cap.
    pub max_level: u32,
    /// Lifetime white needed before purchase.
    pub unlock_requirement: u64,
}

/// Converter table.
pub const fn converter(id: ConverterId) -> ConverterSpec {
    match id.kind() {
        ConverterKind::White => ConverterSpec {
            base_cost: 5.0,
            cost_multiplier: 2.5,
            base_rate: 0.2,
            rate_multiplier: 1.5,
            max_level: 10,
            unlock_requirement: 10,
        },
        ConverterKind::Mixed => ConverterSpec {
            base_cost: 8.0,
            cost_multiplier: 2.8,
            base_rate: 0.4,
            rate_multiplier: 1.7,
            max_level: 6,
            unlock_requirement: 25,
        },
        ConverterKind::Pure => ConverterSpec {
            base_cost: 15.0,
            cost_multiplier: 3.2,
            base_rate: 0.15,
            rate_multiplier: 1.3,
            max_level: 3,
            unlock_requirement: 50,
        },
    }
}

// ---------------------------------------------------------------------------
// Lumen
// ---------------------------------------------------------------------------

/// A lumen upgrade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LumenUpgradeSpec {
    /// Effect size per level.
    pub effect: f64,
    /// Lumen cost of the first level.
    pub base_cost: f64,
    /// Cost growth per level.
    pub cost_multiplier: f64,
    /// Level cap.
    pub max_level: u32,
}

/// Lumen upgrade table.
pub const fn lumen_upgrade(id: LumenUpgradeId) -> LumenUpgradeSpec {
    let (effect, base_cost, cost_multiplier, max_level) = match id {
        LumenUpgradeId::PhotonAmplifier => (2.0, 100.0, 5.0, 10),
        LumenUpgradeId::QuantumEfficiency => (1.2, 500.0, 10.0, 5),
        LumenUpgradeId::ChromaticResonance => (0.5, 1000.0, 20.0, 3),
        LumenUpgradeId::WhitePixelCatalyst => (0.1, 2500.0, 25.0, 5),
        LumenUpgradeId::LuminousOverflow => (0.1, 5000.0, 50.0, 2),
    };
    LumenUpgradeSpec {
        effect,
        base_cost,
        cost_multiplier,
        max_level,
    }
}

/// A lux generator bought with lumen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LumenGeneratorSpec {
    /// Lumen cost at level 0.
    pub base_cost: f64,
    /// Cost growth per level.
    pub cost_multiplier: f64,
    /// Level cap.
    pub max_level: u32,
}

/// Lux generator table.
pub const fn lumen_generator(id: LumenGeneratorId) -> LumenGeneratorSpec {
    match id {
        LumenGeneratorId::Begin => LumenGeneratorSpec {
            base_cost: 1.0,
            cost_multiplier: 1.0,
            max_level: 1,
        },
        LumenGeneratorId::LumenBoost => LumenGeneratorSpec {
            base_cost: 5.0,
            cost_multiplier: 2.0,
            max_level: 5,
        },
        LumenGeneratorId::SelfSynergy => LumenGeneratorSpec {
            base_cost: 25.0,
            cost_multiplier: 3.0,
            max_level: 5,
        },
    }
}

/// White pixels needed before any lumen is generated.
pub const LUMEN_WHITE_THRESHOLD: f64 = 10.0;

/// Lux needed before a prestige reset is allowed.
pub const PRESTIGE_MIN_LUX: f64 = 10.0;

// ---------------------------------------------------------------------------
// Progression
// ---------------------------------------------------------------------------

/// Lifetime white needed to open a tab.
pub const fn tab_requirement(tab: Tab) -> u64 {
    match tab {
        Tab::Generators => 0,
        Tab::AutoConverters | Tab::Lumen => 10,
        Tab::MixedColors => 25,
        Tab::Powerups | Tab::PureColors => 50,
        Tab::Breakthroughs => 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlock_splits_sum_to_one() {
        for color in ColorId::ALL {
            let split = unlock_split(color);
            let sum: f64 = split.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "{color:?}");
        }
    }

    #[test]
    fn pure_splits_favor_own_channel() {
        for color in ColorId::PURE_UNLOCK_ORDER {
            let split = unlock_split(color);
            let own = color.primary_channel().map_or(0, |c| c as usize);
            let max = split.iter().copied().fold(0.0, f64::max);
            assert!((split.get(own).copied().unwrap_or(0.0) - max).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn converter_unlocks_rise_with_tier() {
        assert!(
            converter(ConverterId::WhiteConverter).unlock_requirement
                < converter(ConverterId::OrangeMixer).unlock_requirement
        );
        assert!(
            converter(ConverterId::OrangeMixer).unlock_requirement
                < converter(ConverterId::CrimsonForge).unlock_requirement
        );
    }
}
