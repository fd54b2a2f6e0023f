//! Pure cost and rate formulas.
//!
//! Nothing in this module touches a ledger mutably or reads the clock.
//! Every function is a deterministic function of its arguments, which is
//! what makes the fast catch-up path reproducible and the soft caps
//! property-testable.
//!
//! # Soft Caps
//!
//! Growth curves are bent rather than clamped. Each bend applies to the
//! running value and is continuous at its breakpoint, so a player never
//! sees a rate drop when crossing a threshold.

use chroma_types::{
    BreakthroughId, ColorId, ConverterId, GeneratorId, LumenGeneratorId, LumenUpgradeId,
    PowerupId, RgbAmount, UpgradeState,
};

use crate::tables;

pub use chroma_ledger::numeric::{ceil_u64, floor_u64};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `floor(base * multiplier^level)` for leveled purchases.
pub fn leveled_cost(base: f64, multiplier: f64, level: u32) -> u64 {
    floor_u64(base * multiplier.powf(f64::from(level)))
}

// ---------------------------------------------------------------------------
// Upgrades
// ---------------------------------------------------------------------------

/// White cost of the next generator level.
pub fn generator_cost(id: GeneratorId, level: u32) -> u64 {
    let spec = tables::generator(id);
    leveled_cost(spec.base_cost, spec.cost_multiplier, level)
}

/// White cost of the next powerup level.
pub fn powerup_cost(id: PowerupId, level: u32) -> u64 {
    let spec = tables::powerup(id);
    leveled_cost(spec.base_cost, spec.cost_multiplier, level)
}

/// Combined powerup multiplier: `prod(1 + (multiplier - 1) * level)`.
pub fn powerup_multiplier(upgrades: &UpgradeState) -> f64 {
    PowerupId::ALL
        .into_iter()
        .map(|id| {
            let spec = tables::powerup(id);
            1.0 + (spec.multiplier - 1.0) * f64::from(upgrades.powerup_level(id))
        })
        .product()
}

/// Product of every purchased production breakthrough effect.
pub fn production_breakthrough_multiplier(upgrades: &UpgradeState) -> f64 {
    BreakthroughId::ALL
        .into_iter()
        .filter(|id| id.is_production_efficiency() && upgrades.has_breakthrough(*id))
        .map(|id| tables::breakthrough(id).effect)
        .product()
}

/// Aggregate theoretical production in pixels per second.
///
/// `sum(base_rate * level) * powerups`, before soft caps and synergies.
/// This is the figure the scheduler compares against its mode thresholds.
pub fn theoretical_production(upgrades: &UpgradeState) -> f64 {
    let base: f64 = GeneratorId::ALL
        .into_iter()
        .map(|id| tables::generator(id).base_rate * f64::from(upgrades.generator_level(id)))
        .sum();
    base * powerup_multiplier(upgrades)
}

/// Bend a production figure through the three soft-cap bands.
pub fn soft_cap_bend(x: f64) -> f64 {
    let mut y = x.max(0.0).powf(0.85) * 2.0;
    if y > 10.0 {
        y = 10.0 + (y - 10.0).powf(0.75) * 1.5;
    }
    if y > 100.0 {
        y = 100.0 + (y - 100.0).powf(0.6) * 1.2;
    }
    if y > 1000.0 {
        y = 1000.0 + (y - 1000.0).powf(0.45);
    }
    y
}

/// Effective aggregate production after soft caps and breakthroughs.
pub fn smooth_scale(x: f64, breakthrough_multiplier: f64) -> f64 {
    soft_cap_bend(x) * breakthrough_multiplier
}

/// `smooth_scale(T) / T`, or 1 when nothing is produced.
pub fn soft_cap_ratio(theoretical: f64, breakthrough_multiplier: f64) -> f64 {
    if theoretical > 0.0 {
        smooth_scale(theoretical, breakthrough_multiplier) / theoretical
    } else {
        1.0
    }
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// RGB cost per channel of one conversion to white.
pub fn conversion_cost(lifetime_white: u64, catalyst: bool, lumen_reduction: f64) -> u64 {
    let lw = lifetime_white as f64;
    let mut m = (1.0 + lw / 10.0).powf(0.4);
    if lw > 25.0 {
        m *= (lw / 25.0).powf(0.15);
    }
    if lw > 100.0 {
        m *= (lw / 100.0).powf(0.25);
    }
    if lw > 500.0 {
        m *= (lw / 500.0).powf(0.35);
    }
    if catalyst {
        m *= 1.0 - tables::breakthrough(BreakthroughId::ConversionCatalyst).effect;
    }
    m *= lumen_reduction;
    m *= 1.0 + (lw + 10.0).log10() * 0.2;
    ceil_u64(m).max(1)
}

/// Conversion efficiency after `total_conversions` successful conversions.
pub fn conversion_efficiency(total_conversions: u64, stabilizer: bool, amplifier: bool) -> f64 {
    let mut decay = tables::EFFICIENCY_DECAY;
    if stabilizer {
        decay *= 1.0 - tables::breakthrough(BreakthroughId::EfficiencyStabilizer).effect;
    }
    let mut efficiency =
        1.0 / (1.0 + total_conversions as f64 / tables::EFFICIENCY_DECAY_SCALE).powf(decay);
    if amplifier {
        efficiency *= 1.0 + tables::breakthrough(BreakthroughId::WhiteAmplifier).effect;
    }
    efficiency.max(tables::EFFICIENCY_FLOOR)
}

/// Sets converted per call when bulk conversion is owned.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub const BULK_SETS: u64 = tables::breakthrough(BreakthroughId::BulkConverter).effect as u64;

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// RGB cost of unlocking `color` after `purchased` paid unlocks in its
/// family. Colors unlocked on a fresh game do not count.
pub fn unlock_cost(color: ColorId, purchased: u32) -> RgbAmount {
    let curve = tables::unlock_curve(color.family());
    let n = f64::from(purchased);
    let raw = if purchased >= curve.soft_cap_threshold {
        let threshold = f64::from(curve.soft_cap_threshold);
        curve.base_cost
            * curve.multiplier.powf(threshold)
            * curve.multiplier.powf((n - threshold) * curve.soft_cap_power)
    } else {
        curve.base_cost * curve.multiplier.powf(n)
    };
    let total = ceil_u64(raw * (1.0 + (n + 10.0).log10() * 0.2)) as f64;
    let [r, g, b] = tables::unlock_split(color);
    RgbAmount {
        red: ceil_u64(total * r),
        green: ceil_u64(total * g),
        blue: ceil_u64(total * b),
    }
}

// ---------------------------------------------------------------------------
// Auto-converters
// ---------------------------------------------------------------------------

/// Conversions per second at `level`. Zero below level 1.
pub fn converter_rate(id: ConverterId, level: u32) -> f64 {
    if level == 0 {
        return 0.0;
    }
    let spec = tables::converter(id);
    spec.base_rate * spec.rate_multiplier.powf(f64::from(level - 1))
}

/// White cost of the next converter level.
pub fn converter_cost(id: ConverterId, level: u32) -> u64 {
    let spec = tables::converter(id);
    leveled_cost(spec.base_cost, spec.cost_multiplier, level)
}

// ---------------------------------------------------------------------------
// Lumen / Lux
// ---------------------------------------------------------------------------

/// Lumen per second from the current white balance.
pub fn lumen_per_second(white: u64, quantum_efficiency: u32, photon_amplifier: u32) -> f64 {
    let w = white as f64;
    if w < tables::LUMEN_WHITE_THRESHOLD {
        return 0.0;
    }
    let qe = tables::lumen_upgrade(LumenUpgradeId::QuantumEfficiency).effect;
    let pa = tables::lumen_upgrade(LumenUpgradeId::PhotonAmplifier).effect;

    let mut base = (w / 10.0).powf(0.6) * qe.powf(f64::from(quantum_efficiency));
    if base > 10.0 {
        base = 10.0 * (base / 10.0).powf(0.8);
    }
    if base > 100.0 {
        base = 100.0 * (base / 100.0).powf(0.65);
    }
    if base > 1000.0 {
        base = 1000.0 * (base / 1000.0).powf(0.5);
    }
    base * pa.powf(f64::from(photon_amplifier))
}

/// Actual lumen rate relative to the uncapped linear rate.
pub fn lumen_efficiency(white: u64, lumen_per_second: f64) -> f64 {
    let linear = (white as f64 / 10.0) * 0.6;
    if linear > 0.0 { lumen_per_second / linear } else { 0.0 }
}

/// Lumen cost of the next upgrade level.
pub fn lumen_upgrade_cost(id: LumenUpgradeId, level: u32) -> f64 {
    let spec = tables::lumen_upgrade(id);
    leveled_cost(spec.base_cost, spec.cost_multiplier, level) as f64
}

/// Lumen cost of the next lux generator level.
pub fn lumen_generator_cost(id: LumenGeneratorId, level: u32) -> f64 {
    let spec = tables::lumen_generator(id);
    if level == 0 {
        spec.base_cost
    } else {
        leveled_cost(spec.base_cost, spec.cost_multiplier, level) as f64
    }
}

/// Lux per second from the owned lux generators.
pub fn lux_per_second(
    begin_owned: bool,
    lumen_boost_owned: bool,
    self_synergy_level: u32,
    lumen_total: f64,
    lux_amount: f64,
) -> f64 {
    if !begin_owned {
        return 0.0;
    }
    let mut rate = 1.0;
    if lumen_boost_owned {
        rate *= (lumen_total.max(0.0) + 2.0).sqrt();
    }
    if self_synergy_level > 0 {
        let effect = 1.0 + (lux_amount.max(0.0) + 1.0).log10().powf(0.75);
        rate *= effect.powf(f64::from(self_synergy_level));
    }
    rate
}

/// Lumen granted for giving up `lux`.
pub fn prestige_reward(lux: f64) -> f64 {
    (lux.max(0.0) / tables::PRESTIGE_MIN_LUX).sqrt().floor()
}

/// Lux a player should aim for before prestige number `n + 1`.
pub fn prestige_threshold(prestige_level: u32) -> f64 {
    let next = f64::from(prestige_level) + 1.0;
    tables::PRESTIGE_MIN_LUX * next * next
}

#[cfg(test)]
mod tests {
    use chroma_types::OwnedLevel;

    use super::*;

    fn with_generator(id: GeneratorId, level: u32) -> UpgradeState {
        let mut upgrades = UpgradeState::default();
        upgrades
            .generators
            .insert(id, OwnedLevel { level, owned: true });
        upgrades
    }

    #[test]
    fn zero_state_conversion_costs_two() {
        assert_eq!(conversion_cost(0, false, 1.0), 2);
    }

    #[test]
    fn catalyst_and_lumen_lower_conversion_cost() {
        let plain = conversion_cost(5000, false, 1.0);
        assert!(conversion_cost(5000, true, 1.0) < plain);
        assert!(conversion_cost(5000, false, 0.5) < plain);
    }

    #[test]
    fn efficiency_floors_at_ten_percent() {
        assert!((conversion_efficiency(0, false, false) - 1.0).abs() < 1e-12);
        assert!((conversion_efficiency(u64::MAX / 2, false, false) - 0.1).abs() < 1e-12);
        assert!(conversion_efficiency(500, true, false) > conversion_efficiency(500, false, false));
        assert!((conversion_efficiency(0, false, true) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn first_mixed_unlock_costs_1200() {
        let cost = unlock_cost(ColorId::Yellow, 0);
        assert_eq!(cost.total(), 1200);
        assert_eq!(cost, RgbAmount { red: 420, green: 396, blue: 384 });
    }

    #[test]
    fn pure_unlock_weighted_to_own_channel() {
        let cost = unlock_cost(ColorId::Emerald, 0);
        assert!(cost.green > cost.red && cost.green > cost.blue);
    }

    #[test]
    fn unlock_cost_grows_with_unlocked_count() {
        let mut last = 0;
        for n in 0..6 {
            let total = unlock_cost(ColorId::Lime, n).total();
            assert!(total > last);
            last = total;
        }
    }

    #[test]
    fn smooth_scale_continuous_at_breakpoints() {
        // Walk the curve in 0.1% steps across every band; a discontinuity
        // would show up as a step far larger than the input step.
        let mut x = 0.01_f64;
        let mut last = soft_cap_bend(x);
        while x < 1.0e7 {
            x *= 1.001;
            let y = soft_cap_bend(x);
            assert!(y >= last, "not monotonic at {x}");
            assert!(y - last <= last * 0.01 + 1e-6, "jump at {x}: {last} -> {y}");
            last = y;
        }
    }

    #[test]
    fn soft_cap_ratio_is_one_with_no_production() {
        assert!((soft_cap_ratio(0.0, 1.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn powerups_compose_additively_per_powerup() {
        let mut upgrades = UpgradeState::default();
        upgrades.powerups.insert(PowerupId::SpeedBoost, 2);
        upgrades.powerups.insert(PowerupId::MegaSpeed, 1);
        // (1 + 0.5*2) * (1 + 1.0*1)
        assert!((powerup_multiplier(&upgrades) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn theoretical_production_sums_generators() {
        let upgrades = with_generator(GeneratorId::Random, 10);
        assert!((theoretical_production(&upgrades) - 9.0).abs() < 1e-9);
    }

    #[test]
    fn leveled_costs_follow_table() {
        assert_eq!(generator_cost(GeneratorId::Red, 0), 3);
        assert_eq!(generator_cost(GeneratorId::Red, 3), 5);
        assert_eq!(converter_cost(ConverterId::WhiteConverter, 1), 12);
        assert!((lumen_generator_cost(LumenGeneratorId::Begin, 0) - 1.0).abs() < f64::EPSILON);
        assert!((lumen_generator_cost(LumenGeneratorId::LumenBoost, 2) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn converter_rate_grows_from_level_one() {
        assert!(converter_rate(ConverterId::CyanMixer, 0).abs() < f64::EPSILON);
        assert!((converter_rate(ConverterId::CyanMixer, 1) - 0.4).abs() < 1e-12);
        assert!((converter_rate(ConverterId::CyanMixer, 2) - 0.68).abs() < 1e-12);
    }

    #[test]
    fn lumen_rate_starts_at_ten_white() {
        assert!(lumen_per_second(9, 0, 0).abs() < f64::EPSILON);
        assert!((lumen_per_second(10, 0, 0) - 1.0).abs() < 1e-12);
        assert!((lumen_per_second(10, 0, 1) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn lux_rate_requires_begin() {
        assert!(lux_per_second(false, true, 3, 100.0, 100.0).abs() < f64::EPSILON);
        assert!((lux_per_second(true, false, 0, 0.0, 0.0) - 1.0).abs() < f64::EPSILON);
        assert!((lux_per_second(true, true, 0, 2.0, 0.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn prestige_reward_and_threshold() {
        assert!((prestige_reward(10.0) - 1.0).abs() < f64::EPSILON);
        assert!((prestige_reward(39.0) - 1.0).abs() < f64::EPSILON);
        assert!((prestige_reward(40.0) - 2.0).abs() < f64::EPSILON);
        assert!((prestige_threshold(0) - 10.0).abs() < f64::EPSILON);
        assert!((prestige_threshold(2) - 90.0).abs() < f64::EPSILON);
    }
}
