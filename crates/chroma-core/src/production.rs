//! Per-tick production: generators, auto-converters, lumen and lux.
//!
//! # Accumulators
//!
//! Rates are fractional but ledgers hold whole units. Each generator and
//! converter owns an `f64` accumulator that receives `rate * dt` every tick;
//! only whole units leave it. The remainder carries into the next tick, so
//! a long run of small ticks credits the same total as one large tick,
//! within one unit.
//!
//! Accumulators belong to the engine and are never persisted. A restart
//! loses at most one unit per generator.
//!
//! # Tick Paths
//!
//! ```text
//! dt <= catchup_threshold   Iterative: credit per generator, emit UnitProduced
//! dt >  catchup_threshold   CatchUp:   same arithmetic, one bulk credit per
//!                                       resource, no events
//! ```

use std::collections::BTreeMap;

use chroma_ledger::{ColorMutator, LedgerError, Ledgers, PixelSpender};
use chroma_types::{
    BreakthroughId, Channel, ConverterId, ConverterKind, GeneratorId, GeneratorOutput,
    LumenGeneratorId, RgbAmount, UnitProduced,
};
use rand::Rng;

use crate::feedback::FeedbackSink;
use crate::formulas::{self, floor_u64};
use crate::gates;
use crate::synergy::Synergies;

/// Batches at or below this size draw a channel per unit; larger batches
/// split evenly and draw only the remainder.
pub const RANDOM_DRAW_LIMIT: u64 = 4096;

/// Which integration path a tick takes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TickPath {
    /// Normal per-tick credit with feedback events.
    #[default]
    Iterative,
    /// Offline or stalled catch-up: bulk credit, no events.
    CatchUp,
}

impl TickPath {
    /// Pick the path for an elapsed time.
    pub fn for_elapsed(dt: f64, catchup_threshold_secs: f64) -> Self {
        if dt > catchup_threshold_secs {
            Self::CatchUp
        } else {
            Self::Iterative
        }
    }

    /// Whether feedback events are emitted.
    pub const fn emits_events(self) -> bool {
        matches!(self, Self::Iterative)
    }
}

// ---------------------------------------------------------------------------
// Accumulators
// ---------------------------------------------------------------------------

/// Fractional carry-over per producer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulators {
    generators: BTreeMap<GeneratorId, f64>,
    converters: BTreeMap<ConverterId, f64>,
}

impl Accumulators {
    /// Pending fraction of a generator.
    pub fn generator(&self, id: GeneratorId) -> f64 {
        self.generators.get(&id).copied().unwrap_or(0.0)
    }

    /// Pending conversions of a converter.
    pub fn converter(&self, id: ConverterId) -> f64 {
        self.converters.get(&id).copied().unwrap_or(0.0)
    }

    /// Drop every pending fraction.
    pub fn clear(&mut self) {
        self.generators.clear();
        self.converters.clear();
    }

    /// Add `amount` and take out the whole units.
    fn take_generator(&mut self, id: GeneratorId, amount: f64) -> u64 {
        let slot = self.generators.entry(id).or_insert(0.0);
        *slot += sanitize_rate(amount);
        let whole = floor_u64(*slot);
        *slot -= whole as f64;
        whole
    }
}

fn sanitize_rate(amount: f64) -> f64 {
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Split `units` across the three channels uniformly at random.
pub fn split_random(units: u64, rng: &mut impl Rng) -> RgbAmount {
    let (mut split, draws) = if units <= RANDOM_DRAW_LIMIT {
        (RgbAmount::default(), units)
    } else {
        (RgbAmount::uniform(units / 3), units % 3)
    };
    for _ in 0..draws {
        match rng.random_range(0..3_u8) {
            0 => split.red += 1,
            1 => split.green += 1,
            _ => split.blue += 1,
        }
    }
    split
}

/// Run every owned generator for `dt` seconds.
///
/// Returns the pixels credited per channel.
pub fn run_generators(
    ledgers: &mut Ledgers,
    accumulators: &mut Accumulators,
    synergies: &Synergies,
    dt: f64,
    path: TickPath,
    rng: &mut impl Rng,
    sink: &mut dyn FeedbackSink,
) -> RgbAmount {
    let mut credited = RgbAmount::default();

    for id in GeneratorId::ALL {
        let level = ledgers.upgrades.generator_level(id);
        if level == 0 {
            continue;
        }
        let units = accumulators.take_generator(id, synergies.generator_rate(id, level) * dt);
        if units == 0 {
            continue;
        }
        let batch = match id.output() {
            GeneratorOutput::Fixed(channel) => single_channel(channel, units),
            GeneratorOutput::Random => split_random(units, rng),
        };

        if path.emits_events() {
            for channel in Channel::ALL {
                let count = batch.get(channel);
                ledgers.pixels.add_channel(channel, count);
                if count > 0 {
                    sink.on_unit_produced(&UnitProduced::pixels(channel, count));
                }
            }
        }
        credited = RgbAmount {
            red: credited.red.saturating_add(batch.red),
            green: credited.green.saturating_add(batch.green),
            blue: credited.blue.saturating_add(batch.blue),
        };
    }

    if !path.emits_events() {
        for channel in Channel::ALL {
            ledgers.pixels.add_channel(channel, credited.get(channel));
        }
    }
    credited
}

const fn single_channel(channel: Channel, units: u64) -> RgbAmount {
    match channel {
        Channel::Red => RgbAmount {
            red: units,
            green: 0,
            blue: 0,
        },
        Channel::Green => RgbAmount {
            red: 0,
            green: units,
            blue: 0,
        },
        Channel::Blue => RgbAmount {
            red: 0,
            green: 0,
            blue: units,
        },
    }
}

// ---------------------------------------------------------------------------
// Auto-converters
// ---------------------------------------------------------------------------

/// Work done by one converter in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConverterOutput {
    /// Which converter.
    pub id: ConverterId,
    /// Conversions performed.
    pub processed: u64,
}

/// Run every enabled, purchased and available converter for `dt` seconds.
///
/// A converter whose target color is locked does nothing and accumulates
/// nothing. A converter that cannot afford its full backlog processes what
/// it can and keeps the rest pending.
pub fn run_converters(
    ledgers: &mut Ledgers,
    accumulators: &mut Accumulators,
    synergies: &Synergies,
    dt: f64,
    path: TickPath,
    sink: &mut dyn FeedbackSink,
) -> Vec<ConverterOutput> {
    let white_cost = RgbAmount::uniform(formulas::conversion_cost(
        ledgers.pixels.lifetime_white(),
        ledgers
            .upgrades
            .has_breakthrough(BreakthroughId::ConversionCatalyst),
        synergies.conversion_reduction,
    ));

    let mut outputs = Vec::new();
    for id in ConverterId::ALL {
        if !ledgers.converters.is_active(id) || !gates::converter_available(ledgers, id) {
            continue;
        }
        let target = id.target_color();
        if let Some(color) = target
            && !ledgers.colors.is_unlocked(color)
        {
            continue;
        }
        let cost = match (id.kind(), target) {
            (ConverterKind::White, _) => white_cost,
            (ConverterKind::Mixed | ConverterKind::Pure, Some(color)) => color.recipe(),
            (ConverterKind::Mixed | ConverterKind::Pure, None) => continue,
        };

        let level = ledgers.converters.progress(id).level;
        let slot = accumulators.converters.entry(id).or_insert(0.0);
        *slot += sanitize_rate(formulas::converter_rate(id, level) * dt);
        let wanted = floor_u64(*slot);
        if wanted == 0 {
            continue;
        }
        let processed = wanted.min(ledgers.pixels.affordable_sets(cost));
        if processed == 0 || !ledgers.pixels.spend_rgb(cost.times(processed)) {
            continue;
        }
        *slot -= processed as f64;

        let event = match target {
            None => {
                ledgers.pixels.credit_white(processed);
                ledgers.stats.record_conversions(processed);
                UnitProduced::white(processed)
            }
            Some(color) => {
                ledgers.colors.add_color_bulk(color, processed);
                UnitProduced::color(color, processed)
            }
        };
        if path.emits_events() {
            sink.on_unit_produced(&event);
        }
        outputs.push(ConverterOutput { id, processed });
    }
    outputs
}

// ---------------------------------------------------------------------------
// Lumen / Lux / Playtime
// ---------------------------------------------------------------------------

/// Credit `lumen_per_second * dt` lumen. Returns the amount credited.
pub fn run_lumen(ledgers: &mut Ledgers, synergies: &Synergies, dt: f64) -> Result<f64, LedgerError> {
    let amount = synergies.lumen_per_second * dt.max(0.0);
    ledgers.lumen.add(amount)?;
    Ok(amount)
}

/// Lux generated per second by the owned lux generators.
pub fn lux_rate(ledgers: &Ledgers) -> f64 {
    let lumen = &ledgers.lumen;
    let self_synergy = lumen.generator(LumenGeneratorId::SelfSynergy);
    formulas::lux_per_second(
        lumen.generator(LumenGeneratorId::Begin).owned,
        lumen.generator(LumenGeneratorId::LumenBoost).owned,
        if self_synergy.owned {
            self_synergy.level
        } else {
            0
        },
        lumen.total(),
        ledgers.lux.amount(),
    )
}

/// Credit `lux_per_second * dt` lux. Returns the amount credited.
pub fn run_lux(ledgers: &mut Ledgers, dt: f64) -> Result<f64, LedgerError> {
    let amount = lux_rate(ledgers) * dt.max(0.0);
    ledgers.lux.add(amount)?;
    Ok(amount)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chroma_types::{ColorId, ConverterProgress, OwnedLevel, PixelKind, ProducedResource};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::feedback::{NoOpSink, RecordingSink};

    fn ledgers_with_generator(id: GeneratorId, level: u32) -> Ledgers {
        let mut ledgers = Ledgers::default();
        let mut upgrades = ledgers.upgrades.state().clone();
        upgrades
            .generators
            .insert(id, OwnedLevel { level, owned: true });
        ledgers.upgrades = chroma_ledger::UpgradeLedger::from_state(upgrades);
        ledgers
    }

    fn with_converter(mut ledgers: Ledgers, id: ConverterId, level: u32) -> Ledgers {
        let mut state = ledgers.converters.state().clone();
        state.insert(id, ConverterProgress { level, enabled: true });
        ledgers.converters = chroma_ledger::ConverterLedger::from_state(state);
        ledgers
    }

    #[test]
    fn fractions_carry_between_ticks() {
        let mut ledgers = ledgers_with_generator(GeneratorId::Red, 1);
        let synergies = Synergies::resolve(&ledgers);
        let rate = synergies.generator_rate(GeneratorId::Red, 1);
        let mut acc = Accumulators::default();
        let mut rng = SmallRng::seed_from_u64(42);

        // One tick shorter than a whole unit credits nothing but keeps the fraction.
        let dt = 0.5 / rate;
        let first = run_generators(
            &mut ledgers,
            &mut acc,
            &synergies,
            dt,
            TickPath::Iterative,
            &mut rng,
            &mut NoOpSink,
        );
        assert_eq!(first.red, 0);
        assert!((acc.generator(GeneratorId::Red) - 0.5).abs() < 1e-9);

        let second = run_generators(
            &mut ledgers,
            &mut acc,
            &synergies,
            dt * 1.5,
            TickPath::Iterative,
            &mut rng,
            &mut NoOpSink,
        );
        assert_eq!(second.red, 1);
        assert_eq!(ledgers.pixels.amount(PixelKind::Red), 1);
    }

    #[test]
    fn iterative_path_emits_events_and_catchup_does_not() {
        let mut ledgers = ledgers_with_generator(GeneratorId::Blue, 5);
        let synergies = Synergies::resolve(&ledgers);
        let mut acc = Accumulators::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut sink = RecordingSink::default();

        run_generators(
            &mut ledgers,
            &mut acc,
            &synergies,
            10.0,
            TickPath::Iterative,
            &mut rng,
            &mut sink,
        );
        assert!(!sink.events().is_empty());
        assert!(
            sink.events()
                .iter()
                .all(|e| e.resource == ProducedResource::Pixel(Channel::Blue))
        );

        sink.drain();
        run_generators(
            &mut ledgers,
            &mut acc,
            &synergies,
            1000.0,
            TickPath::CatchUp,
            &mut rng,
            &mut sink,
        );
        assert!(sink.events().is_empty());
        assert!(ledgers.pixels.amount(PixelKind::Blue) > 0);
    }

    #[test]
    fn random_split_conserves_units() {
        let mut rng = SmallRng::seed_from_u64(7);
        for units in [0_u64, 1, 2, 100, RANDOM_DRAW_LIMIT, RANDOM_DRAW_LIMIT + 2, 1_000_000] {
            assert_eq!(split_random(units, &mut rng).total(), units);
        }
    }

    #[test]
    fn white_converter_spends_current_cost() {
        let mut ledgers = with_converter(Ledgers::default(), ConverterId::WhiteConverter, 1);
        ledgers.pixels.add(PixelKind::White, 10);
        for channel in Channel::ALL {
            ledgers.pixels.add_channel(channel, 100);
        }
        let synergies = Synergies::resolve(&ledgers);
        let cost = formulas::conversion_cost(10, false, 1.0);
        let mut acc = Accumulators::default();
        let mut sink = RecordingSink::default();

        // Level 1 converts 0.2 per second.
        let out = run_converters(
            &mut ledgers,
            &mut acc,
            &synergies,
            10.0,
            TickPath::Iterative,
            &mut sink,
        );
        assert_eq!(out, vec![ConverterOutput { id: ConverterId::WhiteConverter, processed: 2 }]);
        assert_eq!(ledgers.pixels.amount(PixelKind::White), 12);
        assert_eq!(ledgers.pixels.amount(PixelKind::Red), 100 - 2 * cost);
        assert_eq!(ledgers.stats.total_conversions(), 2);
        assert_eq!(sink.events(), &[UnitProduced::white(2)]);
    }

    #[test]
    fn converter_keeps_backlog_when_short() {
        let mut ledgers = with_converter(Ledgers::default(), ConverterId::OrangeMixer, 1);
        ledgers.pixels.add(PixelKind::White, 25);
        ledgers.pixels.add_channel(Channel::Red, 2);
        ledgers.pixels.add_channel(Channel::Green, 1);
        let synergies = Synergies::resolve(&ledgers);
        let mut acc = Accumulators::default();

        // 0.4/s for 10 s wants 4 units, one is affordable.
        run_converters(
            &mut ledgers,
            &mut acc,
            &synergies,
            10.0,
            TickPath::CatchUp,
            &mut NoOpSink,
        );
        assert_eq!(ledgers.colors.count(ColorId::Orange), 1);
        assert_eq!(ledgers.pixels.total_rgb(), 0);
        assert!((acc.converter(ConverterId::OrangeMixer) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn locked_target_is_a_no_op() {
        let mut ledgers = with_converter(Ledgers::default(), ConverterId::CrimsonForge, 1);
        ledgers.pixels.add(PixelKind::White, 100);
        ledgers.pixels.add_channel(Channel::Red, 300);
        let synergies = Synergies::resolve(&ledgers);
        let mut acc = Accumulators::default();

        let out = run_converters(
            &mut ledgers,
            &mut acc,
            &synergies,
            100.0,
            TickPath::Iterative,
            &mut NoOpSink,
        );
        assert!(out.is_empty());
        assert_eq!(ledgers.pixels.amount(PixelKind::Red), 300);
        assert!(acc.converter(ConverterId::CrimsonForge).abs() < f64::EPSILON);
    }

    #[test]
    fn converters_wait_for_their_gate() {
        let mut ledgers = with_converter(Ledgers::default(), ConverterId::WhiteConverter, 1);
        for channel in Channel::ALL {
            ledgers.pixels.add_channel(channel, 100);
        }
        let synergies = Synergies::resolve(&ledgers);
        let out = run_converters(
            &mut ledgers,
            &mut Accumulators::default(),
            &synergies,
            100.0,
            TickPath::Iterative,
            &mut NoOpSink,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn lumen_and_lux_accrue() {
        let mut ledgers = Ledgers::default();
        ledgers.pixels.add(PixelKind::White, 10);
        assert!(ledgers.lumen.add(1.0).is_ok());
        assert!(ledgers.lumen.buy_generator(LumenGeneratorId::Begin, 1.0, 1));
        let synergies = Synergies::resolve(&ledgers);

        let lumen = run_lumen(&mut ledgers, &synergies, 2.0).unwrap();
        assert!((lumen - 2.0).abs() < 1e-9);

        let before = ledgers.lux.amount();
        let lux = run_lux(&mut ledgers, 3.0).unwrap();
        assert!((lux - 3.0).abs() < 1e-9);
        assert!((ledgers.lux.amount() - before - 3.0).abs() < 1e-9);
    }

    #[test]
    fn path_selection_uses_threshold() {
        assert_eq!(TickPath::for_elapsed(0.1, 300.0), TickPath::Iterative);
        assert_eq!(TickPath::for_elapsed(300.0, 300.0), TickPath::Iterative);
        assert_eq!(TickPath::for_elapsed(301.0, 300.0), TickPath::CatchUp);
    }
}
