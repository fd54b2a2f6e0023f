//! One play session: every ledger plus the engine-owned state around them.
//!
//! A [`GameSession`] is the single owner of game state. The scheduler holds
//! it behind one mutex; player commands take the same lock and call the
//! methods below. Each command prices through [`formulas`], checks its
//! progression gate, then hands the price to the owning ledger, which
//! either applies the whole change or nothing.
//!
//! # Cycle Context
//!
//! [`SimulationWorld::begin_cycle`] resolves [`Synergies`] once and picks
//! the [`TickPath`]. Every production system of that cycle reads the same
//! context, so a purchase made between two cycles never splits one cycle
//! across two multiplier sets.

use chrono::{DateTime, Utc};
use chroma_ledger::{
    AuditResult, Conversion, ConversionQuote, LedgerError, Ledgers, PixelLedger, StatsLedger,
    UpgradeLedger, audit,
};
use chroma_types::{
    BreakthroughId, Channel, ColorId, ConverterId, ConverterKind, GameLoopState, GeneratorId,
    LumenGeneratorId, LumenUpgradeId, PowerupId, RgbAmount, SaveExport, SessionId,
    SessionSnapshot, Tab,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info};

use crate::config::ProductionConfig;
use crate::feedback::FeedbackSink;
use crate::formulas;
use crate::gates::{self, TabStatus};
use crate::production::{self, Accumulators, ConverterOutput, TickPath};
use crate::scheduler::SimulationWorld;
use crate::synergy::Synergies;
use crate::tables;

/// Version written into every [`SaveExport`].
pub const EXPORT_VERSION: u32 = 1;

/// Multipliers and path shared by every system of one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleContext {
    /// Resolved at the start of the cycle.
    pub synergies: Synergies,
    /// Integration path of the cycle.
    pub path: TickPath,
    /// Seconds integrated by the cycle.
    pub dt: f64,
}

/// The full state of one play session.
pub struct GameSession {
    id: SessionId,
    started_at: DateTime<Utc>,
    ledgers: Ledgers,
    accumulators: Accumulators,
    rng: SmallRng,
    sink: Box<dyn FeedbackSink>,
    catchup_threshold_secs: f64,
    cycle: CycleContext,
    last_tick: Option<DateTime<Utc>>,
    reset_epoch: u64,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("started_at", &self.started_at)
            .field("ledgers", &self.ledgers)
            .field("last_tick", &self.last_tick)
            .field("reset_epoch", &self.reset_epoch)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Start a fresh game.
    pub fn new(config: &ProductionConfig, sink: Box<dyn FeedbackSink>) -> Self {
        Self::from_snapshot(SessionSnapshot::default(), config, sink)
    }

    /// Resume from a snapshot already merged over defaults.
    pub fn from_snapshot(
        snapshot: SessionSnapshot,
        config: &ProductionConfig,
        sink: Box<dyn FeedbackSink>,
    ) -> Self {
        let last_tick = snapshot.game_loop.last_tick;
        let ledgers = Ledgers::from_snapshot(snapshot);
        let rng = config
            .rng_seed
            .map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
        let cycle = CycleContext {
            synergies: Synergies::resolve(&ledgers),
            path: TickPath::Iterative,
            dt: 0.0,
        };
        let session = Self {
            id: SessionId::new(),
            started_at: Utc::now(),
            ledgers,
            accumulators: Accumulators::default(),
            rng,
            sink,
            catchup_threshold_secs: config.catchup_threshold_secs,
            cycle,
            last_tick,
            reset_epoch: 0,
        };
        info!(
            session_id = %session.id,
            lifetime_white = session.ledgers.pixels.lifetime_white(),
            resumed = last_tick.is_some(),
            "Game session created"
        );
        session
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// Session handle.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Wall-clock time the session was created.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Every ledger, read-only.
    pub const fn ledgers(&self) -> &Ledgers {
        &self.ledgers
    }

    /// Pending fractions per producer.
    pub const fn accumulators(&self) -> &Accumulators {
        &self.accumulators
    }

    /// Context of the most recent cycle.
    pub const fn cycle(&self) -> &CycleContext {
        &self.cycle
    }

    /// Wall-clock time of the last cycle, `None` before the first.
    pub const fn last_tick(&self) -> Option<DateTime<Utc>> {
        self.last_tick
    }

    /// Bumped by every reset and import. Snapshots from different epochs
    /// are not comparable.
    pub const fn reset_epoch(&self) -> u64 {
        self.reset_epoch
    }

    /// Seconds between the last cycle and `now`. Zero when there was none.
    pub fn offline_seconds(&self, now: DateTime<Utc>) -> f64 {
        self.last_tick.map_or(0.0, |last| {
            let millis = now.signed_duration_since(last).num_milliseconds().max(0);
            millis as f64 / 1000.0
        })
    }

    /// Progress of every tab.
    pub fn tab_status(&self) -> Vec<TabStatus> {
        gates::all_tab_status(&self.ledgers)
    }

    /// Current RGB cost of one conversion to white.
    pub fn conversion_cost(&self) -> u64 {
        formulas::conversion_cost(
            self.ledgers.pixels.lifetime_white(),
            self.ledgers
                .upgrades
                .has_breakthrough(BreakthroughId::ConversionCatalyst),
            Synergies::resolve(&self.ledgers).conversion_reduction,
        )
    }

    /// Current RGB price of unlocking `color`.
    pub fn unlock_price(&self, color: ColorId) -> RgbAmount {
        formulas::unlock_cost(
            color,
            self.ledgers.colors.purchased_in_family(color.family()),
        )
    }

    /// Lux a prestige would give up for the lumen it grants, if allowed.
    pub fn prestige_preview(&self) -> Option<f64> {
        let lux = self.ledgers.lux.amount();
        (lux >= tables::PRESTIGE_MIN_LUX).then(|| formulas::prestige_reward(lux))
    }

    // -----------------------------------------------------------------------
    // Pixel commands
    // -----------------------------------------------------------------------

    /// Manual click: one pixel of `channel`.
    pub const fn click(&mut self, channel: Channel) {
        self.ledgers.pixels.add_channel(channel, 1);
        self.ledgers.stats.record_click();
    }

    /// Convert RGB into white at the current terms.
    ///
    /// Returns `None` with nothing changed when not even one set is
    /// affordable.
    pub fn convert_to_white(&mut self) -> Option<Conversion> {
        let upgrades = &self.ledgers.upgrades;
        let quote = ConversionQuote {
            cost_per_channel: self.conversion_cost(),
            efficiency: formulas::conversion_efficiency(
                self.ledgers.stats.total_conversions(),
                upgrades.has_breakthrough(BreakthroughId::EfficiencyStabilizer),
                upgrades.has_breakthrough(BreakthroughId::WhiteAmplifier),
            ),
            bulk_sets: upgrades
                .has_breakthrough(BreakthroughId::BulkConverter)
                .then_some(formulas::BULK_SETS),
        };
        let conversion = self.ledgers.pixels.convert_to_white(&quote)?;
        self.ledgers.stats.record_conversions(conversion.sets);
        debug!(
            sets = conversion.sets,
            white = conversion.white,
            cost = quote.cost_per_channel,
            "Converted to white"
        );
        Some(conversion)
    }

    // -----------------------------------------------------------------------
    // Upgrade commands
    // -----------------------------------------------------------------------

    /// Buy one generator level with white pixels.
    pub fn buy_generator(&mut self, id: GeneratorId) -> bool {
        let level = self.ledgers.upgrades.generator_level(id);
        let cost = formulas::generator_cost(id, level);
        let max_level = tables::generator(id).max_level;
        self.ledgers
            .upgrades
            .buy_generator(id, cost, max_level, &mut self.ledgers.pixels)
    }

    /// Buy one powerup level. Needs the powerups tab.
    pub fn buy_powerup(&mut self, id: PowerupId) -> bool {
        if !gates::is_tab_unlocked(&self.ledgers, Tab::Powerups) {
            return false;
        }
        let level = self.ledgers.upgrades.powerup_level(id);
        let cost = formulas::powerup_cost(id, level);
        let max_level = tables::powerup(id).max_level;
        self.ledgers
            .upgrades
            .buy_powerup(id, cost, max_level, &mut self.ledgers.pixels)
    }

    /// Buy a breakthrough. Needs the breakthroughs tab.
    pub fn buy_breakthrough(&mut self, id: BreakthroughId) -> bool {
        if !gates::is_tab_unlocked(&self.ledgers, Tab::Breakthroughs) {
            return false;
        }
        let cost = tables::breakthrough(id).cost;
        self.ledgers
            .upgrades
            .buy_breakthrough(id, cost, &mut self.ledgers.pixels)
    }

    // -----------------------------------------------------------------------
    // Color commands
    // -----------------------------------------------------------------------

    /// Unlock a composite color. Needs the family's tab.
    pub fn unlock_color(&mut self, color: ColorId) -> bool {
        if !gates::is_tab_unlocked(&self.ledgers, gates::color_tab(color.family())) {
            return false;
        }
        let cost = self.unlock_price(color);
        self.ledgers
            .colors
            .unlock(color, cost, &mut self.ledgers.pixels)
    }

    /// Mix one unit of an unlocked color.
    pub fn mix_color(&mut self, color: ColorId) -> bool {
        self.ledgers.colors.mix(color, &mut self.ledgers.pixels)
    }

    // -----------------------------------------------------------------------
    // Converter commands
    // -----------------------------------------------------------------------

    /// Buy one converter level. A pure forge also needs its target color
    /// unlocked.
    pub fn buy_converter(&mut self, id: ConverterId) -> bool {
        if !gates::converter_available(&self.ledgers, id) {
            return false;
        }
        if id.kind() == ConverterKind::Pure
            && !id
                .target_color()
                .is_some_and(|color| self.ledgers.colors.entry(color).is_some_and(|e| e.unlocked))
        {
            return false;
        }
        let level = self.ledgers.converters.progress(id).level;
        let cost = formulas::converter_cost(id, level);
        let max_level = tables::converter(id).max_level;
        self.ledgers
            .converters
            .upgrade(id, cost, max_level, &mut self.ledgers.pixels)
    }

    /// Flip a purchased converter on or off.
    pub fn toggle_converter(&mut self, id: ConverterId) -> Option<bool> {
        self.ledgers.converters.toggle(id)
    }

    /// Disable every purchased converter.
    pub fn pause_all_converters(&mut self) -> usize {
        self.ledgers.converters.pause_all()
    }

    /// Enable every purchased converter.
    pub fn resume_all_converters(&mut self) -> usize {
        self.ledgers.converters.resume_all()
    }

    // -----------------------------------------------------------------------
    // Lumen / Lux commands
    // -----------------------------------------------------------------------

    /// Buy one lumen upgrade level. Needs the lumen tab.
    pub fn buy_lumen_upgrade(&mut self, id: LumenUpgradeId) -> bool {
        if !gates::is_tab_unlocked(&self.ledgers, Tab::Lumen) {
            return false;
        }
        let level = self.ledgers.lumen.upgrade_level(id);
        let cost = formulas::lumen_upgrade_cost(id, level);
        self.ledgers
            .lumen
            .buy_upgrade(id, cost, tables::lumen_upgrade(id).max_level)
    }

    /// Buy one lux generator level. Needs the lumen tab and the
    /// prerequisite generator.
    pub fn buy_lumen_generator(&mut self, id: LumenGeneratorId) -> bool {
        if !gates::is_tab_unlocked(&self.ledgers, Tab::Lumen) {
            return false;
        }
        let level = self.ledgers.lumen.generator(id).level;
        let cost = formulas::lumen_generator_cost(id, level);
        self.ledgers
            .lumen
            .buy_generator(id, cost, tables::lumen_generator(id).max_level)
    }

    /// Give up every lux for lumen.
    ///
    /// Returns the lumen granted, or `None` with nothing changed when the
    /// balance is below the prestige minimum.
    pub fn prestige(&mut self) -> Result<Option<f64>, LedgerError> {
        let Some(reward) = self.prestige_preview() else {
            return Ok(None);
        };
        self.ledgers.lumen.add(reward)?;
        let given_up = self.ledgers.lux.reset_for_prestige(reward);
        self.ledgers.lumen.record_prestige();
        info!(
            given_up,
            reward,
            prestige_level = self.ledgers.lux.prestige_level(),
            "Prestige"
        );
        Ok(Some(reward))
    }

    /// Move the lux display copy toward the real balance.
    pub fn smooth_lux_display(&mut self, dt: f64, rate: f64) {
        self.ledgers.lux.smooth_display(dt, rate);
    }

    // -----------------------------------------------------------------------
    // Reset / persistence
    // -----------------------------------------------------------------------

    /// Reinitialize every ledger to a fresh game.
    pub fn full_reset(&mut self) {
        self.reset_ledgers(Ledgers::default());
        info!(session_id = %self.id, epoch = self.reset_epoch, "Full reset");
    }

    /// Reinitialize the economy but keep statistics and audio settings.
    pub fn soft_reset(&mut self) {
        let fresh = Ledgers {
            stats: self.ledgers.stats.clone(),
            audio: self.ledgers.audio.clone(),
            ..Ledgers::default()
        };
        self.reset_ledgers(fresh);
        info!(session_id = %self.id, epoch = self.reset_epoch, "Soft reset");
    }

    fn reset_ledgers(&mut self, ledgers: Ledgers) {
        self.ledgers = ledgers;
        self.accumulators.clear();
        self.last_tick = None;
        self.cycle.synergies = Synergies::resolve(&self.ledgers);
        self.reset_epoch = self.reset_epoch.saturating_add(1);
    }

    /// Flatten the session into a persistable snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            game_loop: GameLoopState {
                last_tick: self.last_tick,
            },
            ..self.ledgers.snapshot()
        }
    }

    /// Audit the current state against an earlier snapshot.
    pub fn audit_against(&self, before: &SessionSnapshot) -> AuditResult {
        audit(before, &self.snapshot())
    }

    /// Bundle the portable part of the save.
    pub fn export(&self, now: DateTime<Utc>) -> SaveExport {
        SaveExport {
            version: EXPORT_VERSION,
            timestamp: now,
            pixels: *self.ledgers.pixels.state(),
            upgrades: self.ledgers.upgrades.state().clone(),
            game_stats: self.ledgers.stats.state().clone(),
        }
    }

    /// Replace pixels, upgrades and statistics with an imported bundle.
    pub fn apply_import(&mut self, import: SaveExport) {
        self.ledgers.pixels = PixelLedger::from_state(import.pixels);
        self.ledgers.upgrades = UpgradeLedger::from_state(import.upgrades);
        self.ledgers.stats = StatsLedger::from_state(import.game_stats);
        self.accumulators.clear();
        self.cycle.synergies = Synergies::resolve(&self.ledgers);
        self.reset_epoch = self.reset_epoch.saturating_add(1);
        info!(
            session_id = %self.id,
            version = import.version,
            exported_at = %import.timestamp,
            "Save imported"
        );
    }

    // -----------------------------------------------------------------------
    // Production, driven by the systems
    // -----------------------------------------------------------------------

    pub(crate) fn produce_pixels(&mut self, dt: f64) -> RgbAmount {
        production::run_generators(
            &mut self.ledgers,
            &mut self.accumulators,
            &self.cycle.synergies,
            dt,
            self.cycle.path,
            &mut self.rng,
            self.sink.as_mut(),
        )
    }

    pub(crate) fn run_converters(&mut self, dt: f64) -> Vec<ConverterOutput> {
        production::run_converters(
            &mut self.ledgers,
            &mut self.accumulators,
            &self.cycle.synergies,
            dt,
            self.cycle.path,
            self.sink.as_mut(),
        )
    }

    pub(crate) fn produce_lumen(&mut self, dt: f64) -> Result<f64, LedgerError> {
        production::run_lumen(&mut self.ledgers, &self.cycle.synergies, dt)
    }

    pub(crate) fn produce_lux(&mut self, dt: f64) -> Result<f64, LedgerError> {
        production::run_lux(&mut self.ledgers, dt)
    }

    pub(crate) fn add_playtime(&mut self, dt: f64) {
        self.ledgers.stats.add_playtime(dt);
    }
}

impl SimulationWorld for GameSession {
    fn begin_cycle(&mut self, dt: f64) -> TickPath {
        let path = TickPath::for_elapsed(dt, self.catchup_threshold_secs);
        self.cycle = CycleContext {
            synergies: Synergies::resolve(&self.ledgers),
            path,
            dt,
        };
        self.last_tick = Some(Utc::now());
        path
    }

    fn theoretical_production(&self) -> f64 {
        formulas::theoretical_production(self.ledgers.upgrades.state())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chroma_types::{ColorFamily, PixelKind, PixelState};

    use super::*;
    use crate::feedback::NoOpSink;

    fn config() -> ProductionConfig {
        ProductionConfig {
            rng_seed: Some(7),
            ..ProductionConfig::default()
        }
    }

    fn session_with(pixels: PixelState) -> GameSession {
        let snapshot = SessionSnapshot {
            pixels,
            ..SessionSnapshot::default()
        };
        GameSession::from_snapshot(snapshot, &config(), Box::new(NoOpSink))
    }

    fn rich(white: u64) -> GameSession {
        session_with(PixelState {
            red: 100_000,
            green: 100_000,
            blue: 100_000,
            white,
            lifetime_white: white,
        })
    }

    #[test]
    fn click_credits_one_pixel() {
        let mut session = GameSession::new(&config(), Box::new(NoOpSink));
        session.click(Channel::Green);
        assert_eq!(session.ledgers().pixels.amount(PixelKind::Green), 1);
        assert_eq!(session.ledgers().stats.state().total_clicks, 1);
    }

    #[test]
    fn zero_state_conversion_costs_two() {
        let mut session = session_with(PixelState {
            red: 2,
            green: 2,
            blue: 2,
            ..PixelState::default()
        });
        assert_eq!(session.conversion_cost(), 2);
        let conversion = session.convert_to_white().unwrap();
        assert_eq!(conversion, Conversion { sets: 1, white: 1 });
        assert_eq!(session.ledgers().pixels.total_rgb(), 0);
        assert_eq!(session.ledgers().stats.total_conversions(), 1);
        assert!(session.convert_to_white().is_none());
    }

    #[test]
    fn first_mixed_unlock_costs_1200() {
        let mut session = rich(25);
        let price = session.unlock_price(ColorId::Yellow);
        assert_eq!(price, RgbAmount { red: 420, green: 396, blue: 384 });
        assert!(session.unlock_color(ColorId::Yellow));
        assert_eq!(session.ledgers().pixels.amount(PixelKind::Red), 100_000 - 420);
        assert!(!session.unlock_color(ColorId::Yellow));
    }

    #[test]
    fn color_unlock_waits_for_tab() {
        let mut session = rich(24);
        assert!(!session.unlock_color(ColorId::Yellow));
        assert_eq!(session.ledgers().pixels.total_rgb(), 300_000);
        assert_eq!(session.ledgers().colors.unlocked_in_family(ColorFamily::Mixed), 1);
    }

    #[test]
    fn purchases_respect_gates_and_funds() {
        let mut session = rich(40);
        assert!(session.buy_generator(GeneratorId::Red));
        assert_eq!(session.ledgers().pixels.amount(PixelKind::White), 37);
        assert!(!session.buy_powerup(PowerupId::SpeedBoost));
        assert!(!session.buy_breakthrough(BreakthroughId::Efficiency1));
        assert!(session.buy_converter(ConverterId::WhiteConverter));
        assert!(!session.buy_converter(ConverterId::CrimsonForge));
    }

    #[test]
    fn forge_needs_unlocked_target() {
        let mut session = rich(100_000);
        assert!(!session.buy_converter(ConverterId::CrimsonForge));
        assert!(session.unlock_color(ColorId::Crimson));
        assert!(session.buy_converter(ConverterId::CrimsonForge));
        assert_eq!(session.toggle_converter(ConverterId::CrimsonForge), Some(false));
        assert_eq!(session.resume_all_converters(), 1);
    }

    #[test]
    fn prestige_needs_minimum_lux() {
        let mut session = GameSession::new(&config(), Box::new(NoOpSink));
        // A fresh game holds exactly the minimum.
        assert_eq!(session.prestige().unwrap(), Some(1.0));
        assert!(session.ledgers().lux.amount().abs() < f64::EPSILON);
        assert!((session.ledgers().lumen.total() - 1.0).abs() < f64::EPSILON);
        assert_eq!(session.ledgers().lux.prestige_level(), 1);
        assert_eq!(session.ledgers().lumen.state().prestige_level, 1);
        assert_eq!(session.prestige().unwrap(), None);
    }

    #[test]
    fn full_reset_restores_defaults_and_bumps_epoch() {
        let mut session = rich(500);
        session.click(Channel::Red);
        session.full_reset();
        assert_eq!(session.ledgers(), &Ledgers::default());
        assert_eq!(session.reset_epoch(), 1);
        assert!(session.last_tick().is_none());
    }

    #[test]
    fn soft_reset_keeps_stats() {
        let mut session = rich(500);
        session.click(Channel::Red);
        session.soft_reset();
        assert_eq!(session.ledgers().pixels.lifetime_white(), 0);
        assert_eq!(session.ledgers().stats.state().total_clicks, 1);
    }

    #[test]
    fn export_then_import_restores_portable_state() {
        let mut session = rich(300);
        assert!(session.buy_generator(GeneratorId::Random));
        let bundle = session.export(Utc::now());
        assert_eq!(bundle.version, EXPORT_VERSION);

        let mut other = GameSession::new(&config(), Box::new(NoOpSink));
        other.apply_import(bundle);
        assert_eq!(other.ledgers().pixels, session.ledgers().pixels);
        assert_eq!(other.ledgers().upgrades.generator_level(GeneratorId::Random), 1);
        assert_eq!(other.reset_epoch(), 1);
    }

    #[test]
    fn begin_cycle_picks_path_and_stamps_last_tick() {
        let mut session = GameSession::new(&config(), Box::new(NoOpSink));
        assert_eq!(session.begin_cycle(0.1), TickPath::Iterative);
        assert!(session.last_tick().is_some());
        assert_eq!(session.begin_cycle(3600.0), TickPath::CatchUp);
        assert_eq!(session.snapshot().game_loop.last_tick, session.last_tick());
    }

    #[test]
    fn offline_seconds_measures_from_last_tick() {
        let last = Utc::now();
        let snapshot = SessionSnapshot {
            game_loop: GameLoopState {
                last_tick: Some(last),
            },
            ..SessionSnapshot::default()
        };
        let session = GameSession::from_snapshot(snapshot, &config(), Box::new(NoOpSink));
        let later = last + chrono::Duration::seconds(90);
        assert!((session.offline_seconds(later) - 90.0).abs() < 1e-9);
        assert!(session.offline_seconds(last - chrono::Duration::seconds(5)).abs() < f64::EPSILON);
    }
}
