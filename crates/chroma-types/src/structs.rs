//! Persisted state records for every ledger family.
//!
//! Each record derives `#[serde(default)]` so that a snapshot written by an
//! older build merges cleanly over the compiled-in defaults: fields the save
//! does not know about take their default value, fields the build no longer
//! knows about are ignored. Enum-keyed maps go through [`crate::lenient`] so
//! an unknown key drops only its own entry.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{
    BreakthroughId, Channel, ColorFamily, ColorId, ConverterId, GeneratorId, LumenGeneratorId,
    LumenUpgradeId, PerformanceMode, PowerupId,
};

// ---------------------------------------------------------------------------
// RGB amounts
// ---------------------------------------------------------------------------

/// A quantity of red, green and blue pixels (a cost, a recipe, or a split).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "bindings/")]
pub struct RgbAmount {
    /// Red pixels.
    pub red: u64,
    /// Green pixels.
    pub green: u64,
    /// Blue pixels.
    pub blue: u64,
}

impl RgbAmount {
    /// The same amount on every channel.
    pub const fn uniform(n: u64) -> Self {
        Self {
            red: n,
            green: n,
            blue: n,
        }
    }

    /// Amount on one channel.
    pub const fn get(&self, channel: Channel) -> u64 {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
        }
    }

    /// Sum of all three channels.
    pub const fn total(&self) -> u64 {
        self.red.saturating_add(self.green).saturating_add(self.blue)
    }

    /// Multiply every channel, saturating.
    pub const fn times(&self, n: u64) -> Self {
        Self {
            red: self.red.saturating_mul(n),
            green: self.green.saturating_mul(n),
            blue: self.blue.saturating_mul(n),
        }
    }
}

// ---------------------------------------------------------------------------
// Pixels
// ---------------------------------------------------------------------------

/// Pixel balances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PixelState {
    /// Red pixels held.
    pub red: u64,
    /// Green pixels held.
    pub green: u64,
    /// Blue pixels held.
    pub blue: u64,
    /// White pixels held.
    pub white: u64,
    /// White pixels ever credited. Never decreases.
    pub lifetime_white: u64,
}

// ---------------------------------------------------------------------------
// Composite colors
// ---------------------------------------------------------------------------

/// One composite color and the player's progress on it.
///
/// `name`, `family`, `recipe` and `swatch` are copied from [`ColorId`] when
/// the ledger is built, whatever the save file says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ColorEntry {
    /// Which color.
    pub id: ColorId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Mixed or pure.
    #[serde(default)]
    pub family: ColorFamily,
    /// Pixels consumed per unit mixed.
    #[serde(default)]
    pub recipe: RgbAmount,
    /// Units mixed so far.
    #[serde(default)]
    pub count: u64,
    /// Whether mixing is available.
    #[serde(default)]
    pub unlocked: bool,
    /// UI swatch.
    #[serde(default)]
    pub swatch: String,
}

impl ColorEntry {
    /// Build an entry from the compiled table with the given progress.
    pub fn from_table(id: ColorId, count: u64, unlocked: bool) -> Self {
        Self {
            id,
            name: id.name().to_owned(),
            family: id.family(),
            recipe: id.recipe(),
            count,
            unlocked,
            swatch: id.swatch().to_owned(),
        }
    }
}

/// All composite colors keyed by id.
pub type ColorState = BTreeMap<ColorId, ColorEntry>;

// ---------------------------------------------------------------------------
// Upgrades
// ---------------------------------------------------------------------------

/// A leveled purchase that also records first ownership.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "bindings/")]
pub struct OwnedLevel {
    /// Levels bought.
    pub level: u32,
    /// Whether at least one level was bought.
    pub owned: bool,
}

/// Generators, powerups and breakthroughs bought with white pixels.
///
/// Missing keys read as level 0 / not purchased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "bindings/")]
pub struct UpgradeState {
    /// Pixel generators.
    #[serde(deserialize_with = "crate::lenient::map")]
    pub generators: BTreeMap<GeneratorId, OwnedLevel>,
    /// Powerup levels.
    #[serde(deserialize_with = "crate::lenient::map")]
    pub powerups: BTreeMap<PowerupId, u32>,
    /// One-shot breakthroughs.
    #[serde(deserialize_with = "crate::lenient::map")]
    pub breakthroughs: BTreeMap<BreakthroughId, bool>,
}

impl UpgradeState {
    /// Level of a generator, 0 when never bought.
    pub fn generator_level(&self, id: GeneratorId) -> u32 {
        self.generators.get(&id).map_or(0, |g| g.level)
    }

    /// Level of a powerup, 0 when never bought.
    pub fn powerup_level(&self, id: PowerupId) -> u32 {
        self.powerups.get(&id).copied().unwrap_or(0)
    }

    /// Whether a breakthrough was purchased.
    pub fn has_breakthrough(&self, id: BreakthroughId) -> bool {
        self.breakthroughs.get(&id).copied().unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Lumen / Lux
// ---------------------------------------------------------------------------

/// Lumen balances, upgrades and lux generators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct LumenState {
    /// Spendable lumen.
    pub total: f64,
    /// Lumen ever earned. Never decreases.
    pub lifetime_lumen: f64,
    /// Highest `total` ever held.
    pub best_lumen: f64,
    /// Lux generators bought with lumen.
    #[serde(deserialize_with = "crate::lenient::map")]
    pub generators: BTreeMap<LumenGeneratorId, OwnedLevel>,
    /// Lumen upgrade levels.
    #[serde(deserialize_with = "crate::lenient::map")]
    pub upgrades: BTreeMap<LumenUpgradeId, u32>,
    /// Prestige resets performed.
    pub prestige_level: u32,
}

impl LumenState {
    /// Level of a lumen upgrade.
    pub fn upgrade_level(&self, id: LumenUpgradeId) -> u32 {
        self.upgrades.get(&id).copied().unwrap_or(0)
    }

    /// Level and ownership of a lumen generator.
    pub fn generator(&self, id: LumenGeneratorId) -> OwnedLevel {
        self.generators.get(&id).copied().unwrap_or_default()
    }
}

/// Starting lux balance for a fresh game.
pub const STARTING_LUX: f64 = 10.0;

/// Lux balances and prestige bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct LuxState {
    /// Authoritative lux balance.
    pub amount: f64,
    /// Smoothed copy for display only.
    pub display_amount: f64,
    /// Lux ever earned. Survives prestige.
    pub lifetime_total: f64,
    /// Highest balance ever held. Survives prestige.
    pub best_amount: f64,
    /// Prestige resets performed.
    pub prestige_level: u32,
    /// Lumen banked through prestige rewards.
    pub total_lumen_earned: f64,
}

impl Default for LuxState {
    fn default() -> Self {
        Self {
            amount: STARTING_LUX,
            display_amount: STARTING_LUX,
            lifetime_total: STARTING_LUX,
            best_amount: STARTING_LUX,
            prestige_level: 0,
            total_lumen_earned: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Auto-converters
// ---------------------------------------------------------------------------

/// Player progress on one auto-converter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "bindings/")]
pub struct ConverterProgress {
    /// Levels bought.
    pub level: u32,
    /// Whether the converter runs on tick.
    pub enabled: bool,
}

/// All auto-converters keyed by id. Missing keys read as level 0, disabled.
pub type AutoConverterState = BTreeMap<ConverterId, ConverterProgress>;

// ---------------------------------------------------------------------------
// Statistics and settings
// ---------------------------------------------------------------------------

/// Gameplay counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GameStats {
    /// Manual pixel clicks.
    pub total_clicks: u64,
    /// Successful RGB to white conversions. Drives efficiency decay.
    pub total_conversions: u64,
    /// Accumulated play time.
    pub playtime_seconds: f64,
}

/// Audio preferences. The core stores them but never reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "bindings/")]
pub struct AudioSettings {
    /// Whether sound plays at all.
    pub enabled: bool,
    /// Volume in `0.0..=1.0`.
    pub volume: f64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.5,
        }
    }
}

/// Loop bookkeeping that must survive a restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GameLoopState {
    /// Wall-clock time of the last completed cycle. Drives offline catch-up.
    pub last_tick: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Every persisted record of one session at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SessionSnapshot {
    /// Pixel balances.
    pub pixels: PixelState,
    /// Composite colors.
    #[serde(deserialize_with = "crate::lenient::map")]
    pub composite_colors: ColorState,
    /// Lumen economy.
    pub lumen: LumenState,
    /// Lux economy.
    pub lux: LuxState,
    /// White-pixel upgrades.
    pub upgrades: UpgradeState,
    /// Auto-converters.
    #[serde(deserialize_with = "crate::lenient::map")]
    pub auto_converters: AutoConverterState,
    /// Counters.
    pub game_stats: GameStats,
    /// Audio preferences.
    pub audio_settings: AudioSettings,
    /// Loop bookkeeping.
    pub game_loop: GameLoopState,
}

/// A snapshot handed from the game loop to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PublishedSnapshot {
    /// Full session state after the cycle.
    pub snapshot: SessionSnapshot,
    /// Performance mode in force when the snapshot was taken.
    pub mode: PerformanceMode,
    /// Cycle number, starting at 1.
    pub cycle: u64,
    /// Wall-clock time the snapshot was taken.
    pub taken_at: DateTime<Utc>,
}

/// Portable save bundle for export and import.
///
/// Every field is required on import; a blob missing any of them is
/// rejected as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SaveExport {
    /// Format version.
    pub version: u32,
    /// When the export was taken.
    pub timestamp: DateTime<Utc>,
    /// Pixel balances.
    pub pixels: PixelState,
    /// White-pixel upgrades.
    pub upgrades: UpgradeState,
    /// Counters.
    pub game_stats: GameStats,
}
