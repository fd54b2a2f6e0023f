//! Runtime configuration loading for the Chroma engine.
//!
//! The canonical configuration lives in `chroma-config.yaml` at the project
//! root. Tuning numbers that belong to game balance stay compiled into
//! [`crate::tables`]; this file only carries what an operator may change
//! without a rebuild: loop timing, catch-up behaviour, persistence and
//! logging.

use std::path::{Path, PathBuf};

use chroma_types::PerformanceMode;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `chroma-config.yaml`. Every section is
/// optional and falls back to the defaults below.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Loop timing and performance-mode thresholds.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Production engine settings.
    #[serde(default)]
    pub production: ProductionConfig,

    /// Lux display smoothing.
    #[serde(default)]
    pub lux: LuxConfig,

    /// Save store selection and cadence.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `CHROMA_SAVE_DIR` overrides `persistence.save_dir`
    /// - `CHROMA_REDIS_URL` overrides `persistence.redis_url`
    /// - `CHROMA_MAX_CYCLES` overrides `scheduler.max_cycles`
    /// - `CHROMA_LOG_JSON` overrides `logging.json`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides on top of parsed values.
    pub fn apply_env_overrides(&mut self) {
        self.persistence.apply_env_overrides();
        if let Some(cycles) = std::env::var("CHROMA_MAX_CYCLES")
            .ok()
            .and_then(|val| val.parse().ok())
        {
            self.scheduler.max_cycles = cycles;
        }
        if let Ok(val) = std::env::var("CHROMA_LOG_JSON") {
            self.logging.json = matches!(val.as_str(), "1" | "true" | "yes");
        }
    }
}

// ---------------------------------------------------------------------------
// Per-mode durations
// ---------------------------------------------------------------------------

/// One duration in milliseconds for each [`PerformanceMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ModeDurations {
    /// Normal mode.
    pub normal_ms: u64,
    /// Medium mode.
    pub medium_ms: u64,
    /// High mode.
    pub high_ms: u64,
    /// Extreme mode.
    pub extreme_ms: u64,
    /// Emergency mode.
    pub emergency_ms: u64,
}

impl ModeDurations {
    /// Milliseconds for one mode.
    pub const fn get(&self, mode: PerformanceMode) -> u64 {
        match mode {
            PerformanceMode::Normal => self.normal_ms,
            PerformanceMode::Medium => self.medium_ms,
            PerformanceMode::High => self.high_ms,
            PerformanceMode::Extreme => self.extreme_ms,
            PerformanceMode::Emergency => self.emergency_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Game loop timing and performance-mode policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchedulerConfig {
    /// Tick interval per mode.
    #[serde(default = "default_tick_intervals")]
    pub tick_intervals: ModeDurations,

    /// UI refresh throttle per mode. Zero means every tick.
    #[serde(default = "default_ui_throttle")]
    pub ui_throttle: ModeDurations,

    /// Production (pixels per second) that switches UI throttling on while
    /// the loop stays in normal mode.
    #[serde(default = "default_ui_throttle_threshold")]
    pub ui_throttle_threshold: f64,

    /// Production that selects medium mode.
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: f64,

    /// Production that selects high mode.
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f64,

    /// Production that selects extreme mode.
    #[serde(default = "default_extreme_threshold")]
    pub extreme_threshold: f64,

    /// Reported frame rate below which the loop may enter emergency mode.
    #[serde(default = "default_fps_floor")]
    pub fps_floor: f64,

    /// How long the frame rate must stay below the floor.
    #[serde(default = "default_fps_sustain_ms")]
    pub fps_sustain_ms: u64,

    /// Stop after this many cycles (0 = run until stopped).
    #[serde(default)]
    pub max_cycles: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_intervals: default_tick_intervals(),
            ui_throttle: default_ui_throttle(),
            ui_throttle_threshold: default_ui_throttle_threshold(),
            medium_threshold: default_medium_threshold(),
            high_threshold: default_high_threshold(),
            extreme_threshold: default_extreme_threshold(),
            fps_floor: default_fps_floor(),
            fps_sustain_ms: default_fps_sustain_ms(),
            max_cycles: 0,
        }
    }
}

/// Production engine settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductionConfig {
    /// Elapsed seconds above which a tick takes the bulk catch-up path.
    #[serde(default = "default_catchup_threshold_secs")]
    pub catchup_threshold_secs: f64,

    /// Seed for the random generator's channel draws. `None` seeds from
    /// the operating system.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            catchup_threshold_secs: default_catchup_threshold_secs(),
            rng_seed: None,
        }
    }
}

/// Lux display smoothing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LuxConfig {
    /// Fraction of the gap closed per second.
    #[serde(default = "default_display_smoothing_rate")]
    pub display_smoothing_rate: f64,

    /// How often the smoother runs.
    #[serde(default = "default_display_refresh_ms")]
    pub display_refresh_ms: u64,
}

impl Default for LuxConfig {
    fn default() -> Self {
        Self {
            display_smoothing_rate: default_display_smoothing_rate(),
            display_refresh_ms: default_display_refresh_ms(),
        }
    }
}

/// Which key-value store holds the save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process map; lost on exit.
    Memory,
    /// One JSON file per key under `save_dir`.
    #[default]
    File,
    /// `Dragonfly` or Redis at `redis_url`.
    Dragonfly,
}

/// Save store selection and cadence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PersistenceConfig {
    /// Store implementation.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Directory for the file store.
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,

    /// Connection URL for the `Dragonfly` store.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Prefix for every key written to `Dragonfly`.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Minimum gap between saves per mode.
    #[serde(default = "default_save_intervals")]
    pub save_intervals: ModeDurations,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            save_dir: default_save_dir(),
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
            save_intervals: default_save_intervals(),
        }
    }
}

impl PersistenceConfig {
    /// Apply environment variable overrides for store locations.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CHROMA_SAVE_DIR") {
            self.save_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("CHROMA_REDIS_URL") {
            self.redis_url = val;
        }
    }
}

/// Log output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_tick_intervals() -> ModeDurations {
    ModeDurations {
        normal_ms: 100,
        medium_ms: 200,
        high_ms: 500,
        extreme_ms: 1000,
        emergency_ms: 2000,
    }
}

const fn default_ui_throttle() -> ModeDurations {
    ModeDurations {
        normal_ms: 0,
        medium_ms: 100,
        high_ms: 250,
        extreme_ms: 500,
        emergency_ms: 500,
    }
}

const fn default_save_intervals() -> ModeDurations {
    ModeDurations {
        normal_ms: 1000,
        medium_ms: 2000,
        high_ms: 5000,
        extreme_ms: 10_000,
        emergency_ms: 15_000,
    }
}

const fn default_ui_throttle_threshold() -> f64 {
    100_000.0
}

const fn default_medium_threshold() -> f64 {
    500_000.0
}

const fn default_high_threshold() -> f64 {
    1_000_000.0
}

const fn default_extreme_threshold() -> f64 {
    5_000_000.0
}

const fn default_fps_floor() -> f64 {
    30.0
}

const fn default_fps_sustain_ms() -> u64 {
    3000
}

const fn default_catchup_threshold_secs() -> f64 {
    300.0
}

const fn default_display_smoothing_rate() -> f64 {
    3.0
}

const fn default_display_refresh_ms() -> u64 {
    50
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("saves")
}

fn default_redis_url() -> String {
    String::from("redis://localhost:6379")
}

fn default_key_prefix() -> String {
    String::from("chroma")
}

fn default_log_level() -> String {
    String::from("info")
}
