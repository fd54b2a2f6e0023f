//! Load, save and clear a full session over any [`KeyValueStore`].
//!
//! # Keys
//!
//! ```text
//! pixels            PixelState
//! compositeColors   ColorState
//! lumen             LumenState
//! lux               LuxState
//! upgrades          UpgradeState
//! gameStats         GameStats
//! audioSettings     AudioSettings
//! autoConverters    AutoConverterState
//! gameLoop          GameLoopState
//! ```
//!
//! # Merge Over Defaults
//!
//! Every record type is `#[serde(default)]`, so a key written by an older
//! build that lacks newer fields still loads. A key that is absent loads as
//! its default. A key whose JSON does not parse also loads as its default,
//! with a warning; one corrupt record never blocks the rest of the save.
//! Inside enum-keyed maps the same holds per entry: a key this build does
//! not know is dropped and its siblings load.

use std::collections::BTreeMap;

use chroma_types::{SessionSnapshot, lenient};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::store::KeyValueStore;

/// One persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SaveKey {
    /// Pixel balances.
    Pixels,
    /// Composite colors.
    CompositeColors,
    /// Lumen economy.
    Lumen,
    /// Lux economy.
    Lux,
    /// White-pixel upgrades.
    Upgrades,
    /// Counters.
    GameStats,
    /// Audio preferences.
    AudioSettings,
    /// Auto-converters.
    AutoConverters,
    /// Loop bookkeeping.
    GameLoop,
}

impl SaveKey {
    /// Every key, in write order.
    pub const ALL: [Self; 9] = [
        Self::Pixels,
        Self::CompositeColors,
        Self::Lumen,
        Self::Lux,
        Self::Upgrades,
        Self::GameStats,
        Self::AudioSettings,
        Self::AutoConverters,
        Self::GameLoop,
    ];

    /// Store key.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pixels => "pixels",
            Self::CompositeColors => "compositeColors",
            Self::Lumen => "lumen",
            Self::Lux => "lux",
            Self::Upgrades => "upgrades",
            Self::GameStats => "gameStats",
            Self::AudioSettings => "audioSettings",
            Self::AutoConverters => "autoConverters",
            Self::GameLoop => "gameLoop",
        }
    }
}

/// Load a full session, merging every key over its default.
///
/// Only store failures are errors; malformed values fall back to defaults.
pub async fn load_snapshot(store: &impl KeyValueStore) -> Result<SessionSnapshot, StoreError> {
    let snapshot = SessionSnapshot {
        pixels: load_key(store, SaveKey::Pixels).await?,
        composite_colors: load_map_key(store, SaveKey::CompositeColors).await?,
        lumen: load_key(store, SaveKey::Lumen).await?,
        lux: load_key(store, SaveKey::Lux).await?,
        upgrades: load_key(store, SaveKey::Upgrades).await?,
        game_stats: load_key(store, SaveKey::GameStats).await?,
        audio_settings: load_key(store, SaveKey::AudioSettings).await?,
        auto_converters: load_map_key(store, SaveKey::AutoConverters).await?,
        game_loop: load_key(store, SaveKey::GameLoop).await?,
    };
    info!(
        lifetime_white = snapshot.pixels.lifetime_white,
        last_tick = ?snapshot.game_loop.last_tick,
        "Save loaded"
    );
    Ok(snapshot)
}

async fn load_key<T>(store: &impl KeyValueStore, key: SaveKey) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(key.as_str()).await? else {
        debug!(key = key.as_str(), "Key absent, using defaults");
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(key = key.as_str(), error = %e, "Malformed saved record, using defaults");
            Ok(T::default())
        }
    }
}

/// Like [`load_key`] for a record that is itself an enum-keyed map.
async fn load_map_key<K, V>(
    store: &impl KeyValueStore,
    key: SaveKey,
) -> Result<BTreeMap<K, V>, StoreError>
where
    K: DeserializeOwned + Ord,
    V: DeserializeOwned,
{
    let Some(raw) = store.get(key.as_str()).await? else {
        debug!(key = key.as_str(), "Key absent, using defaults");
        return Ok(BTreeMap::new());
    };
    let parsed = serde_json::from_str(&raw)
        .ok()
        .and_then(lenient::map_from_value);
    Ok(parsed.unwrap_or_else(|| {
        warn!(key = key.as_str(), "Malformed saved record, using defaults");
        BTreeMap::new()
    }))
}

/// Write every key of a snapshot.
pub async fn save_snapshot(
    store: &impl KeyValueStore,
    snapshot: &SessionSnapshot,
) -> Result<(), StoreError> {
    save_key(store, SaveKey::Pixels, &snapshot.pixels).await?;
    save_key(store, SaveKey::CompositeColors, &snapshot.composite_colors).await?;
    save_key(store, SaveKey::Lumen, &snapshot.lumen).await?;
    save_key(store, SaveKey::Lux, &snapshot.lux).await?;
    save_key(store, SaveKey::Upgrades, &snapshot.upgrades).await?;
    save_key(store, SaveKey::GameStats, &snapshot.game_stats).await?;
    save_key(store, SaveKey::AudioSettings, &snapshot.audio_settings).await?;
    save_key(store, SaveKey::AutoConverters, &snapshot.auto_converters).await?;
    save_key(store, SaveKey::GameLoop, &snapshot.game_loop).await?;
    Ok(())
}

async fn save_key<T: Serialize + Sync>(
    store: &impl KeyValueStore,
    key: SaveKey,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(value)?;
    store.set(key.as_str(), &json).await
}

/// Delete every key. The next load yields a fresh game.
pub async fn clear_all(store: &impl KeyValueStore) -> Result<(), StoreError> {
    for key in SaveKey::ALL {
        store.remove(key.as_str()).await?;
    }
    info!("Save cleared");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chroma_types::{ColorId, ConverterId, GeneratorId, PixelState, STARTING_LUX};

    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn empty_store_loads_fresh_game() {
        let store = MemoryStore::new();
        let snapshot = load_snapshot(&store).await.unwrap();
        assert_eq!(snapshot, SessionSnapshot::default());
        assert!((snapshot.lux.amount - STARTING_LUX).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn saved_snapshot_loads_back() {
        let store = MemoryStore::new();
        let mut snapshot = SessionSnapshot::default();
        snapshot.pixels = PixelState {
            red: 5,
            white: 3,
            lifetime_white: 9,
            ..PixelState::default()
        };
        snapshot.game_stats.total_clicks = 12;
        save_snapshot(&store, &snapshot).await.unwrap();
        assert_eq!(store.len().await, SaveKey::ALL.len());

        assert_eq!(load_snapshot(&store).await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn malformed_key_falls_back_without_losing_others() {
        let store = MemoryStore::new();
        store.set("pixels", "{not json").await.unwrap();
        store.set("gameStats", r#"{"totalClicks": 4}"#).await.unwrap();

        let snapshot = load_snapshot(&store).await.unwrap();
        assert_eq!(snapshot.pixels, PixelState::default());
        assert_eq!(snapshot.game_stats.total_clicks, 4);
    }

    #[tokio::test]
    async fn partial_record_merges_over_defaults() {
        let store = MemoryStore::new();
        store.set("lux", r#"{"amount": 42.0}"#).await.unwrap();
        let snapshot = load_snapshot(&store).await.unwrap();
        assert!((snapshot.lux.amount - 42.0).abs() < f64::EPSILON);
        assert!((snapshot.lux.best_amount - STARTING_LUX).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn unknown_map_keys_drop_only_their_entry() {
        let store = MemoryStore::new();
        store
            .set(
                "upgrades",
                r#"{"generators":{"red":{"level":3,"owned":true},"prism":{"level":1,"owned":true}}}"#,
            )
            .await
            .unwrap();
        store
            .set(
                "compositeColors",
                r#"{"orange":{"id":"orange","count":7,"unlocked":true},"ultraviolet":{"id":"ultraviolet"}}"#,
            )
            .await
            .unwrap();
        store
            .set(
                "autoConverters",
                r#"{"whiteConverter":{"level":2,"enabled":true},"prismMixer":{"level":1}}"#,
            )
            .await
            .unwrap();

        let snapshot = load_snapshot(&store).await.unwrap();
        assert_eq!(snapshot.upgrades.generator_level(GeneratorId::Red), 3);
        assert_eq!(snapshot.upgrades.generators.len(), 1);
        assert_eq!(snapshot.composite_colors.len(), 1);
        assert_eq!(
            snapshot
                .composite_colors
                .get(&ColorId::Orange)
                .unwrap()
                .count,
            7
        );
        assert_eq!(snapshot.auto_converters.len(), 1);
        let white = snapshot
            .auto_converters
            .get(&ConverterId::WhiteConverter)
            .unwrap();
        assert_eq!(white.level, 2);
        assert!(white.enabled);
    }

    #[tokio::test]
    async fn non_object_map_record_falls_back() {
        let store = MemoryStore::new();
        store.set("autoConverters", "[1, 2]").await.unwrap();
        let snapshot = load_snapshot(&store).await.unwrap();
        assert!(snapshot.auto_converters.is_empty());
    }

    #[tokio::test]
    async fn clear_all_removes_every_key() {
        let store = MemoryStore::new();
        save_snapshot(&store, &SessionSnapshot::default()).await.unwrap();
        clear_all(&store).await.unwrap();
        assert!(store.is_empty().await);
        assert_eq!(load_snapshot(&store).await.unwrap(), SessionSnapshot::default());
    }
}
