//! Shared type definitions for the Chroma simulation core.
//!
//! This crate is the single source of truth for all types used across the
//! Chroma workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for an external UI.
//!
//! # Modules
//!
//! - [`ids`] -- UUID wrappers for runtime handles (session, scheduler systems)
//! - [`enums`] -- Closed key sets (channels, colors, upgrades, modes, tabs)
//! - [`structs`] -- Persisted state records and the save export bundle
//! - [`events`] -- Feedback events emitted by the production engine
//! - [`lenient`] -- Enum-keyed map deserialization that skips unknown keys

pub mod enums;
pub mod events;
pub mod ids;
pub mod lenient;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    BreakthroughId, Channel, ColorFamily, ColorId, ConverterId, ConverterKind, GeneratorId,
    GeneratorOutput, LumenGeneratorId, LumenUpgradeId, PerformanceMode, PixelKind, PowerupId, Tab,
};
pub use events::{ProducedResource, UnitProduced};
pub use ids::{SessionId, SystemId};
pub use structs::{
    AudioSettings, AutoConverterState, ColorEntry, ColorState, ConverterProgress, GameLoopState,
    GameStats, LumenState, LuxState, OwnedLevel, PixelState, PublishedSnapshot, RgbAmount,
    STARTING_LUX, SaveExport, SessionSnapshot, UpgradeState,
};
