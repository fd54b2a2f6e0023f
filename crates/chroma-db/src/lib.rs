//! Save layer for the Chroma simulation core.
//!
//! The game loop never touches storage. It publishes audited snapshots on
//! a channel; the saver in this crate writes the newest one at a
//! mode-dependent cadence into whichever key-value store is configured.
//!
//! # Architecture
//!
//! ```text
//! Scheduler cycle
//!     |
//!     +-- SnapshotPublisher --watch--> run_saver (throttled per mode)
//!                                          |
//!                                          +-- save_snapshot --> SaveStore
//!                                                                 |-- MemoryStore
//!                                                                 |-- FileStore      (one JSON file per key)
//!                                                                 +-- DragonflyStore ({prefix}:{key})
//! ```
//!
//! # Modules
//!
//! - [`store`] -- [`KeyValueStore`] trait and the in-memory store
//! - [`file`] -- Directory-backed store with atomic writes
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) store
//! - [`backend`] -- [`SaveStore`]: runtime selection from configuration
//! - [`persistence`] -- Per-key load with merge over defaults, save, clear
//! - [`saver`] -- Background saver task
//! - [`export`] -- Portable save bundles
//! - [`error`] -- Shared error types

pub mod backend;
pub mod dragonfly;
pub mod error;
pub mod export;
pub mod file;
pub mod persistence;
pub mod saver;
pub mod store;

// Re-export primary types for convenience.
pub use backend::SaveStore;
pub use dragonfly::DragonflyStore;
pub use error::{ImportError, StoreError};
pub use export::{export_text, parse_import};
pub use file::FileStore;
pub use persistence::{SaveKey, clear_all, load_snapshot, save_snapshot};
pub use saver::{SaveCadence, SaverSummary, run_saver};
pub use store::{KeyValueStore, MemoryStore};
