//! Error types for the save layer.
//!
//! Store failures propagate as [`StoreError`], which wraps the underlying
//! I/O, [`fred`] and [`serde_json`] errors. A malformed *value* is not an
//! error: loading falls back to defaults for that key and logs a warning.
//! Import of a save bundle fails as a whole with [`ImportError`].

/// Errors from a key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A file store operation failed.
    #[error("file store I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A record could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store was configured with an unusable value.
    #[error("store configuration error: {0}")]
    Config(String),
}

/// Errors from importing a save bundle.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The text is not valid JSON, or a field has the wrong shape.
    #[error("save bundle is malformed: {source}")]
    Malformed {
        /// The underlying parse error.
        source: serde_json::Error,
    },

    /// The bundle is a JSON value but not an object.
    #[error("save bundle must be a JSON object")]
    NotAnObject,

    /// A required field is absent.
    #[error("save bundle is missing required field `{field}`")]
    MissingField {
        /// The missing field, as written in the bundle.
        field: &'static str,
    },

    /// The bundle was written by a newer format.
    #[error("save bundle version {version} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the bundle.
        version: u32,
        /// Newest version this build reads.
        supported: u32,
    },
}
