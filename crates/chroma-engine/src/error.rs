//! Error types for the engine binary.

/// Top-level error for the engine binary.
///
/// Each variant wraps a subsystem error so `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: chroma_core::config::ConfigError,
    },

    /// The save store could not be opened, read or written.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: chroma_db::StoreError,
    },

    /// A save bundle could not be imported.
    #[error("import error: {source}")]
    Import {
        /// The underlying import error.
        #[from]
        source: chroma_db::ImportError,
    },

    /// Reading or writing a bundle file failed.
    #[error("bundle file {path}: {source}")]
    BundleFile {
        /// File involved.
        path: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// A bundle could not be encoded.
    #[error("export error: {source}")]
    Export {
        /// The underlying encode error.
        #[from]
        source: serde_json::Error,
    },

    /// A background task panicked or was cancelled.
    #[error("{task} task failed: {message}")]
    Task {
        /// Which task.
        task: &'static str,
        /// Join failure description.
        message: String,
    },
}
