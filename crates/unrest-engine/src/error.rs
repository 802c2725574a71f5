//! Error types for the turn engine binary.

/// Top-level error for the turn engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: unrest_core::ConfigError,
    },

    /// A turn, a strike action or the final save failed.
    #[error("turn error: {source}")]
    Turn {
        /// The underlying turn error.
        #[from]
        source: unrest_core::TurnError,
    },
}
