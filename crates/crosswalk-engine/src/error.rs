//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup and the run so
//! that `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crosswalk_core::config::ConfigError,
    },

    /// The session could not be built.
    #[error("session error: {source}")]
    Session {
        /// The underlying session error.
        #[from]
        source: crosswalk_core::session::SessionError,
    },

    /// The frame loop refused to start.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: crosswalk_core::runner::RunnerError,
    },

    /// The player selection could not be understood.
    #[error("player error: {message}")]
    Player {
        /// Description of the problem.
        message: String,
    },
}
