//! Errors in the library.
use {
    std::path::PathBuf,
    thiserror::Error,
};

/// Errors in the library.
#[derive(Error, Debug)]
pub enum DdpgError {
    /// A configuration value was rejected at construction time.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An optimizer step was requested before the replay buffer held a batch.
    #[error("Replay buffer underflow: need {needed} transitions, have {available}")]
    Underflow {
        needed: usize,
        available: usize,
    },

    /// The environment returned something we refuse to learn from.
    #[error("Environment error: {0}")]
    Environment(String),

    /// Saving or loading a checkpoint failed.
    #[error("Persistence error at {path:?}: {reason}")]
    Persistence {
        path: PathBuf,
        reason: String,
    },

    /// Writing collected metrics failed.
    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error(transparent)]
    Tensor(#[from] candle_core::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DdpgError>;
