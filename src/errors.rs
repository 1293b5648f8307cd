// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    /// Unresolvable executable, empty server configuration, bad config values.
    /// Fatal before any watch loop starts.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The notification backend could not be initialised; callers fall back
    /// to polling.
    #[error("Watch backend initialisation failed: {0}")]
    WatchBackendInit(String),

    #[error("Server process {0} died unexpectedly")]
    ChildDied(u32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed config file; wrapped with the file path by the loader.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SupervisorError>;
