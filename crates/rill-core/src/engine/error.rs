//! Playback driver errors

use thiserror::Error;

use crate::audio::SinkError;
use crate::config::ConfigError;

/// Errors returned by [`Player`](super::Player) operations
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Player is already initialized")]
    AlreadyInitialized,

    #[error("Player is not initialized")]
    NotInitialized,

    #[error("Player is closed")]
    Closed,

    #[error("Invalid playback configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Audio sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Failed to spawn clock thread: {0}")]
    ClockSpawn(String),
}

/// Result type for playback operations
pub type PlaybackResult<T> = Result<T, PlaybackError>;
