//! Sink error types

use thiserror::Error;

/// Errors raised while opening, feeding or closing an output sink
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    /// No default output device on this host
    #[error("No default audio output device")]
    NoDefaultDevice,

    /// Named device not found
    #[error("Audio device not found: {0}")]
    DeviceNotFound(String),

    /// Failed to query device configurations
    #[error("Failed to get device config: {0}")]
    ConfigError(String),

    /// The device cannot run at the requested configuration
    #[error("Unsupported output configuration: {sample_rate} Hz, {block_size} samples")]
    UnsupportedConfig { sample_rate: u32, block_size: usize },

    /// Failed to build audio stream
    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    /// Failed to start/play stream
    #[error("Failed to start audio stream: {0}")]
    StreamPlayError(String),

    /// The device did not accept a block in time
    #[error("Timed out writing block to sink")]
    Timeout,

    /// The consuming end of the sink is gone
    #[error("Sink disconnected")]
    Disconnected,
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;
