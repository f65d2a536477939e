//! Configuration errors

use thiserror::Error;

/// Invalid setup arguments, rejected synchronously at construction time
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("Invalid block size: {0} (must be 1..={max})", max = crate::types::MAX_BLOCK_SIZE)]
    InvalidBlockSize(usize),

    #[error("Invalid resample quality: {0} (max {max})", max = crate::resample::MAX_QUALITY)]
    InvalidQuality(usize),

    #[error("Invalid resample ratio: {0}")]
    InvalidRatio(f64),
}

/// Result type for configuration validation
pub type ConfigResult<T> = Result<T, ConfigError>;
