//! Codec error types

use thiserror::Error;

use crate::source::StreamError;

/// Errors raised when opening a decoder or running an encoder
#[derive(Error, Debug)]
pub enum CodecError {
    /// Malformed file or I/O failure in the WAV layer
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Valid file in a sample layout this codec does not handle
    #[error("Unsupported format: {0}")]
    Unsupported(String),

    /// The source being encoded failed
    #[error("Source failed while encoding: {0}")]
    Source(#[from] StreamError),
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
