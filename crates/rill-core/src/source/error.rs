//! Source error types

use std::sync::Arc;

use thiserror::Error;

/// Sticky terminal error reported by a source through [`Source::err`]
///
/// Messages are reference counted so that composites and the playback driver
/// can hand the same error out repeatedly without allocating.
///
/// [`Source::err`]: super::Source::err
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The encoded data could not be decoded (corruption, truncation)
    #[error("Decode error: {0}")]
    Decode(Arc<str>),

    /// The underlying reader or device failed
    #[error("I/O error: {0}")]
    Io(Arc<str>),

    /// Application-defined leaf failure
    #[error("Source failed: {0}")]
    Failed(Arc<str>),
}

impl StreamError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(Arc::from(msg.into()))
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(Arc::from(msg.into()))
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(Arc::from(msg.into()))
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}
