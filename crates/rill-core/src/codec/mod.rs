//! Codecs - adapters between encoded audio and sources
//!
//! A decoder turns a byte stream into a `(Source, Format)` pair; an encoder
//! drains a source into a byte stream. Both honor the source contract, so a
//! decoder can be composed like any other source.

mod error;
pub mod wav;

pub use error::{CodecError, CodecResult};
