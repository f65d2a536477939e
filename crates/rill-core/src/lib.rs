//! Rill Core - composable pull-based audio streaming
//!
//! Sources fill caller-provided buffers on demand; combinators wrap sources
//! into new sources; the [`engine::Player`] pulls one block per tick from
//! every submitted source and writes the mix to an [`audio::Sink`].

pub mod audio;
pub mod codec;
pub mod combinator;
pub mod config;
pub mod ctrl;
pub mod effect;
pub mod engine;
pub mod resample;
pub mod source;
pub mod types;

pub use combinator::{Mix, Seq, Take};
pub use ctrl::{Ctrl, CtrlHandle};
pub use effect::{Clip, Gain, Mono, Pan, Swap};
pub use engine::{PlaybackError, Player, PlayerHandle, Voice};
pub use resample::Resampler;
pub use source::{BoxSource, Source, StreamError};
pub use types::*;
