//! Audio output sinks
//!
//! The playback driver writes one interleaved stereo block per tick to a
//! [`BlockWriter`] obtained from a [`Sink`]:
//!
//! - [`CpalSink`] plays on a system output device through CPAL
//! - [`NullSink`] discards blocks at real-time pace
//! - [`ChannelSink`] forwards blocks over a channel (offline rendering, tests)

mod cpal_sink;
mod error;
mod sink;

pub use cpal_sink::{output_device_names, CpalSink};
pub use error::{SinkError, SinkResult};
pub use sink::{BlockWriter, ChannelSink, NullSink, Sink};
