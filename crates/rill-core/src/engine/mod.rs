//! Playback engine - the real-time driver
//!
//! - [`Player`]: owns the clock thread and the sink, Uninitialized →
//!   Running → Closed
//! - [`PlayerHandle`]: thread-safe play/lock/clear from anywhere
//! - [`Voice`]: per-source status (active, finished, failed, stopped)
//! - `gc`: deferred deallocation for sources removed on the clock thread

pub mod gc;

mod error;
mod mixer;
mod player;

pub use error::{PlaybackError, PlaybackResult};
pub use mixer::{Voice, VoiceState};
pub use player::{PlaybackGuard, PlaybackStats, Player, PlayerHandle};
