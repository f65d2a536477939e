//! Master mixer - the active set of root sources
//!
//! Holds every voice submitted to the player and sums one block from all of
//! them per tick. A voice leaves the set when its source is exhausted, when
//! it fails, or when the application stops it; the removal is recorded in
//! the voice's shared status so the application can inspect it later.
//!
//! Only `tick` runs on the clock thread. It never allocates: the scratch
//! buffer is sized before the clock starts, removal is a `swap_remove`, and
//! removed sources are freed by the GC thread.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::OnceLock;

use basedrop::{Handle, Owned, Shared};

use super::gc::gc_handle;
use crate::source::{BoxSource, StreamError};
use crate::types::{fill_silence, mix_into, StereoSample, DEFAULT_BLOCK_SIZE};

/// Initial voice capacity, so typical sessions never grow the set
const INITIAL_VOICES: usize = 64;

/// Lifecycle of a voice in the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    /// In the active set, pulled every tick
    Active,
    /// Source ended without error
    Finished,
    /// Source reported an error; see [`Voice::error`]
    Failed,
    /// Removed by [`Voice::stop`], a clear, or the player closing
    Stopped,
}

impl VoiceState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => VoiceState::Active,
            1 => VoiceState::Finished,
            2 => VoiceState::Failed,
            _ => VoiceState::Stopped,
        }
    }
}

struct VoiceStatus {
    id: u64,
    state: AtomicU8,
    stop_requested: AtomicBool,
    error: OnceLock<StreamError>,
}

impl VoiceStatus {
    fn set_state(&self, state: VoiceState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Handle to a source submitted with `play`
///
/// Cloning is cheap; all clones observe the same voice.
#[derive(Clone)]
pub struct Voice {
    status: Shared<VoiceStatus>,
}

impl Voice {
    /// Player-unique id, in submission order
    pub fn id(&self) -> u64 {
        self.status.id
    }

    pub fn state(&self) -> VoiceState {
        VoiceState::from_u8(self.status.state.load(Ordering::Acquire))
    }

    pub fn is_active(&self) -> bool {
        self.state() == VoiceState::Active
    }

    /// True once the source played to its end without error
    pub fn is_finished(&self) -> bool {
        self.state() == VoiceState::Finished
    }

    /// The error that made the player drop this voice
    pub fn error(&self) -> Option<&StreamError> {
        self.status.error.get()
    }

    /// Remove the voice from the active set at the next tick
    pub fn stop(&self) {
        self.status.stop_requested.store(true, Ordering::Release);
    }
}

// basedrop::Shared doesn't implement Debug
impl fmt::Debug for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Voice")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("error", &self.error())
            .finish()
    }
}

struct Slot {
    source: Owned<BoxSource>,
    status: Shared<VoiceStatus>,
}

/// Voices removed during one tick, by reason
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TickSummary {
    pub finished: usize,
    pub failed: usize,
    pub stopped: usize,
}

pub(crate) struct Mixer {
    voices: Vec<Slot>,
    scratch: Vec<StereoSample>,
    next_id: u64,
    gc: Handle,
}

impl Mixer {
    pub fn new() -> Self {
        Self::with_collector(gc_handle())
    }

    /// Mixer whose removed voices are freed by the collector behind `gc`
    pub fn with_collector(gc: Handle) -> Self {
        Self {
            voices: Vec::with_capacity(INITIAL_VOICES),
            scratch: vec![StereoSample::silence(); DEFAULT_BLOCK_SIZE],
            next_id: 0,
            gc,
        }
    }

    /// Size the scratch buffer for `block_size`-sample ticks
    pub fn prepare(&mut self, block_size: usize) {
        self.scratch.resize(block_size.max(1), StereoSample::silence());
    }

    /// Add a source to the active set
    pub fn add(&mut self, source: BoxSource) -> Voice {
        let status = Shared::new(
            &self.gc,
            VoiceStatus {
                id: self.next_id,
                state: AtomicU8::new(VoiceState::Active as u8),
                stop_requested: AtomicBool::new(false),
                error: OnceLock::new(),
            },
        );
        self.next_id += 1;

        self.voices.push(Slot {
            source: Owned::new(&self.gc, source),
            status: status.clone(),
        });
        Voice { status }
    }

    /// Empty the active set, marking every voice stopped
    pub fn clear(&mut self) -> usize {
        let count = self.voices.len();
        for slot in self.voices.drain(..) {
            slot.status.set_state(VoiceState::Stopped);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// Mix one block from every active voice into `out`
    ///
    /// `out` is overwritten. Voices that come up short leave silence in the
    /// rest of the block; ended, failed and stopped voices are removed.
    pub fn tick(&mut self, out: &mut [StereoSample]) -> TickSummary {
        fill_silence(out);
        let mut summary = TickSummary::default();

        let mut i = 0;
        while i < self.voices.len() {
            let slot = &mut self.voices[i];

            if slot.status.stop_requested.load(Ordering::Acquire) {
                slot.status.set_state(VoiceState::Stopped);
                summary.stopped += 1;
                self.voices.swap_remove(i);
                continue;
            }

            let mut filled = 0;
            let mut ended = false;
            while filled < out.len() {
                let want = (out.len() - filled).min(self.scratch.len());
                let (n, more) = slot.source.stream(&mut self.scratch[..want]);
                mix_into(&mut out[filled..filled + n], &self.scratch[..n]);
                filled += n;
                if !more {
                    ended = true;
                    break;
                }
                if n == 0 {
                    // Starved this tick; silence for the rest of the block
                    break;
                }
            }

            if !ended {
                i += 1;
                continue;
            }

            match slot.source.err() {
                Some(err) => {
                    let _ = slot.status.error.set(err.clone());
                    slot.status.set_state(VoiceState::Failed);
                    log::warn!("Voice {} dropped after error: {}", slot.status.id, err);
                    summary.failed += 1;
                }
                None => {
                    slot.status.set_state(VoiceState::Finished);
                    summary.finished += 1;
                }
            }
            self.voices.swap_remove(i);
        }

        summary
    }
}
