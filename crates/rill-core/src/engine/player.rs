//! Playback driver - real-time clock, active set and sink lifecycle
//!
//! ```text
//! ┌──────────────────┐  play / lock / clear   ┌─────────────────────┐
//! │ App threads      │───────────────────────►│  Mutex<Mixer>       │
//! │ (PlayerHandle)   │                        │  (active voices)    │
//! └──────────────────┘                        └──────────┬──────────┘
//!                                                        │ lock per tick
//!                                             ┌──────────▼──────────┐   write(block)   ┌──────────────┐
//!                                             │  rill-clock thread  │─────────────────►│ BlockWriter  │
//!                                             │  mix, clip          │                  │ (sink side)  │
//!                                             └─────────────────────┘                  └──────────────┘
//! ```
//!
//! The mixer lock is the only synchronization between the application and
//! the clock: a tick holds it while pulling one block from every voice, so
//! anything done under the same lock lands between two ticks. The block is
//! written to the sink after the lock is released; the sink's blocking
//! write is what paces the clock.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::error::{PlaybackError, PlaybackResult};
use super::mixer::{Mixer, Voice};
use crate::audio::{BlockWriter, Sink};
use crate::config::PlaybackConfig;
use crate::source::{BoxSource, Source};
use crate::types::StereoBuffer;

const LIFECYCLE_UNINITIALIZED: u8 = 0;
const LIFECYCLE_RUNNING: u8 = 1;
const LIFECYCLE_CLOSED: u8 = 2;

/// Lock-free playback counters, updated by the clock thread
#[derive(Debug, Default)]
struct Counters {
    ticks: AtomicU64,
    glitches: AtomicU64,
    voices_finished: AtomicU64,
    voices_failed: AtomicU64,
}

/// Snapshot of the player's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    /// Blocks mixed since init
    pub ticks: u64,
    /// Blocks the sink failed to accept (timeouts, disconnects)
    pub glitches: u64,
    /// Voices that played to their end
    pub voices_finished: u64,
    /// Voices dropped because their source failed
    pub voices_failed: u64,
}

/// State shared by the player, its handles and the clock thread
struct Shared {
    mixer: Mutex<Mixer>,
    lifecycle: AtomicU8,
    running: AtomicBool,
    counters: Counters,
}

impl Shared {
    fn lock_mixer(&self) -> MutexGuard<'_, Mixer> {
        // A panic on an application thread while holding the lock must not
        // take the clock down with it
        self.mixer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_running(&self) -> PlaybackResult<()> {
        match self.lifecycle.load(Ordering::Acquire) {
            LIFECYCLE_RUNNING => Ok(()),
            LIFECYCLE_CLOSED => Err(PlaybackError::Closed),
            _ => Err(PlaybackError::NotInitialized),
        }
    }
}

/// Thread-safe handle for submitting and controlling playback
///
/// Obtained from [`Player::handle`]; clone it freely and move it to any
/// thread. Every operation fails once the player is closed.
#[derive(Clone)]
pub struct PlayerHandle {
    shared: Arc<Shared>,
}

impl PlayerHandle {
    /// Start playing `source` on the next tick
    pub fn play<S: Source + 'static>(&self, source: S) -> PlaybackResult<Voice> {
        Ok(self.lock()?.play(source))
    }

    /// Start playing every source on the same tick
    pub fn play_all<I>(&self, sources: I) -> PlaybackResult<Vec<Voice>>
    where
        I: IntoIterator<Item = BoxSource>,
    {
        let mut guard = self.lock()?;
        Ok(sources.into_iter().map(|s| guard.mixer.add(s)).collect())
    }

    /// Hold the mixer lock; no tick runs until the guard is dropped
    ///
    /// Keep the guard for as short as possible. Every tick missed while it
    /// is held is an audible dropout.
    pub fn lock(&self) -> PlaybackResult<PlaybackGuard<'_>> {
        self.shared.check_running()?;
        Ok(PlaybackGuard {
            mixer: self.shared.lock_mixer(),
        })
    }

    /// Stop every voice immediately
    pub fn clear(&self) -> PlaybackResult<()> {
        self.lock()?.clear();
        Ok(())
    }

    /// Number of voices in the active set
    pub fn active_voices(&self) -> PlaybackResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn stats(&self) -> PlaybackStats {
        let c = &self.shared.counters;
        PlaybackStats {
            ticks: c.ticks.load(Ordering::Relaxed),
            glitches: c.glitches.load(Ordering::Relaxed),
            voices_finished: c.voices_finished.load(Ordering::Relaxed),
            voices_failed: c.voices_failed.load(Ordering::Relaxed),
        }
    }
}

/// Scoped access to the active set; dropping it lets the clock run again
pub struct PlaybackGuard<'a> {
    mixer: MutexGuard<'a, Mixer>,
}

impl PlaybackGuard<'_> {
    pub fn play<S: Source + 'static>(&mut self, source: S) -> Voice {
        self.mixer.add(Box::new(source))
    }

    /// Empty the active set, returning how many voices were stopped
    pub fn clear(&mut self) -> usize {
        self.mixer.clear()
    }

    pub fn len(&self) -> usize {
        self.mixer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mixer.len() == 0
    }
}

enum PlayerState {
    Uninitialized,
    Running {
        clock: JoinHandle<()>,
        sink: Box<dyn Sink>,
    },
    Closed,
}

/// Owner of the playback clock and the output sink
///
/// ```ignore
/// let mut player = Player::new();
/// player.init(&PlaybackConfig::default(), Box::new(CpalSink::new()))?;
/// let voice = player.handle().play(samples)?;
/// // ...
/// player.close()?;
/// ```
pub struct Player {
    shared: Arc<Shared>,
    state: PlayerState,
}

impl Player {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                mixer: Mutex::new(Mixer::new()),
                lifecycle: AtomicU8::new(LIFECYCLE_UNINITIALIZED),
                running: AtomicBool::new(false),
                counters: Counters::default(),
            }),
            state: PlayerState::Uninitialized,
        }
    }

    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, PlayerState::Running { .. })
    }

    /// Open `sink` at `sample_rate` / `block_size` and start the clock
    ///
    /// Output clipping stays at its default (on).
    pub fn init_with(
        &mut self,
        sample_rate: u32,
        block_size: usize,
        sink: Box<dyn Sink>,
    ) -> PlaybackResult<()> {
        let config = PlaybackConfig {
            sample_rate,
            block_size,
            ..Default::default()
        };
        self.init(&config, sink)
    }

    /// Open `sink` with the rate and block size of `config` and start the
    /// clock thread
    ///
    /// Fails if the player was already initialized or closed, if `config`
    /// is invalid, or if the sink rejects the configuration.
    pub fn init(&mut self, config: &PlaybackConfig, mut sink: Box<dyn Sink>) -> PlaybackResult<()> {
        match self.state {
            PlayerState::Uninitialized => {}
            PlayerState::Running { .. } => return Err(PlaybackError::AlreadyInitialized),
            PlayerState::Closed => return Err(PlaybackError::Closed),
        }
        config.validate()?;

        let writer = sink.open(config.sample_rate, config.block_size)?;
        self.shared.lock_mixer().prepare(config.block_size);

        self.shared.running.store(true, Ordering::Release);
        self.shared.lifecycle.store(LIFECYCLE_RUNNING, Ordering::Release);

        let clock = ClockThread {
            shared: Arc::clone(&self.shared),
            writer,
            block: StereoBuffer::silence(config.block_size),
            clip_output: config.clip_output,
            period: config.block_duration(),
        };
        let spawned = thread::Builder::new()
            .name("rill-clock".to_string())
            .spawn(move || clock.run());

        match spawned {
            Ok(clock) => {
                log::info!(
                    "Player started: {} Hz, {} samples per block (~{:.1}ms), clipping {}",
                    config.sample_rate,
                    config.block_size,
                    config.block_duration().as_secs_f64() * 1000.0,
                    if config.clip_output { "on" } else { "off" }
                );
                self.state = PlayerState::Running { clock, sink };
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                self.shared
                    .lifecycle
                    .store(LIFECYCLE_UNINITIALIZED, Ordering::Release);
                if let Err(close_err) = sink.close() {
                    log::warn!("Failed to close sink after spawn failure: {}", close_err);
                }
                Err(PlaybackError::ClockSpawn(e.to_string()))
            }
        }
    }

    /// Start playing `source` on the next tick
    pub fn play<S: Source + 'static>(&self, source: S) -> PlaybackResult<Voice> {
        self.handle().play(source)
    }

    /// Start playing every source on the same tick
    pub fn play_all<I>(&self, sources: I) -> PlaybackResult<Vec<Voice>>
    where
        I: IntoIterator<Item = BoxSource>,
    {
        let mut guard = self.lock()?;
        Ok(sources.into_iter().map(|s| guard.mixer.add(s)).collect())
    }

    /// Hold the mixer lock; see [`PlayerHandle::lock`]
    pub fn lock(&self) -> PlaybackResult<PlaybackGuard<'_>> {
        self.shared.check_running()?;
        Ok(PlaybackGuard {
            mixer: self.shared.lock_mixer(),
        })
    }

    pub fn clear(&self) -> PlaybackResult<()> {
        self.lock()?.clear();
        Ok(())
    }

    pub fn stats(&self) -> PlaybackStats {
        self.handle().stats()
    }

    /// Stop the clock, release the sink and stop every remaining voice
    ///
    /// Closing an uninitialized player just marks it closed. Closing twice
    /// fails with [`PlaybackError::Closed`].
    pub fn close(&mut self) -> PlaybackResult<()> {
        let state = std::mem::replace(&mut self.state, PlayerState::Closed);
        self.shared.lifecycle.store(LIFECYCLE_CLOSED, Ordering::Release);

        let result = match state {
            PlayerState::Closed => return Err(PlaybackError::Closed),
            PlayerState::Uninitialized => Ok(()),
            PlayerState::Running { clock, mut sink } => {
                self.shared.running.store(false, Ordering::Release);
                if clock.join().is_err() {
                    log::error!("Clock thread panicked");
                }
                sink.close().map_err(PlaybackError::from)
            }
        };

        let stopped = self.shared.lock_mixer().clear();
        let stats = self.stats();
        log::info!(
            "Player closed: {} ticks, {} glitches, {} voices stopped",
            stats.ticks,
            stats.glitches,
            stopped
        );
        result
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.close() {
                log::warn!("Error closing player on drop: {}", e);
            }
        }
    }
}

/// Everything the clock thread owns
struct ClockThread {
    shared: Arc<Shared>,
    writer: Box<dyn BlockWriter>,
    block: StereoBuffer,
    clip_output: bool,
    period: Duration,
}

impl ClockThread {
    fn run(mut self) {
        log::debug!("Clock thread running");
        while self.shared.running.load(Ordering::Acquire) {
            self.tick();
        }
        log::debug!("Clock thread stopped");
    }

    fn tick(&mut self) {
        let summary = self.shared.lock_mixer().tick(self.block.as_mut_slice());

        if self.clip_output {
            self.block.clamp(1.0);
        }

        let counters = &self.shared.counters;
        counters.ticks.fetch_add(1, Ordering::Relaxed);
        if summary.finished > 0 {
            counters
                .voices_finished
                .fetch_add(summary.finished as u64, Ordering::Relaxed);
        }
        if summary.failed > 0 {
            counters
                .voices_failed
                .fetch_add(summary.failed as u64, Ordering::Relaxed);
        }

        if let Err(e) = self.writer.write(self.block.as_interleaved()) {
            let glitches = counters.glitches.fetch_add(1, Ordering::Relaxed) + 1;
            // Log the 1st, 2nd, 4th, 8th... failure
            if glitches.is_power_of_two() {
                log::warn!("Sink write failed ({} glitches so far): {}", glitches, e);
            }
            // Keep the block cadence when the sink fails without blocking
            thread::sleep(self.period);
        }
    }
}
