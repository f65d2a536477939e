//! Control wrapper - live pause/mute/volume over any source
//!
//! [`Ctrl`] owns the wrapped source and is handed to a combinator or the
//! player like any other source. The matching [`CtrlHandle`] stays with the
//! application and can be cloned and sent to any thread.
//!
//! Flags are lock-free atomics read once at the start of every pull, so a
//! toggle can never take effect halfway through a block. Callers that need
//! several flags to change on the same tick set them while holding the
//! player's [`PlaybackGuard`](crate::engine::PlaybackGuard).

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::source::{Source, StreamError};
use crate::types::{fill_silence, Amplitude, StereoSample};

#[derive(Debug)]
struct CtrlState {
    paused: AtomicBool,
    muted: AtomicBool,
    /// f32 bits
    volume: AtomicU32,
}

/// Thread-safe remote control for a [`Ctrl`]
#[derive(Debug, Clone)]
pub struct CtrlHandle {
    state: Arc<CtrlState>,
}

impl CtrlHandle {
    pub fn is_paused(&self) -> bool {
        self.state.paused.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, paused: bool) {
        self.state.paused.store(paused, Ordering::Release);
    }

    pub fn is_muted(&self) -> bool {
        self.state.muted.load(Ordering::Acquire)
    }

    pub fn set_muted(&self, muted: bool) {
        self.state.muted.store(muted, Ordering::Release);
    }

    /// Linear volume factor (1.0 = unity)
    pub fn volume(&self) -> Amplitude {
        f32::from_bits(self.state.volume.load(Ordering::Acquire))
    }

    /// Set the linear volume; negative and non-finite values become 0
    pub fn set_volume(&self, volume: Amplitude) {
        let volume = if volume.is_finite() { volume.max(0.0) } else { 0.0 };
        self.state.volume.store(volume.to_bits(), Ordering::Release);
    }
}

/// Wraps a source with externally mutable paused/muted/volume state
///
/// - paused: the pull is answered with a full block of silence and
///   `more == true` without touching the child, which stays frozen at its
///   current position.
/// - muted: the child keeps advancing but its output is zeroed.
/// - volume: the child's output is scaled by the factor.
pub struct Ctrl<S> {
    child: S,
    state: Arc<CtrlState>,
    /// Latched once the child ends so pausing cannot revive it
    done: bool,
}

impl<S: Source> Ctrl<S> {
    pub fn new(child: S) -> Self {
        Self {
            child,
            state: Arc::new(CtrlState {
                paused: AtomicBool::new(false),
                muted: AtomicBool::new(false),
                volume: AtomicU32::new(1.0f32.to_bits()),
            }),
            done: false,
        }
    }

    /// Wrap `child` and return the wrapper together with its handle
    pub fn with_handle(child: S) -> (Self, CtrlHandle) {
        let ctrl = Self::new(child);
        let handle = ctrl.handle();
        (ctrl, handle)
    }

    pub fn handle(&self) -> CtrlHandle {
        CtrlHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: Source> Source for Ctrl<S> {
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        let paused = self.state.paused.load(Ordering::Acquire);
        let muted = self.state.muted.load(Ordering::Acquire);
        let volume = f32::from_bits(self.state.volume.load(Ordering::Acquire));

        if self.done {
            return (0, false);
        }
        if paused {
            fill_silence(buf);
            return (buf.len(), true);
        }

        let (n, more) = self.child.stream(buf);
        self.done = !more;
        if muted {
            fill_silence(&mut buf[..n]);
        } else if volume != 1.0 {
            for s in &mut buf[..n] {
                *s *= volume;
            }
        }
        (n, more)
    }

    fn err(&self) -> Option<&StreamError> {
        self.child.err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{lefts, mk, naturals, Failing};
    use crate::source::collect;
    use std::thread;

    #[test]
    fn test_pause_freezes_child() {
        let (mut ctrl, handle) = Ctrl::with_handle(naturals());
        let mut buf = [StereoSample::silence(); 3];

        assert_eq!(ctrl.stream(&mut buf), (3, true));
        assert_eq!(lefts(&buf), vec![1.0, 2.0, 3.0]);

        handle.set_paused(true);
        for _ in 0..5 {
            buf = [StereoSample::mono(9.0); 3];
            assert_eq!(ctrl.stream(&mut buf), (3, true));
            assert!(buf.iter().all(|s| *s == StereoSample::silence()));
        }

        handle.set_paused(false);
        assert_eq!(ctrl.stream(&mut buf), (3, true));
        assert_eq!(lefts(&buf), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_mute_advances_child() {
        let (mut ctrl, handle) = Ctrl::with_handle(naturals());
        let mut buf = [StereoSample::silence(); 2];

        handle.set_muted(true);
        assert_eq!(ctrl.stream(&mut buf), (2, true));
        assert_eq!(lefts(&buf), vec![0.0, 0.0]);

        handle.set_muted(false);
        ctrl.stream(&mut buf);
        assert_eq!(lefts(&buf), vec![3.0, 4.0]);
    }

    #[test]
    fn test_volume_scales_output() {
        let (mut ctrl, handle) = Ctrl::with_handle(mk(&[1.0, -0.5]));
        handle.set_volume(0.5);
        assert_eq!(handle.volume(), 0.5);
        let out = collect(&mut ctrl).unwrap();
        assert_eq!(lefts(&out), vec![0.5, -0.25]);

        handle.set_volume(-3.0);
        assert_eq!(handle.volume(), 0.0);
        handle.set_volume(f32::NAN);
        assert_eq!(handle.volume(), 0.0);
    }

    #[test]
    fn test_handle_works_across_threads() {
        let (mut ctrl, handle) = Ctrl::with_handle(naturals());
        let remote = handle.clone();
        thread::spawn(move || remote.set_paused(true))
            .join()
            .unwrap();

        assert!(handle.is_paused());
        let mut buf = [StereoSample::mono(1.0); 4];
        assert_eq!(ctrl.stream(&mut buf), (4, true));
        assert_eq!(buf[0], StereoSample::silence());
    }

    #[test]
    fn test_pausing_does_not_revive_exhausted_child() {
        let (mut ctrl, handle) = Ctrl::with_handle(mk(&[1.0]));
        let mut buf = [StereoSample::silence(); 4];
        assert_eq!(ctrl.stream(&mut buf), (1, false));

        handle.set_paused(true);
        assert_eq!(ctrl.stream(&mut buf), (0, false));
    }

    #[test]
    fn test_paused_failed_child_stays_failed() {
        let (mut ctrl, handle) = Ctrl::with_handle(Failing::new(1.0, 0));
        let mut buf = [StereoSample::silence(); 4];
        assert_eq!(ctrl.stream(&mut buf), (0, false));
        assert!(ctrl.err().is_some());

        handle.set_paused(true);
        assert_eq!(ctrl.stream(&mut buf), (0, false));
    }
}
