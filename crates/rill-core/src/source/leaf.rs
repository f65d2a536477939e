//! Leaf sources - silence, constants, in-memory samples and callbacks

use crate::types::{fill_silence, StereoBuffer, StereoSample};

use super::Source;

/// Sample budget of a generator leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Budget {
    Finite(usize),
    Unbounded,
}

impl Budget {
    /// Grant up to `want` samples, returning (granted, more_after)
    #[inline]
    fn take(&mut self, want: usize) -> (usize, bool) {
        match self {
            Budget::Unbounded => (want, true),
            Budget::Finite(remaining) => {
                let n = want.min(*remaining);
                *remaining -= n;
                (n, *remaining > 0)
            }
        }
    }
}

/// Produces silence, either for a fixed number of samples or forever
///
/// Used for padding and delays inside `Seq`.
#[derive(Debug, Clone)]
pub struct Silence {
    budget: Budget,
}

impl Source for Silence {
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        let (n, more) = self.budget.take(buf.len());
        fill_silence(&mut buf[..n]);
        (n, more)
    }
}

/// Exactly `n` samples of silence
pub fn silence(n: usize) -> Silence {
    Silence {
        budget: Budget::Finite(n),
    }
}

/// Silence that never ends
pub fn silence_forever() -> Silence {
    Silence {
        budget: Budget::Unbounded,
    }
}

/// Produces the same sample over and over
#[derive(Debug, Clone)]
pub struct Constant {
    value: StereoSample,
    budget: Budget,
}

impl Source for Constant {
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        let (n, more) = self.budget.take(buf.len());
        buf[..n].fill(self.value);
        (n, more)
    }
}

/// Exactly `n` copies of `value`
pub fn constant(value: StereoSample, n: usize) -> Constant {
    Constant {
        value,
        budget: Budget::Finite(n),
    }
}

/// `value` forever
pub fn constant_forever(value: StereoSample) -> Constant {
    Constant {
        value,
        budget: Budget::Unbounded,
    }
}

/// Finite source over an owned vector of samples
#[derive(Debug, Clone)]
pub struct Samples {
    samples: Vec<StereoSample>,
    pos: usize,
}

impl Samples {
    /// Samples not yet streamed
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.pos
    }
}

impl Source for Samples {
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.samples[self.pos..self.pos + n]);
        self.pos += n;
        (n, self.pos < self.samples.len())
    }
}

/// Stream the given samples once
pub fn samples(samples: Vec<StereoSample>) -> Samples {
    Samples { samples, pos: 0 }
}

impl StereoBuffer {
    /// Turn a recorded buffer into a source that plays it once
    pub fn into_source(self) -> Samples {
        samples(self.into_vec())
    }
}

/// Zero-sample leaf that runs a side effect when it is first pulled
///
/// Typically the last child of a `Seq`, to signal that everything before it
/// has been played.
///
/// Under a `Player` the function runs on the clock thread while the mixer
/// lock is held. It must not call back into the player (`play`, `lock`,
/// `clear`, ...) or it deadlocks on that lock; hand the event to another
/// thread instead, e.g. over a channel, and keep the function short since
/// the tick waits for it.
pub struct Callback<F> {
    f: Option<F>,
}

impl<F: FnOnce() + Send> Source for Callback<F> {
    fn stream(&mut self, _buf: &mut [StereoSample]) -> (usize, bool) {
        if let Some(f) = self.f.take() {
            f();
        }
        (0, false)
    }
}

/// Run `f` exactly once, on the first pull
///
/// See [`Callback`] for the restrictions when playing through a `Player`.
pub fn callback<F: FnOnce() + Send>(f: F) -> Callback<F> {
    Callback { f: Some(f) }
}
