//! Windowing - stream at most N samples of a source

use crate::source::{Source, StreamError};
use crate::types::StereoSample;

/// Streams at most `remaining` samples of its child, then ends
///
/// The child is never pulled past the cutoff, so `Take::new(n, &mut s)`
/// leaves `s` positioned exactly after its first `n` samples.
pub struct Take<S> {
    child: S,
    remaining: usize,
}

impl<S: Source> Take<S> {
    pub fn new(n: usize, child: S) -> Self {
        Self {
            child,
            remaining: n,
        }
    }

    /// Samples left in the window
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Release the child, e.g. to keep streaming past the window
    pub fn into_inner(self) -> S {
        self.child
    }
}

impl<S: Source> Source for Take<S> {
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        if self.remaining == 0 {
            return (0, false);
        }
        let want = buf.len().min(self.remaining);
        let (n, more) = self.child.stream(&mut buf[..want]);
        self.remaining -= n;
        if !more {
            // Child ended early; latch so the child is not pulled again
            self.remaining = 0;
        }
        (n, self.remaining > 0)
    }

    fn err(&self) -> Option<&StreamError> {
        self.child.err()
    }
}
