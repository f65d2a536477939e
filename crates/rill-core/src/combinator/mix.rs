//! Mixing - sum several sources position-wise

use crate::source::{Source, StreamError};
use crate::types::{fill_silence, mix_into, StereoSample, STREAM_CHUNK};

/// Sums its children sample by sample
///
/// Each child is pulled into a private scratch buffer and added into the
/// output. Exhausted children are dropped from the active set and never
/// pulled again. The sum is not renormalized: gain staging is the caller's
/// job (see `effect::Gain` and the driver's output clip stage).
///
/// A failing child is dropped like an exhausted one and its siblings keep
/// playing. The first such error becomes this mix's terminal error once the
/// last child is gone, so the error stays sticky and is never reported while
/// the mix still produces samples.
pub struct Mix<S> {
    children: Vec<S>,
    scratch: Box<[StereoSample]>,
    error: Option<StreamError>,
}

impl<S: Source> Mix<S> {
    pub fn new(children: Vec<S>) -> Self {
        Self {
            children,
            scratch: vec![StereoSample::silence(); STREAM_CHUNK].into_boxed_slice(),
            error: None,
        }
    }

    /// Number of children still being mixed
    pub fn active(&self) -> usize {
        self.children.len()
    }

    /// Mix one chunk (at most `STREAM_CHUNK` samples) into `out`.
    ///
    /// Returns the number of positions at least one child produced.
    fn mix_chunk(&mut self, out: &mut [StereoSample]) -> usize {
        fill_silence(out);
        let mut produced = 0;
        let mut i = 0;
        while i < self.children.len() {
            let scratch = &mut self.scratch[..out.len()];
            let (n, more) = self.children[i].stream(scratch);
            mix_into(&mut out[..n], &scratch[..n]);
            produced = produced.max(n);

            if more {
                i += 1;
                continue;
            }
            let child = self.children.swap_remove(i);
            if self.error.is_none() {
                self.error = child.err().cloned();
            }
        }
        produced
    }
}

impl<S: Source> Source for Mix<S> {
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        let mut filled = 0;
        while filled < buf.len() && !self.children.is_empty() {
            let len = (buf.len() - filled).min(self.scratch.len());
            let n = self.mix_chunk(&mut buf[filled..filled + len]);
            filled += n;
            if n < len {
                // Every child came up short this round
                break;
            }
        }
        (filled, !self.children.is_empty())
    }

    fn err(&self) -> Option<&StreamError> {
        if self.children.is_empty() {
            self.error.as_ref()
        } else {
            None
        }
    }
}
