//! Hard clipping

use crate::source::{Source, StreamError};
use crate::types::{Amplitude, StereoSample};

/// Clamps both channels to `[-ceiling, ceiling]`
///
/// A plain hard clip with no lookahead, meant as a last-resort safety stage
/// after a `Mix` whose sum may overshoot.
pub struct Clip<S> {
    child: S,
    ceiling: Amplitude,
}

impl<S: Source> Clip<S> {
    /// Clip at full scale (1.0)
    pub fn new(child: S) -> Self {
        Self::with_ceiling(1.0, child)
    }

    pub fn with_ceiling(ceiling: Amplitude, child: S) -> Self {
        Self {
            child,
            ceiling: ceiling.abs(),
        }
    }
}

impl<S: Source> Source for Clip<S> {
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        let (n, more) = self.child.stream(buf);
        let c = self.ceiling;
        for s in &mut buf[..n] {
            s.left = s.left.clamp(-c, c);
            s.right = s.right.clamp(-c, c);
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
    use crate::source::testing::{lefts, mk};
    use crate::source::collect;

    #[test]
    fn test_clip_bounds_overshoot() {
        let out = collect(&mut Clip::new(mk(&[1.6, -2.0, 0.4]))).unwrap();
        assert_eq!(lefts(&out), vec![1.0, -1.0, 0.4]);
    }

    #[test]
    fn test_custom_ceiling() {
        let out = collect(&mut Clip::with_ceiling(-0.5, mk(&[0.9, -0.9, 0.1]))).unwrap();
        assert_eq!(lefts(&out), vec![0.5, -0.5, 0.1]);
    }
}
