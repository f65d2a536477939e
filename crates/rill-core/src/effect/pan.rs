//! Channel placement - pan, mono fold-down and channel swap

use crate::source::{Source, StreamError};
use crate::types::{Amplitude, StereoSample};

/// Places a stereo source between the left and right speakers
///
/// Moving right shifts a share `p` of the left channel into the right one,
/// and moving left does the mirror image. At the center both channels pass
/// unchanged; at `+1` or `-1` the whole source lands on one side.
/// `left + right` is the same before and after. Positions outside [-1, 1]
/// are clamped.
pub struct Pan<S> {
    child: S,
    position: Amplitude,
}

impl<S: Source> Pan<S> {
    pub fn new(position: Amplitude, child: S) -> Self {
        Self {
            child,
            position: position.clamp(-1.0, 1.0),
        }
    }

    pub fn position(&self) -> Amplitude {
        self.position
    }

    pub fn set_position(&mut self, position: Amplitude) {
        self.position = position.clamp(-1.0, 1.0);
    }

    #[inline]
    fn place(&self, s: &mut StereoSample) {
        let p = self.position;
        if p > 0.0 {
            let moved = s.left * p;
            s.left -= moved;
            s.right += moved;
        } else {
            let moved = s.right * -p;
            s.right -= moved;
            s.left += moved;
        }
    }
}

impl<S: Source> Source for Pan<S> {
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        let (n, more) = self.child.stream(buf);
        if self.position != 0.0 {
            for s in &mut buf[..n] {
                self.place(s);
            }
        }
        (n, more)
    }

    fn err(&self) -> Option<&StreamError> {
        self.child.err()
    }
}

/// Folds both channels down to their average
pub struct Mono<S> {
    child: S,
}

impl<S: Source> Mono<S> {
    pub fn new(child: S) -> Self {
        Self { child }
    }
}

impl<S: Source> Source for Mono<S> {
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        let (n, more) = self.child.stream(buf);
        for s in &mut buf[..n] {
            *s = StereoSample::mono((s.left + s.right) * 0.5);
        }
        (n, more)
    }

    fn err(&self) -> Option<&StreamError> {
        self.child.err()
    }
}

/// Exchanges the left and right channels
pub struct Swap<S> {
    child: S,
}

impl<S: Source> Swap<S> {
    pub fn new(child: S) -> Self {
        Self { child }
    }
}

impl<S: Source> Source for Swap<S> {
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        let (n, more) = self.child.stream(buf);
        for s in &mut buf[..n] {
            std::mem::swap(&mut s.left, &mut s.right);
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
    use crate::source::{collect, constant, samples};

    fn pair(l: f32, r: f32, n: usize) -> crate::source::Samples {
        samples(vec![StereoSample::new(l, r); n])
    }

    #[test]
    fn test_center_is_transparent() {
        let out = collect(&mut Pan::new(0.0, pair(0.3, -0.7, 3))).unwrap();
        assert!(out.iter().all(|s| *s == StereoSample::new(0.3, -0.7)));
    }

    #[test]
    fn test_extremes_collapse_to_one_side() {
        let out = collect(&mut Pan::new(1.0, pair(0.5, 0.5, 2))).unwrap();
        assert!(out.iter().all(|s| *s == StereoSample::new(0.0, 1.0)));

        let out = collect(&mut Pan::new(-1.0, pair(0.5, 0.5, 2))).unwrap();
        assert!(out.iter().all(|s| *s == StereoSample::new(1.0, 0.0)));
    }

    #[test]
    fn test_one_sided_source_moves_across() {
        // Hard-left material panned fully right ends up on the right
        let out = collect(&mut Pan::new(1.0, pair(0.5, 0.0, 2))).unwrap();
        assert!(out.iter().all(|s| *s == StereoSample::new(0.0, 0.5)));

        let out = collect(&mut Pan::new(-1.0, pair(0.0, -0.25, 2))).unwrap();
        assert!(out.iter().all(|s| *s == StereoSample::new(-0.25, 0.0)));

        // Panning toward the side it is already on leaves it alone
        let out = collect(&mut Pan::new(-1.0, pair(0.5, 0.0, 1))).unwrap();
        assert_eq!(out[0], StereoSample::new(0.5, 0.0));
    }

    #[test]
    fn test_pan_law_is_linear() {
        let out = collect(&mut Pan::new(0.5, constant(StereoSample::mono(1.0), 1))).unwrap();
        assert_eq!(out[0], StereoSample::new(0.5, 1.5));

        let out = collect(&mut Pan::new(-0.25, constant(StereoSample::mono(1.0), 1))).unwrap();
        assert_eq!(out[0], StereoSample::new(1.25, 0.75));
    }

    #[test]
    fn test_position_is_clamped() {
        let mut pan = Pan::new(3.0, pair(1.0, 1.0, 1));
        assert_eq!(pan.position(), 1.0);
        pan.set_position(-7.0);
        assert_eq!(pan.position(), -1.0);
    }

    #[test]
    fn test_mono_and_swap() {
        let out = collect(&mut Mono::new(pair(1.0, 0.0, 2))).unwrap();
        assert!(out.iter().all(|s| *s == StereoSample::mono(0.5)));

        let out = collect(&mut Swap::new(pair(0.1, 0.9, 2))).unwrap();
        assert!(out.iter().all(|s| *s == StereoSample::new(0.9, 0.1)));
    }
}
