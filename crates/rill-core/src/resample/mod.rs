//! Sample rate conversion
//!
//! [`Resampler`] reads its child at a fractional position that advances by
//! `from / to` input samples per output sample, interpolating between the
//! surrounding input samples with a [`Kernel`] chosen by quality level.
//! Only the few input samples the kernel needs are kept, in a history queue
//! that is allocated once at construction.
//!
//! Positions before the start and past the end of the input read as
//! silence, so the first and last outputs of a high-quality kernel taper
//! slightly instead of wrapping or clamping.

mod kernel;

pub use kernel::{Kernel, MAX_QUALITY};

use std::collections::VecDeque;

use crate::config::{ConfigError, ConfigResult};
use crate::source::{Source, StreamError};
use crate::types::{StereoSample, STREAM_CHUNK};

/// Outcome of topping up the input history
enum Fill {
    Progress,
    Starved,
}

/// Converts a child source from one sample rate to another
pub struct Resampler<S> {
    child: S,
    kernel: Kernel,
    /// Input samples consumed per output sample (from / to)
    step: f64,

    /// Integer part of the read position, as an absolute input index
    base: u64,
    /// Fractional part of the read position, in [0, 1)
    frac: f64,

    /// Recent input samples; `history[0]` is input index `first`
    history: VecDeque<StereoSample>,
    first: u64,
    /// Total input samples pulled from the child
    pulled: u64,
    chunk: Box<[StereoSample]>,

    child_done: bool,
    failed: bool,
}

impl<S: Source> Resampler<S> {
    /// Resample `child` from `from` Hz to `to` Hz
    pub fn new(quality: usize, from: u32, to: u32, child: S) -> ConfigResult<Self> {
        if from == 0 {
            return Err(ConfigError::InvalidSampleRate(from));
        }
        if to == 0 {
            return Err(ConfigError::InvalidSampleRate(to));
        }
        Self::with_ratio(quality, from as f64 / to as f64, child)
    }

    /// Resample by a constant ratio of input to output samples
    ///
    /// A ratio of 2.0 plays the child twice as fast (and an octave higher);
    /// 0.5 plays it at half speed. Pitch is not preserved.
    pub fn with_ratio(quality: usize, ratio: f64, child: S) -> ConfigResult<Self> {
        if quality > MAX_QUALITY {
            return Err(ConfigError::InvalidQuality(quality));
        }
        validate_ratio(ratio)?;

        let kernel = Kernel::for_quality(quality);
        let capacity = 2 * kernel.half_width() + STREAM_CHUNK + 2;
        Ok(Self {
            child,
            kernel,
            step: ratio,
            base: 0,
            frac: 0.0,
            history: VecDeque::with_capacity(capacity),
            first: 0,
            pulled: 0,
            chunk: vec![StereoSample::silence(); STREAM_CHUNK].into_boxed_slice(),
            child_done: false,
            failed: false,
        })
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    /// Input samples consumed per output sample
    pub fn ratio(&self) -> f64 {
        self.step
    }

    /// Change the ratio; takes effect from the next output sample
    pub fn set_ratio(&mut self, ratio: f64) -> ConfigResult<()> {
        validate_ratio(ratio)?;
        self.step = ratio;
        Ok(())
    }

    /// Change the ratio from a pair of rates
    pub fn set_rates(&mut self, from: u32, to: u32) -> ConfigResult<()> {
        if from == 0 || to == 0 {
            return Err(ConfigError::InvalidSampleRate(from.min(to)));
        }
        self.set_ratio(from as f64 / to as f64)
    }

    fn is_drained(&self) -> bool {
        self.child_done && self.base >= self.pulled
    }

    /// Drop history the kernel can no longer reach
    fn trim(&mut self) {
        let lo = (self.base + 1).saturating_sub(self.kernel.half_width() as u64);
        while self.first < lo && self.history.pop_front().is_some() {
            self.first += 1;
        }
    }

    /// Pull one chunk from the child into the history
    fn fill(&mut self) -> Fill {
        let (n, more) = self.child.stream(&mut self.chunk);
        self.history.extend(self.chunk[..n].iter().copied());
        self.pulled += n as u64;
        if !more {
            self.child_done = true;
            if self.child.err().is_some() {
                self.failed = true;
            }
            return Fill::Progress;
        }
        if n == 0 {
            Fill::Starved
        } else {
            Fill::Progress
        }
    }

    fn tap(&self, index: i64) -> StereoSample {
        if index < self.first as i64 || index >= self.pulled as i64 {
            return StereoSample::silence();
        }
        self.history[(index - self.first as i64) as usize]
    }

    fn advance(&mut self) {
        self.frac += self.step;
        let whole = self.frac.floor();
        self.base += whole as u64;
        self.frac -= whole;
    }
}

fn validate_ratio(ratio: f64) -> ConfigResult<()> {
    if ratio.is_finite() && ratio > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRatio(ratio))
    }
}

impl<S: Source> Source for Resampler<S> {
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        if self.failed {
            return (0, false);
        }

        let half = self.kernel.half_width() as u64;
        let mut n = 0;
        while n < buf.len() {
            self.trim();
            if !self.child_done && self.pulled <= self.base + half {
                match self.fill() {
                    Fill::Progress if self.failed => return (n, false),
                    Fill::Progress => continue,
                    Fill::Starved => break,
                }
            }
            if self.is_drained() {
                break;
            }

            let base = self.base as i64;
            buf[n] = self
                .kernel
                .interpolate(self.frac as f32, |i| self.tap(base + i as i64));
            n += 1;
            self.advance();
        }

        (n, !self.is_drained())
    }

    fn err(&self) -> Option<&StreamError> {
        if self.failed {
            self.child.err()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{lefts, mk, Failing, Trickle};
    use crate::source::{collect, constant, from_fn};

    fn sine(n: usize, period: f32) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * i as f32 / period).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_identity_at_every_quality() {
        let input = sine(1500, 37.0);
        for q in [0, 1, 2, 3, 4, 8, MAX_QUALITY] {
            let mut r = Resampler::new(q, 48000, 48000, mk(&input)).unwrap();
            let out = lefts(&collect(&mut r).unwrap());
            assert_eq!(out.len(), input.len(), "quality {}", q);
            for (a, b) in out.iter().zip(&input) {
                assert!((a - b).abs() < 1e-6, "quality {}: {} vs {}", q, a, b);
            }
        }
    }

    #[test]
    fn test_output_length_follows_ratio() {
        for (from, to, expect) in [(22050, 44100, 2000), (44100, 22050, 500), (48000, 44100, 919)] {
            let source = constant(StereoSample::mono(0.5), 1000);
            let mut r = Resampler::new(4, from, to, source).unwrap();
            let out = collect(&mut r).unwrap();
            assert_eq!(out.len(), expect, "{} -> {}", from, to);
        }
    }

    #[test]
    fn test_upsample_linear_interpolates() {
        let mut r = Resampler::with_ratio(1, 0.5, mk(&[0.0, 1.0, 2.0])).unwrap();
        let out = lefts(&collect(&mut r).unwrap());
        // Past the last input sample the kernel fades toward silence
        assert_eq!(out, vec![0.0, 0.5, 1.0, 1.5, 2.0, 1.0]);
    }

    #[test]
    fn test_downsample_nearest_picks_samples() {
        let mut r = Resampler::with_ratio(0, 2.0, mk(&[1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        assert_eq!(lefts(&collect(&mut r).unwrap()), vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_dc_level_is_preserved() {
        let source = constant(StereoSample::mono(0.5), 4000);
        let mut r = Resampler::new(4, 44100, 48000, source).unwrap();
        let out = collect(&mut r).unwrap();
        // Skip the edges, where taps read silence
        for s in &out[8..out.len() - 8] {
            assert!((s.left - 0.5).abs() < 1e-3);
        }
    }

    #[test]
    fn test_partial_pulls_are_retried() {
        let input = sine(300, 11.0);
        let mut r = Resampler::new(3, 1, 1, Trickle { inner: mk(&input), max: 7 }).unwrap();
        let out = lefts(&collect(&mut r).unwrap());
        assert_eq!(out.len(), input.len());
        assert!(out.iter().zip(&input).all(|(a, b)| (a - b).abs() < 1e-6));
    }

    #[test]
    fn test_starved_child_yields_partial_block() {
        let mut served = false;
        let child = from_fn(move |buf: &mut [StereoSample]| {
            if served {
                return (0, true);
            }
            served = true;
            let n = buf.len().min(4);
            buf[..n].fill(StereoSample::mono(1.0));
            (n, true)
        });
        let mut r = Resampler::new(0, 100, 100, child).unwrap();
        let mut buf = [StereoSample::silence(); 16];
        let (n, more) = r.stream(&mut buf);
        assert!(more);
        // Nearest needs one tap of lookahead before emitting a sample
        assert_eq!(n, 3);
        assert_eq!(r.stream(&mut buf), (0, true));
    }

    #[test]
    fn test_child_error_halts() {
        let mut r = Resampler::new(2, 8000, 16000, Failing::new(0.25, 1)).unwrap();
        let mut buf = vec![StereoSample::silence(); 4096];
        let (_, more) = r.stream(&mut buf);
        assert!(!more);
        assert_eq!(r.err(), Some(&StreamError::failed("injected failure")));
        assert_eq!(r.stream(&mut buf), (0, false));
    }

    #[test]
    fn test_invalid_configuration() {
        let src = || mk(&[0.0]);
        assert!(matches!(
            Resampler::new(1, 0, 44100, src()),
            Err(ConfigError::InvalidSampleRate(0))
        ));
        assert!(matches!(Resampler::new(65, 1, 1, src()), Err(ConfigError::InvalidQuality(65))));
        assert!(matches!(Resampler::with_ratio(1, -1.0, src()), Err(ConfigError::InvalidRatio(_))));
        assert!(Resampler::with_ratio(1, f64::NAN, src()).is_err());
    }

    #[test]
    fn test_set_ratio_changes_speed() {
        let mut r = Resampler::with_ratio(1, 1.0, constant(StereoSample::mono(1.0), 100)).unwrap();
        let mut buf = [StereoSample::silence(); 10];
        assert_eq!(r.stream(&mut buf), (10, true));

        r.set_ratio(2.0).unwrap();
        assert_eq!(r.ratio(), 2.0);
        assert!(r.set_ratio(0.0).is_err());
        assert_eq!(r.ratio(), 2.0);

        // 90 input samples left at two per output
        let rest = collect(&mut r).unwrap();
        assert_eq!(rest.len(), 45);
    }

    #[test]
    fn test_set_rates_mid_stream() {
        let source = constant(StereoSample::mono(1.0), 100);
        let mut r = Resampler::new(1, 44100, 44100, source).unwrap();
        let mut buf = [StereoSample::silence(); 10];
        assert_eq!(r.stream(&mut buf), (10, true));

        r.set_rates(22050, 44100).unwrap();
        assert_eq!(r.ratio(), 0.5);
        r.set_rates(88200, 44100).unwrap();
        assert_eq!(r.ratio(), 2.0);

        assert_eq!(r.set_rates(0, 44100), Err(ConfigError::InvalidSampleRate(0)));
        assert_eq!(r.set_rates(48000, 0), Err(ConfigError::InvalidSampleRate(0)));
        assert_eq!(r.ratio(), 2.0);

        let rest = collect(&mut r).unwrap();
        assert_eq!(rest.len(), 45);
    }
}
