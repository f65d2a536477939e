//! Gain - linear volume scaling

use crate::source::{Source, StreamError};
use crate::types::{Amplitude, StereoSample};

/// Gains at or below this are reported as silence by [`gain_to_db`]
const MIN_GAIN: Amplitude = 1e-6;

/// Convert decibels to the linear factor [`Gain`] takes
///
/// 0 dB = 1.0, -6 dB ~ 0.5, +6 dB ~ 2.0
#[inline]
pub fn db_to_gain(db: f32) -> Amplitude {
    10.0f32.powf(db / 20.0)
}

/// Convert a linear factor back to decibels (`-inf` for silence)
#[inline]
pub fn gain_to_db(gain: Amplitude) -> f32 {
    if gain.abs() <= MIN_GAIN {
        f32::NEG_INFINITY
    } else {
        20.0 * gain.abs().log10()
    }
}

/// Multiplies both channels of every sample by a linear factor
///
/// Factors are not clamped: negative values invert polarity and values
/// above 1 amplify. Use [`db_to_gain`] for decibel levels.
pub struct Gain<S> {
    child: S,
    factor: Amplitude,
}

impl<S: Source> Gain<S> {
    pub fn new(factor: Amplitude, child: S) -> Self {
        Self { child, factor }
    }

    pub fn factor(&self) -> Amplitude {
        self.factor
    }

    pub fn set_factor(&mut self, factor: Amplitude) {
        self.factor = factor;
    }
}

impl<S: Source> Source for Gain<S> {
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        let (n, more) = self.child.stream(buf);
        if self.factor != 1.0 {
            for s in &mut buf[..n] {
                *s *= self.factor;
            }
        }
        (n, more)
    }

    fn err(&self) -> Option<&StreamError> {
        self.child.err()
    }
}
