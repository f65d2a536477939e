//! Interpolation kernels, selected by quality level

use std::f32::consts::PI;

use crate::types::StereoSample;

/// Highest accepted quality level (Lanczos lobes)
pub const MAX_QUALITY: usize = 64;

/// Interpolation kernel used by the resampler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    /// Quality 0 - pick the closest input sample
    Nearest,
    /// Quality 1 - straight line between neighbours
    Linear,
    /// Quality 2 - Catmull-Rom cubic over 4 taps
    Cubic,
    /// Quality 3+ - normalized Lanczos window with `a` lobes (2a taps)
    Lanczos(usize),
}

impl Kernel {
    pub fn for_quality(quality: usize) -> Self {
        match quality {
            0 => Kernel::Nearest,
            1 => Kernel::Linear,
            2 => Kernel::Cubic,
            a => Kernel::Lanczos(a),
        }
    }

    /// Taps needed on each side of the read position
    ///
    /// The kernel reads input indices `base + 1 - half ..= base + half`.
    pub fn half_width(&self) -> usize {
        match self {
            Kernel::Nearest | Kernel::Linear => 1,
            Kernel::Cubic => 2,
            Kernel::Lanczos(a) => *a,
        }
    }

    /// Interpolate at `base + t` (`0 <= t < 1`).
    ///
    /// `tap(i)` returns the input sample at `base + i`. At `t == 0` every
    /// kernel returns `tap(0)` exactly.
    pub fn interpolate(&self, t: f32, tap: impl Fn(isize) -> StereoSample) -> StereoSample {
        if t == 0.0 {
            return tap(0);
        }
        match *self {
            Kernel::Nearest => {
                if t < 0.5 {
                    tap(0)
                } else {
                    tap(1)
                }
            }
            Kernel::Linear => tap(0) * (1.0 - t) + tap(1) * t,
            Kernel::Cubic => {
                let (p0, p1, p2, p3) = (tap(-1), tap(0), tap(1), tap(2));
                let t2 = t * t;
                let t3 = t2 * t;
                (p1 * 2.0
                    + (p2 + p0 * -1.0) * t
                    + (p0 * 2.0 + p1 * -5.0 + p2 * 4.0 + p3 * -1.0) * t2
                    + (p0 * -1.0 + p1 * 3.0 + p2 * -3.0 + p3) * t3)
                    * 0.5
            }
            Kernel::Lanczos(a) => {
                let a = a as isize;
                let mut acc = StereoSample::silence();
                let mut norm = 0.0;
                for i in (1 - a)..=a {
                    let w = lanczos(t - i as f32, a as f32);
                    acc += tap(i) * w;
                    norm += w;
                }
                if norm.abs() > f32::EPSILON {
                    acc * (1.0 / norm)
                } else {
                    acc
                }
            }
        }
    }
}

#[inline]
fn sinc(x: f32) -> f32 {
    if x.abs() < 1e-6 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

#[inline]
fn lanczos(x: f32, a: f32) -> f32 {
    if x.abs() >= a {
        0.0
    } else {
        sinc(x) * sinc(x / a)
    }
}
