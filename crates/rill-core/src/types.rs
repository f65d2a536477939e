//! Common types for rill
//!
//! The fundamental audio types shared by every source, combinator and the
//! playback driver: the stereo sample, the reusable sample buffer and the
//! out-of-band format metadata.

use std::ops::Index;
use std::time::Duration;

/// Default sample rate (44.1kHz, CD rate)
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Default number of samples the driver pulls per tick
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Largest block size the driver accepts.
/// Covers common device configurations (64 ... 4096) with headroom.
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Size of the private scratch buffers combinators pull their children into.
/// Larger requests are served in several chunks, so scratch never grows.
pub const STREAM_CHUNK: usize = 512;

/// Amplitude type for one channel of one sample
pub type Amplitude = f32;

/// A single stereo sample (left and right channels)
///
/// Uses `#[repr(C)]` to ensure predictable memory layout: [left, right].
/// This enables zero-copy conversion between `&[StereoSample]` and `&[f32]`
/// (interleaved format) using bytemuck, which is what sinks consume.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StereoSample {
    pub left: Amplitude,
    pub right: Amplitude,
}

impl StereoSample {
    /// Create a new stereo sample
    #[inline]
    pub fn new(left: Amplitude, right: Amplitude) -> Self {
        Self { left, right }
    }

    /// Create a silent stereo sample
    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Create a mono sample (same value in both channels)
    #[inline]
    pub fn mono(value: Amplitude) -> Self {
        Self {
            left: value,
            right: value,
        }
    }
}

impl std::ops::Add for StereoSample {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            left: self.left + other.left,
            right: self.right + other.right,
        }
    }
}

impl std::ops::AddAssign for StereoSample {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.left += other.left;
        self.right += other.right;
    }
}

impl std::ops::Mul<Amplitude> for StereoSample {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Amplitude) -> Self {
        Self {
            left: self.left * factor,
            right: self.right * factor,
        }
    }
}

impl std::ops::MulAssign<Amplitude> for StereoSample {
    #[inline]
    fn mul_assign(&mut self, factor: Amplitude) {
        self.left *= factor;
        self.right *= factor;
    }
}

/// Fill a slice with silence
#[inline]
pub fn fill_silence(samples: &mut [StereoSample]) {
    samples.fill(StereoSample::silence());
}

/// Add `src` into `dst` position-wise. Both slices must have the same length.
#[inline]
pub fn mix_into(dst: &mut [StereoSample], src: &[StereoSample]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        *d += *s;
    }
}

/// A buffer of stereo samples
///
/// The driver's master block: allocated once at init at the configured block
/// size, refilled in place every tick and handed to the sink through its
/// interleaved view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoBuffer {
    samples: Vec<StereoSample>,
}

impl StereoBuffer {
    /// Create a buffer filled with silence
    pub fn silence(len: usize) -> Self {
        Self {
            samples: vec![StereoSample::silence(); len],
        }
    }

    /// Create a buffer from interleaved samples [L, R, L, R, ...]
    pub fn from_interleaved(interleaved: &[Amplitude]) -> Self {
        assert!(interleaved.len() % 2 == 0, "Interleaved buffer must have even length");
        let samples = interleaved
            .chunks_exact(2)
            .map(|chunk| StereoSample::new(chunk[0], chunk[1]))
            .collect();
        Self { samples }
    }

    /// Create a buffer from an existing Vec of StereoSamples
    pub fn from_vec(samples: Vec<StereoSample>) -> Self {
        Self { samples }
    }

    /// Get the number of stereo samples in the buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get a mutable slice of the samples
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [StereoSample] {
        &mut self.samples
    }

    /// Zero-copy view of the samples as interleaved f32 [L, R, L, R, ...]
    #[inline]
    pub fn as_interleaved(&self) -> &[Amplitude] {
        bytemuck::cast_slice(&self.samples)
    }

    /// Clamp every channel of every sample to [-ceiling, ceiling]
    pub fn clamp(&mut self, ceiling: Amplitude) {
        for sample in &mut self.samples {
            sample.left = sample.left.clamp(-ceiling, ceiling);
            sample.right = sample.right.clamp(-ceiling, ceiling);
        }
    }

    /// Consume the buffer, returning the underlying samples
    pub fn into_vec(self) -> Vec<StereoSample> {
        self.samples
    }
}

impl Index<usize> for StereoBuffer {
    type Output = StereoSample;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.samples[index]
    }
}

/// Out-of-band format metadata carried alongside a source
///
/// Buffers are never tagged with a rate; producers and consumers agree on it
/// through this struct (decoders return it, encoders consume it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// Samples per second
    pub sample_rate: u32,
    /// Channel count of the underlying stream (the graph itself is always stereo)
    pub channels: u16,
    /// Bits per sample of the encoded representation
    pub bits_per_sample: u16,
}

impl Format {
    /// Stereo format at the given rate, 16-bit when encoded
    pub fn stereo(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 2,
            bits_per_sample: 16,
        }
    }

    /// Duration of `samples` samples at this rate
    pub fn duration(&self, samples: usize) -> Duration {
        Duration::from_secs_f64(samples as f64 / self.sample_rate as f64)
    }

    /// Number of samples covering `duration` at this rate (rounded down)
    pub fn samples_for(&self, duration: Duration) -> usize {
        (duration.as_secs_f64() * self.sample_rate as f64) as usize
    }
}

impl Default for Format {
    fn default() -> Self {
        Self::stereo(DEFAULT_SAMPLE_RATE)
    }
}
