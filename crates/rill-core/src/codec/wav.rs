//! WAV decoding and encoding via hound
//!
//! Decoding yields a [`Source`] plus the file's [`Format`]. Integer samples
//! of 8 to 32 bits are scaled to [-1, 1); 32-bit float samples pass through.
//! Mono files play on both channels and channels beyond the second are
//! dropped. The decoder does not resample: wrap it in a `Resampler` when the
//! file rate differs from the player's.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use super::error::{CodecError, CodecResult};
use crate::source::{Source, StreamError};
use crate::types::{Format, StereoSample, STREAM_CHUNK};

#[derive(Debug, Clone, Copy)]
enum Encoding {
    /// Integer samples, multiplied by `scale` to reach [-1, 1)
    Int { scale: f32 },
    Float,
}

fn hound_error(err: hound::Error) -> StreamError {
    match err {
        hound::Error::IoError(e) => StreamError::from(e),
        other => StreamError::decode(other.to_string()),
    }
}

/// Streaming WAV decoder
pub struct WavDecoder<R: Read> {
    reader: WavReader<R>,
    channels: usize,
    encoding: Encoding,
    /// Channel values not yet read
    left: usize,
    done: bool,
    error: Option<StreamError>,
}

impl<R: Read + Send> WavDecoder<R> {
    /// Frames (stereo samples) not yet decoded
    pub fn remaining(&self) -> usize {
        self.left / self.channels
    }

    fn fail(&mut self, err: StreamError) {
        log::warn!("WAV decode failed: {}", err);
        self.error = Some(err);
        self.done = true;
    }

    /// Decode frames into `buf`, converting each channel value with `convert`
    fn fill<T, F>(&mut self, buf: &mut [StereoSample], convert: F) -> usize
    where
        T: hound::Sample,
        F: Fn(T) -> f32,
    {
        let channels = self.channels;
        let mut samples = self.reader.samples::<T>();
        let mut n = 0;
        let mut read = 0;
        let mut failure = None;

        'frames: while n < buf.len() {
            let mut frame = [0.0f32; 2];
            for ch in 0..channels {
                match samples.next() {
                    Some(Ok(value)) => {
                        read += 1;
                        if ch < 2 {
                            frame[ch] = convert(value);
                        }
                    }
                    Some(Err(e)) => {
                        failure = Some(hound_error(e));
                        break 'frames;
                    }
                    None if ch == 0 => {
                        self.done = true;
                        break 'frames;
                    }
                    None => {
                        failure = Some(StreamError::decode("truncated frame at end of data"));
                        break 'frames;
                    }
                }
            }
            if channels == 1 {
                frame[1] = frame[0];
            }
            buf[n] = StereoSample::new(frame[0], frame[1]);
            n += 1;
        }
        drop(samples);

        self.left = self.left.saturating_sub(read);
        if let Some(err) = failure {
            self.fail(err);
        }
        n
    }
}

impl<R: Read + Send> Source for WavDecoder<R> {
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        if self.done {
            return (0, false);
        }
        let n = match self.encoding {
            Encoding::Int { scale } => self.fill::<i32, _>(buf, |v| v as f32 * scale),
            Encoding::Float => self.fill::<f32, _>(buf, |v| v),
        };
        if self.error.is_some() {
            return (n, false);
        }
        if self.left == 0 {
            self.done = true;
        }
        (n, !self.done)
    }

    fn err(&self) -> Option<&StreamError> {
        self.error.as_ref()
    }
}

/// Open a WAV stream, returning the decoder and the file's format
pub fn decode<R: Read + Send>(reader: R) -> CodecResult<(WavDecoder<R>, Format)> {
    let reader = WavReader::new(reader)?;
    let spec = reader.spec();

    let encoding = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => Encoding::Float,
        (SampleFormat::Int, bits @ 8..=32) => Encoding::Int {
            scale: 1.0 / (1u64 << (bits - 1)) as f32,
        },
        (format, bits) => {
            return Err(CodecError::Unsupported(format!(
                "{} bit {:?} samples",
                bits, format
            )))
        }
    };
    if spec.channels == 0 {
        return Err(CodecError::Unsupported("zero channels".to_string()));
    }

    let format = Format {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
    };
    log::debug!(
        "WAV: {} Hz, {} channels, {} bit {:?}, {} frames",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format,
        reader.duration()
    );

    let decoder = WavDecoder {
        left: reader.len() as usize,
        reader,
        channels: spec.channels as usize,
        encoding,
        done: false,
        error: None,
    };
    Ok((decoder, format))
}

/// Open a WAV file
pub fn open(path: &Path) -> CodecResult<(WavDecoder<BufReader<File>>, Format)> {
    let file = File::open(path).map_err(hound::Error::IoError)?;
    decode(BufReader::new(file))
}

/// Encode `source` to exhaustion as stereo WAV at `format.sample_rate`
///
/// `format.bits_per_sample == 32` writes 32-bit float; anything else
/// writes 16-bit integer, clamping to full scale. Returns the number of
/// frames written. A source error aborts the encode with
/// [`CodecError::Source`].
pub fn encode<W, S>(writer: W, format: &Format, source: &mut S) -> CodecResult<u64>
where
    W: Write + Seek,
    S: Source + ?Sized,
{
    let float = format.bits_per_sample == 32;
    let spec = WavSpec {
        channels: 2,
        sample_rate: format.sample_rate,
        bits_per_sample: if float { 32 } else { 16 },
        sample_format: if float { SampleFormat::Float } else { SampleFormat::Int },
    };
    let mut writer = WavWriter::new(writer, spec)?;

    let mut chunk = vec![StereoSample::silence(); STREAM_CHUNK];
    let mut frames = 0u64;
    loop {
        let (n, more) = source.stream(&mut chunk);
        for s in &chunk[..n] {
            if float {
                writer.write_sample(s.left)?;
                writer.write_sample(s.right)?;
            } else {
                writer.write_sample(to_i16(s.left))?;
                writer.write_sample(to_i16(s.right))?;
            }
        }
        frames += n as u64;
        if !more {
            break;
        }
    }

    if let Some(err) = source.err() {
        return Err(CodecError::Source(err.clone()));
    }
    writer.finalize()?;
    Ok(frames)
}

/// Encode `source` to a WAV file at `path`
pub fn create<S: Source + ?Sized>(
    path: &Path,
    format: &Format,
    source: &mut S,
) -> CodecResult<u64> {
    let file = File::create(path).map_err(hound::Error::IoError)?;
    encode(BufWriter::new(file), format, source)
}

#[inline]
fn to_i16(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
