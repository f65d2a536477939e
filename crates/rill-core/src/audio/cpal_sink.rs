//! CPAL output sink
//!
//! ```text
//! ┌──────────────────┐  write(block)   ┌─────────────────────┐   pop()   ┌─────────────────────┐
//! │   Clock thread   │────────────────►│   Sample ring       │──────────►│  CPAL audio thread  │
//! │ (mix, clip)      │  waits for room │  (lock-free SPSC)   │           │  silence on underrun│
//! └──────────────────┘                 └─────────────────────┘           └─────────────────────┘
//! ```
//!
//! The ring holds a few blocks. The clock thread blocks in `write` while it
//! is full, so the device callback, not a timer, sets the pace of the clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, Stream, StreamConfig, SupportedBufferSize};

use super::error::{SinkError, SinkResult};
use super::sink::{BlockWriter, Sink};
use crate::types::StereoSample;

/// Ring capacity in blocks
const RING_BLOCKS: usize = 4;

/// Lower bound on how long a write waits for the device
const MIN_WRITE_TIMEOUT: Duration = Duration::from_millis(50);

/// Names of the output devices of the default host
pub fn output_device_names() -> SinkResult<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|e| SinkError::ConfigError(e.to_string()))?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

fn find_device(name: Option<&str>) -> SinkResult<cpal::Device> {
    let host = cpal::default_host();
    let Some(name) = name else {
        return host.default_output_device().ok_or(SinkError::NoDefaultDevice);
    };

    let mut devices = host
        .output_devices()
        .map_err(|e| SinkError::ConfigError(e.to_string()))?;
    devices
        .find(|d| d.name().map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| SinkError::DeviceNotFound(name.to_string()))
}

/// Pick an f32 config with at least two channels that runs at `sample_rate`
///
/// Unlike a best-effort player this never falls back to another rate: the
/// driver's block cadence is derived from the rate it asked for.
fn output_config(
    device: &cpal::Device,
    sample_rate: u32,
    block_size: usize,
) -> SinkResult<StreamConfig> {
    let supported: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| SinkError::ConfigError(e.to_string()))?
        .collect();

    let best = supported
        .iter()
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .filter(|c| c.channels() >= 2)
        .filter(|c| sample_rate >= c.min_sample_rate().0 && sample_rate <= c.max_sample_rate().0)
        .min_by_key(|c| c.channels())
        .ok_or(SinkError::UnsupportedConfig {
            sample_rate,
            block_size,
        })?;

    // Ask for the driver's block size when the device can do it
    let buffer_size = match best.buffer_size() {
        SupportedBufferSize::Range { min, max }
            if (*min as usize..=*max as usize).contains(&block_size) =>
        {
            BufferSize::Fixed(block_size as u32)
        }
        _ => BufferSize::Default,
    };

    Ok(StreamConfig {
        channels: best.channels(),
        sample_rate: SampleRate(sample_rate),
        buffer_size,
    })
}

/// Plays blocks on a CPAL output device
pub struct CpalSink {
    device_name: Option<String>,
    stream: Option<Stream>,
    underruns: Arc<AtomicU64>,
}

impl CpalSink {
    /// The system default output device
    pub fn new() -> Self {
        Self::with_device(None)
    }

    /// A device by name (`None` = system default)
    pub fn with_device(device_name: Option<String>) -> Self {
        Self {
            device_name,
            stream: None,
            underruns: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Device callbacks that found the ring empty and played silence
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }
}

impl Default for CpalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for CpalSink {
    fn open(&mut self, sample_rate: u32, block_size: usize) -> SinkResult<Box<dyn BlockWriter>> {
        let device = find_device(self.device_name.as_deref())?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let config = output_config(&device, sample_rate, block_size)?;
        let channels = config.channels as usize;

        let (producer, mut consumer) =
            rtrb::RingBuffer::<StereoSample>::new(block_size * RING_BLOCKS);
        let underruns = Arc::clone(&self.underruns);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                    let mut starved = false;
                    for frame in data.chunks_mut(channels) {
                        let sample = match consumer.pop() {
                            Ok(sample) => sample,
                            Err(_) => {
                                starved = true;
                                StereoSample::silence()
                            }
                        };
                        frame[0] = sample.left;
                        frame[1] = sample.right;
                        for ch in frame.iter_mut().skip(2) {
                            *ch = 0.0;
                        }
                    }
                    if starved {
                        underruns.fetch_add(1, Ordering::Relaxed);
                    }
                },
                move |err| {
                    log::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| SinkError::StreamBuildError(e.to_string()))?;
        stream
            .play()
            .map_err(|e| SinkError::StreamPlayError(e.to_string()))?;

        log::info!(
            "CpalSink: {} opened, {} channels, {} Hz, {:?}",
            device_name,
            channels,
            sample_rate,
            config.buffer_size
        );
        self.stream = Some(stream);

        let period = Duration::from_secs_f64(block_size as f64 / sample_rate as f64);
        Ok(Box::new(CpalWriter {
            producer,
            poll: (period / 8).max(Duration::from_micros(250)),
            timeout: (period * RING_BLOCKS as u32).max(MIN_WRITE_TIMEOUT),
        }))
    }

    fn close(&mut self) -> SinkResult<()> {
        if let Some(stream) = self.stream.take() {
            // Dropping the stream stops the device callback
            if let Err(e) = stream.pause() {
                log::debug!("CpalSink: pause on close failed: {}", e);
            }
            log::info!("CpalSink: closed ({} underruns)", self.underruns());
        }
        Ok(())
    }
}

struct CpalWriter {
    producer: rtrb::Producer<StereoSample>,
    poll: Duration,
    timeout: Duration,
}

impl BlockWriter for CpalWriter {
    fn write(&mut self, block: &[f32]) -> SinkResult<()> {
        let frames = block.len() / 2;
        let deadline = Instant::now() + self.timeout;
        while self.producer.slots() < frames {
            if self.producer.is_abandoned() {
                return Err(SinkError::Disconnected);
            }
            if Instant::now() >= deadline {
                return Err(SinkError::Timeout);
            }
            thread::sleep(self.poll);
        }

        let chunk = self
            .producer
            .write_chunk_uninit(frames)
            .map_err(|_| SinkError::Timeout)?;
        chunk.fill_from_iter(
            block
                .chunks_exact(2)
                .map(|pair| StereoSample::new(pair[0], pair[1])),
        );
        Ok(())
    }
}
