//! Output sink contract and the device-free sinks
//!
//! A [`Sink`] is opened once with the driver's rate and block size and
//! returns a [`BlockWriter`], which moves to the clock thread and receives
//! one block of interleaved stereo samples (`2 * block_size` floats) per
//! tick. Splitting the two lets a sink keep thread-bound resources (such as
//! a device stream) on the thread that owns the player.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, SendTimeoutError, Sender};

use super::error::{SinkError, SinkResult};

/// Default time a [`ChannelSink`] waits for the receiver to make room
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(1);

/// An output target that accepts fixed-size blocks at a fixed rate
pub trait Sink {
    /// Prepare for `sample_rate` Hz and `block_size`-sample blocks.
    ///
    /// Must reject configurations it cannot honor instead of silently
    /// running at another rate.
    fn open(&mut self, sample_rate: u32, block_size: usize) -> SinkResult<Box<dyn BlockWriter>>;

    /// Release the output. Called after the clock thread has stopped.
    fn close(&mut self) -> SinkResult<()>;
}

/// The clock thread's end of an open sink
pub trait BlockWriter: Send {
    /// Write one interleaved stereo block.
    ///
    /// May block until the sink has room; this is what paces the clock.
    fn write(&mut self, block: &[f32]) -> SinkResult<()>;
}

impl<T: Sink + ?Sized> Sink for Box<T> {
    fn open(&mut self, sample_rate: u32, block_size: usize) -> SinkResult<Box<dyn BlockWriter>> {
        (**self).open(sample_rate, block_size)
    }

    fn close(&mut self) -> SinkResult<()> {
        (**self).close()
    }
}

/// Discards every block, sleeping so that blocks are consumed in real time
#[derive(Debug, Default)]
pub struct NullSink;

impl NullSink {
    pub fn new() -> Self {
        Self
    }
}

impl Sink for NullSink {
    fn open(&mut self, sample_rate: u32, block_size: usize) -> SinkResult<Box<dyn BlockWriter>> {
        if sample_rate == 0 || block_size == 0 {
            return Err(SinkError::UnsupportedConfig {
                sample_rate,
                block_size,
            });
        }
        let period = Duration::from_secs_f64(block_size as f64 / sample_rate as f64);
        Ok(Box::new(NullWriter {
            period,
            next: Instant::now(),
        }))
    }

    fn close(&mut self) -> SinkResult<()> {
        Ok(())
    }
}

struct NullWriter {
    period: Duration,
    /// Deadline of the next block; advancing it by whole periods keeps the
    /// average rate exact even when individual sleeps overshoot
    next: Instant,
}

impl BlockWriter for NullWriter {
    fn write(&mut self, _block: &[f32]) -> SinkResult<()> {
        let now = Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
        } else if now - self.next > self.period * 4 {
            // Fell far behind (suspended process?); don't burst to catch up
            self.next = now;
        }
        self.next += self.period;
        Ok(())
    }
}

/// Forwards every block over a bounded channel
///
/// Used for offline rendering and for observing the driver's output in
/// tests. Each block is copied into a fresh `Vec`, so this sink allocates
/// on the clock thread. The bounded channel applies backpressure: the clock
/// runs only as fast as the receiver drains it.
pub struct ChannelSink {
    tx: Sender<Vec<f32>>,
    timeout: Duration,
}

impl ChannelSink {
    /// Create a sink holding at most `capacity` undelivered blocks
    pub fn new(capacity: usize) -> (Self, Receiver<Vec<f32>>) {
        let (tx, rx) = channel::bounded(capacity.max(1));
        (
            Self {
                tx,
                timeout: DEFAULT_SEND_TIMEOUT,
            },
            rx,
        )
    }

    /// How long a write waits for room before reporting [`SinkError::Timeout`]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Sink for ChannelSink {
    fn open(&mut self, sample_rate: u32, block_size: usize) -> SinkResult<Box<dyn BlockWriter>> {
        log::debug!(
            "ChannelSink: opened at {} Hz, {} samples per block",
            sample_rate,
            block_size
        );
        Ok(Box::new(ChannelWriter {
            tx: self.tx.clone(),
            timeout: self.timeout,
        }))
    }

    fn close(&mut self) -> SinkResult<()> {
        Ok(())
    }
}

struct ChannelWriter {
    tx: Sender<Vec<f32>>,
    timeout: Duration,
}

impl BlockWriter for ChannelWriter {
    fn write(&mut self, block: &[f32]) -> SinkResult<()> {
        match self.tx.send_timeout(block.to_vec(), self.timeout) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => Err(SinkError::Timeout),
            Err(SendTimeoutError::Disconnected(_)) => Err(SinkError::Disconnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_forwards_blocks() {
        let (mut sink, rx) = ChannelSink::new(4);
        let mut writer = sink.open(48000, 2).unwrap();

        writer.write(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(rx.recv().unwrap(), vec![0.1, 0.2, 0.3, 0.4]);
        sink.close().unwrap();
    }

    #[test]
    fn test_channel_sink_reports_backpressure_and_disconnect() {
        let (sink, rx) = ChannelSink::new(1);
        let mut sink = sink.with_timeout(Duration::from_millis(5));
        let mut writer = sink.open(48000, 1).unwrap();

        writer.write(&[0.0, 0.0]).unwrap();
        assert_eq!(writer.write(&[0.0, 0.0]), Err(SinkError::Timeout));

        drop(rx);
        assert_eq!(writer.write(&[0.0, 0.0]), Err(SinkError::Disconnected));
    }

    #[test]
    fn test_null_sink_paces_in_real_time() {
        let mut sink = NullSink::new();
        let mut writer = sink.open(1000, 10).unwrap();
        let block = [0.0f32; 20];

        let start = Instant::now();
        for _ in 0..6 {
            writer.write(&block).unwrap();
        }
        // First write is immediate, then 10 ms per block
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_null_sink_rejects_zero_config() {
        assert!(matches!(
            NullSink::new().open(0, 512),
            Err(SinkError::UnsupportedConfig { sample_rate: 0, .. })
        ));
    }
}
