//! Playback configuration
//!
//! [`PlaybackConfig`] is the whole configuration surface of the engine: the
//! device rate and block size, the quality used when sources must be
//! resampled to the device rate, whether the master output is clipped, and
//! which output device to open. It round-trips through YAML with
//! [`load_config`] / [`save_config`].

mod error;
mod io;

pub use error::{ConfigError, ConfigResult};
pub use io::{default_config_path, load_config, save_config};

use serde::{Deserialize, Serialize};

use crate::resample::MAX_QUALITY;
use crate::types::{DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE, MAX_BLOCK_SIZE};

/// File name used by [`default_config_path`] for the playback config
pub const PLAYBACK_CONFIG_FILE: &str = "playback.yaml";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Output sample rate in Hz
    /// Default: 44100
    pub sample_rate: u32,

    /// Samples per clock tick
    /// Smaller blocks lower latency at the cost of more wakeups.
    /// Default: 512 (~11.6 ms at 44.1 kHz)
    pub block_size: usize,

    /// Interpolation quality for sources at a different rate
    /// 0 = nearest, 1 = linear, 2 = cubic, 3+ = Lanczos lobes.
    /// Default: 4
    pub resample_quality: usize,

    /// Hard-clip the master block to [-1, 1] before it reaches the sink
    /// Default: true
    pub clip_output: bool,

    /// Output device name; `None` selects the system default
    pub device: Option<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            resample_quality: 4,
            clip_output: true,
            device: None,
        }
    }
}

impl PlaybackConfig {
    /// Check every field, returning the first invalid one
    pub fn validate(&self) -> ConfigResult<()> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::InvalidBlockSize(self.block_size));
        }
        if self.resample_quality > MAX_QUALITY {
            return Err(ConfigError::InvalidQuality(self.resample_quality));
        }
        Ok(())
    }

    /// Duration of one clock tick
    pub fn block_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.block_size as f64 / self.sample_rate.max(1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PlaybackConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sample_rate, 44100);
        assert!(config.clip_output);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_rate = PlaybackConfig {
            sample_rate: 0,
            ..Default::default()
        };
        assert_eq!(bad_rate.validate(), Err(ConfigError::InvalidSampleRate(0)));

        let bad_block = PlaybackConfig {
            block_size: 0,
            ..Default::default()
        };
        assert_eq!(bad_block.validate(), Err(ConfigError::InvalidBlockSize(0)));

        let huge_block = PlaybackConfig {
            block_size: MAX_BLOCK_SIZE + 1,
            ..Default::default()
        };
        assert!(huge_block.validate().is_err());

        let bad_quality = PlaybackConfig {
            resample_quality: MAX_QUALITY + 1,
            ..Default::default()
        };
        assert_eq!(
            bad_quality.validate(),
            Err(ConfigError::InvalidQuality(MAX_QUALITY + 1))
        );
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: PlaybackConfig =
            serde_yaml::from_str("sample_rate: 48000\ndevice: hw:1").unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(config.device.as_deref(), Some("hw:1"));
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PLAYBACK_CONFIG_FILE);
        let config = PlaybackConfig {
            block_size: 256,
            clip_output: false,
            ..Default::default()
        };

        save_config(&config, &path).unwrap();
        assert_eq!(load_config::<PlaybackConfig>(&path), config);
    }

    #[test]
    fn test_block_duration() {
        let config = PlaybackConfig { sample_rate: 48000, block_size: 480, ..Default::default() };
        assert_eq!(config.block_duration(), std::time::Duration::from_millis(10));
    }
}
