//! Rill Player - play WAV files through the rill playback driver
//!
//! Decodes every file given on the command line, resamples it to the
//! configured output rate when needed, and plays the files back to back on
//! the configured output device.
//!
//! ## Command line
//!
//! ```text
//! rill-player [--config <file>] [--device <name>] [--gain <dB>] [--null] <file.wav>...
//! rill-player --list-devices
//! ```
//!
//! The playback config is read from `<config dir>/rill/playback.yaml` unless
//! `--config` names another file; a missing file means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};

use rill_core::audio::{output_device_names, CpalSink, NullSink, Sink};
use rill_core::codec::wav;
use rill_core::combinator::Seq;
use rill_core::config::{default_config_path, load_config, PlaybackConfig, PLAYBACK_CONFIG_FILE};
use rill_core::effect::{db_to_gain, Gain};
use rill_core::engine::{Player, VoiceState};
use rill_core::resample::Resampler;
use rill_core::source::{callback, BoxSource};

const USAGE: &str = "\
usage: rill-player [--config <file>] [--device <name>] [--gain <dB>] [--null] <file.wav>...
       rill-player --list-devices";

/// Blocks still queued in the device ring when the last source ends
const DRAIN_BLOCKS: u32 = 4;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    device: Option<String>,
    gain_db: Option<f32>,
    null_sink: bool,
    list_devices: bool,
    files: Vec<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().context("--config needs a path")?.into()),
            "--device" => args.device = Some(iter.next().context("--device needs a name")?),
            "--gain" => {
                let value = iter.next().context("--gain needs a value in dB")?;
                let gain = value
                    .parse::<f32>()
                    .with_context(|| format!("Invalid gain: {}", value))?;
                args.gain_db = Some(gain);
            }
            "--null" => args.null_sink = true,
            "--list-devices" => args.list_devices = true,
            flag if flag.starts_with("--") => bail!("Unknown flag: {}", flag),
            file => args.files.push(file.into()),
        }
    }
    Ok(args)
}

/// Decode `path` and bring it to the output rate
fn open_track(path: &Path, config: &PlaybackConfig) -> Result<BoxSource> {
    let (decoder, format) =
        wav::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    log::info!(
        "{:?}: {} Hz, {} channels, {:.1}s",
        path,
        format.sample_rate,
        format.channels,
        format.duration(decoder.remaining()).as_secs_f64()
    );

    if format.sample_rate == config.sample_rate {
        return Ok(Box::new(decoder));
    }
    log::info!(
        "Resampling {} Hz -> {} Hz (quality {})",
        format.sample_rate,
        config.sample_rate,
        config.resample_quality
    );
    let resampler = Resampler::new(
        config.resample_quality,
        format.sample_rate,
        config.sample_rate,
        decoder,
    )?;
    Ok(Box::new(resampler))
}

fn main() -> Result<()> {
    // Set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args()?;

    if args.list_devices {
        for name in output_device_names()? {
            println!("{}", name);
        }
        return Ok(());
    }
    if args.files.is_empty() {
        bail!("No input files\n{}", USAGE);
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(PLAYBACK_CONFIG_FILE));
    let mut config: PlaybackConfig = load_config(&config_path);
    if args.device.is_some() {
        config.device = args.device.clone();
    }
    config.validate()?;

    let mut tracks = args
        .files
        .iter()
        .map(|path| open_track(path, &config))
        .collect::<Result<Vec<_>>>()?;

    let (done_tx, done_rx) = crossbeam::channel::bounded(1);
    tracks.push(Box::new(callback(move || {
        let _ = done_tx.send(());
    })));

    let mut program: BoxSource = Box::new(Seq::new(tracks));
    if let Some(db) = args.gain_db {
        program = Box::new(Gain::new(db_to_gain(db), program));
    }

    let sink: Box<dyn Sink> = if args.null_sink {
        Box::new(NullSink::new())
    } else {
        Box::new(CpalSink::with_device(config.device.clone()))
    };

    let mut player = Player::new();
    player.init(&config, sink)?;
    let voice = player.play(program)?;

    // A failing track halts the sequence before the callback runs
    while done_rx.recv_timeout(Duration::from_millis(200)).is_err() {
        if voice.state() != VoiceState::Active {
            break;
        }
    }
    std::thread::sleep(config.block_duration() * DRAIN_BLOCKS);

    let stats = player.stats();
    player.close()?;
    log::info!("Done: {} blocks, {} glitches", stats.ticks, stats.glitches);

    if let Some(err) = voice.error() {
        bail!("Playback failed: {}", err);
    }
    Ok(())
}
