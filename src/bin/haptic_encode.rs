//! Capture-to-scene CLI (§5). Single-threaded, synchronous by design: reads
//! one input file, drives the encoder, writes one output file. Mirrors
//! `chirgwin-steel-capture/src/main.rs`'s `clap` + `env_logger` shape, minus
//! its `crossbeam_channel`/`thread::Builder` machinery, since the pipeline
//! here has no concurrent producers to coordinate.

use clap::{Parser, ValueEnum};
use haptic_codec::codec::config::EncodingConfig;
use haptic_codec::codec::encoder;
use haptic_codec::io::{json, pcm};
use haptic_codec::scene::PerceptionModality;
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "haptic-encode")]
#[command(about = "Encode a PCM capture (or re-encode a scene) into the haptic scene format")]
struct Cli {
    /// Input file: a .wav PCM capture, or a .json scene to re-encode.
    #[arg(short = 'f', long)]
    file: PathBuf,

    /// Output scene JSON path.
    #[arg(short = 'o', long, default_value = "out.json")]
    output: PathBuf,

    /// Perception modality to tag the encoded channels with (only used for
    /// .wav input).
    #[arg(short, long, value_enum, default_value_t = Modality::Vibrotactile)]
    modality: Modality,

    /// Curve band low-pass cutoff, Hz. 0 disables the curve band.
    #[arg(long, default_value_t = 72.0)]
    curve_frequency_limit_hz: f64,

    /// Wavelet analysis window, milliseconds.
    #[arg(long, default_value_t = 32.0)]
    wavelet_window_length_ms: f64,
}

#[derive(Copy, Clone, ValueEnum)]
enum Modality {
    Other,
    Pressure,
    Acceleration,
    Velocity,
    Position,
    Temperature,
    Vibrotactile,
    VibrotactileTexture,
    Stiffness,
    Water,
    Wind,
}

impl From<Modality> for PerceptionModality {
    fn from(m: Modality) -> Self {
        match m {
            Modality::Other => PerceptionModality::Other,
            Modality::Pressure => PerceptionModality::Pressure,
            Modality::Acceleration => PerceptionModality::Acceleration,
            Modality::Velocity => PerceptionModality::Velocity,
            Modality::Position => PerceptionModality::Position,
            Modality::Temperature => PerceptionModality::Temperature,
            Modality::Vibrotactile => PerceptionModality::Vibrotactile,
            Modality::VibrotactileTexture => PerceptionModality::VibrotactileTexture,
            Modality::Stiffness => PerceptionModality::Stiffness,
            Modality::Water => PerceptionModality::Water,
            Modality::Wind => PerceptionModality::Wind,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> haptic_codec::Result<()> {
    let extension = cli.file.extension().and_then(|e| e.to_str()).unwrap_or("");

    let scene = match extension {
        "wav" => {
            info!("reading PCM capture from {:?}", cli.file);
            let pcm = pcm::read_wav(&cli.file)?;
            let config = EncodingConfig {
                curve_frequency_limit_hz: cli.curve_frequency_limit_hz,
                wavelet_window_length_ms: cli.wavelet_window_length_ms,
                ..EncodingConfig::default()
            };
            let perception = encoder::encode_pcm(&pcm, cli.modality.into(), &config)?;
            let mut scene = haptic_codec::scene::Haptics::new("1.0", "", "pcm capture");
            scene.add_perception(perception);
            scene
        }
        "json" => {
            info!("re-encoding scene from {:?}", cli.file);
            json::load(&cli.file)?
        }
        other => {
            return Err(haptic_codec::HapticsError::config(format!(
                "unsupported input extension: {other:?} (expected .wav or .json)"
            )))
        }
    };

    info!("writing scene to {:?}", cli.output);
    json::save(&scene, &cli.output)
}
