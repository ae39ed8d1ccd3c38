//! Scene-to-PCM CLI (§5). Reads a scene JSON file, synthesizes every
//! channel of every perception to a WAV file (one stereo-agnostic file per
//! perception, channels interleaved in scene order), and optionally emits an
//! OHM sidecar describing the channels it produced. Single-threaded,
//! synchronous, same shape as `haptic-encode`.

use clap::Parser;
use haptic_codec::codec::config::SynthesisConfig;
use haptic_codec::codec::synthesizer;
use haptic_codec::io::ohm::{OhmChannelMetadata, OhmData, OhmElementMetadata};
use haptic_codec::io::{json, pcm};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "haptic-synth")]
#[command(about = "Synthesize a haptic scene back to PCM")]
struct Cli {
    /// Input scene JSON path.
    #[arg(short = 'f', long)]
    file: PathBuf,

    /// Output WAV path.
    #[arg(short = 'o', long, default_value = "out.wav")]
    output: PathBuf,

    /// Synthesis sample rate, Hz.
    #[arg(long = "fs", default_value_t = 8000)]
    sample_rate_hz: u32,

    /// Padding applied before the first sample, in ticks (ms).
    #[arg(long, default_value_t = 0)]
    pad: i32,

    /// Also write an OHM sidecar (.ohm) describing the produced channels.
    #[arg(long)]
    generate_ohm: bool,
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
    info!("reading scene from {:?}", cli.file);
    let scene = json::load(&cli.file)?;

    let config = SynthesisConfig {
        sample_rate_hz: cli.sample_rate_hz,
        pad_ticks: cli.pad,
    };

    let mut channels = Vec::new();
    let mut ohm_elements = Vec::new();

    for perception in &scene.perceptions {
        let mut ohm_channels = Vec::new();
        for channel in &perception.channels {
            let duration_ms = channel.channel_time_length();
            let sample_count =
                ((duration_ms / 1000.0) * config.sample_rate_hz as f64).ceil().max(0.0) as usize;
            let samples = synthesizer::evaluate_block(channel, sample_count, config.sample_rate_hz as f64, config.pad_ticks);
            channels.push(samples.into_iter().map(|s| s as f32).collect::<Vec<f32>>());

            ohm_channels.push(OhmChannelMetadata {
                channel_description: channel.description.clone(),
                gain: channel.gain,
                body_part_mask: channel.body_part_mask,
            });
        }
        if !ohm_channels.is_empty() {
            ohm_elements.push(OhmElementMetadata {
                element_filename: cli.output.to_string_lossy().into_owned(),
                element_description: perception.description.clone(),
                channels: ohm_channels,
            });
        }
    }

    if channels.is_empty() {
        return Err(haptic_codec::HapticsError::config("scene has no channels to synthesize"));
    }

    let max_len = channels.iter().map(|c| c.len()).max().unwrap_or(0);
    for channel in &mut channels {
        channel.resize(max_len, 0.0);
    }

    info!("writing {} channel(s) to {:?}", channels.len(), cli.output);
    pcm::write_wav(&cli.output, cli.sample_rate_hz, &channels)?;

    if cli.generate_ohm {
        let ohm_path = cli.output.with_extension("ohm");
        let mut ohm = OhmData::new(scene.description.clone());
        ohm.elements = ohm_elements;
        info!("writing OHM sidecar to {:?}", ohm_path);
        ohm.write_file(&ohm_path)?;
    }

    Ok(())
}
