//! End-to-end scenarios from spec.md §8: PCM -> scene -> PCM through the
//! encoder/synthesizer pair, and scene round-trips through both I/O formats
//! together, rather than in isolation per-module as the unit tests do.

use haptic_codec::codec::config::{EncodingConfig, SynthesisConfig};
use haptic_codec::codec::{encoder, synthesizer};
use haptic_codec::io::{binary, json};
use haptic_codec::scene::{Avatar, AvatarType, Haptics, PerceptionModality};

fn sine_capture(fs: u32, freq_hz: f64, n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| (2.0 * std::f64::consts::PI * freq_hz * i as f64 / fs as f64).sin() as f32)
        .collect()
}

#[test]
fn pcm_round_trips_through_encode_and_synthesize_within_tolerance() {
    let fs = 8000u32;
    let pcm = haptic_codec::io::pcm::PcmFile {
        sample_rate: fs,
        channels: vec![sine_capture(fs, 150.0, 2048)],
    };

    let config = EncodingConfig::default();
    let perception = encoder::encode_pcm(&pcm, PerceptionModality::Vibrotactile, &config).unwrap();

    let synth_config = SynthesisConfig {
        sample_rate_hz: fs,
        pad_ticks: 0,
    };
    let channel = &perception.channels[0];
    let resynthesized = synthesizer::evaluate_block(channel, 2048, synth_config.sample_rate_hz as f64, synth_config.pad_ticks);

    assert_eq!(resynthesized.len(), 2048);
    assert!(resynthesized.iter().all(|&s| (-1.0..=1.0).contains(&s)));
    // Reconstruction is lossy (quantized wavelet coefficients, sparse curve
    // keyframes); a full-scene sanity bound is that some real energy made it
    // through rather than everything collapsing to silence.
    let energy: f64 = resynthesized.iter().map(|s| s * s).sum();
    assert!(energy > 0.0);
}

#[test]
fn pressure_capture_resynthesizes_only_from_its_curve_band() {
    let fs = 8000u32;
    let samples: Vec<f32> = (0..512).map(|i| (i as f32 / 512.0) - 0.5).collect();
    let pcm = haptic_codec::io::pcm::PcmFile {
        sample_rate: fs,
        channels: vec![samples],
    };

    let perception = encoder::encode_pcm(&pcm, PerceptionModality::Pressure, &EncodingConfig::default()).unwrap();
    let channel = &perception.channels[0];
    assert_eq!(channel.bands().len(), 1);

    let resynthesized = synthesizer::evaluate_block(channel, 512, fs as f64, 0);
    assert_eq!(resynthesized.len(), 512);
}

#[test]
fn full_scene_round_trips_through_json_and_binary_identically() {
    let fs = 8000u32;
    let pcm = haptic_codec::io::pcm::PcmFile {
        sample_rate: fs,
        channels: vec![sine_capture(fs, 200.0, 1024)],
    };
    let perception = encoder::encode_pcm(&pcm, PerceptionModality::Vibrotactile, &EncodingConfig::default()).unwrap();

    let mut scene = Haptics::new("1.0", "2026-07-31", "integration test scene");
    scene.add_avatar(Avatar::new(0, 0, AvatarType::Vibration));
    scene.add_perception(perception);

    let json_text = json::to_string(&scene).unwrap();
    let from_json = json::parse(&json_text).unwrap();
    assert_eq!(from_json, scene);

    let bytes = binary::encode_scene(&scene);
    let from_binary = binary::decode_scene(&bytes).unwrap();
    assert_eq!(from_binary, scene);

    assert_eq!(from_json, from_binary);
}

#[test]
fn synthesizing_a_decoded_scene_matches_synthesizing_the_original() {
    let fs = 8000u32;
    let pcm = haptic_codec::io::pcm::PcmFile {
        sample_rate: fs,
        channels: vec![sine_capture(fs, 150.0, 1024)],
    };
    let perception = encoder::encode_pcm(&pcm, PerceptionModality::Vibrotactile, &EncodingConfig::default()).unwrap();
    let mut scene = Haptics::new("1.0", "2026-07-31", "round trip scene");
    scene.add_perception(perception);

    let bytes = binary::encode_scene(&scene);
    let decoded = binary::decode_scene(&bytes).unwrap();

    let original_channel = &scene.perceptions[0].channels[0];
    let decoded_channel = &decoded.perceptions[0].channels[0];

    let original_pcm = synthesizer::evaluate_block(original_channel, 1024, fs as f64, 0);
    let decoded_pcm = synthesizer::evaluate_block(decoded_channel, 1024, fs as f64, 0);

    assert_eq!(original_pcm.len(), decoded_pcm.len());
    for (a, b) in original_pcm.iter().zip(decoded_pcm.iter()) {
        assert!((a - b).abs() < 1e-6, "{a} vs {b}");
    }
}
