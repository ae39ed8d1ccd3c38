//! PCM-to-scene driver (§4.6). Grounded in `Encoder/src/PcmEncoder.cpp`:
//! per channel, low-pass + local-extrema for the curve band, high-pass +
//! residual-from-curve-interpolation for the wavelet band's input signal,
//! then blocked DWT + psychohaptic-driven SPIHT + arithmetic coding.

use crate::codec::config::EncodingConfig;
use crate::dsp::{filterbank::Filterbank, interpolation, psychohaptic, psychohaptic::PsychohapticModel, wavelet};
use crate::error::{HapticsError, Result};
use crate::io::pcm::PcmFile;
use crate::scene::{
    BaseSignal, Band, BandType, Channel, CurveType, EncodingModality, Effect, EffectType, Perception,
    PerceptionModality,
};
use crate::spiht::arithmetic::{convert_to_bytes, ArithEncoder};
use crate::spiht::coder::{self, MaxDescendants};

const MS_PER_S: f64 = 1000.0;

/// Drives an entire PCM capture into a `Perception`, one channel per PCM
/// channel, mirroring `PcmEncoder::encode`.
pub fn encode_pcm(pcm: &PcmFile, modality: PerceptionModality, config: &EncodingConfig) -> Result<Perception> {
    if pcm.channels.is_empty() {
        return Err(HapticsError::config("pcm file has no channels"));
    }
    let fs = pcm.sample_rate as f64;
    let mut perception = Perception::new(0, 0, "pcm capture", modality);

    for (channel_index, raw) in pcm.channels.iter().enumerate() {
        let mut channel = Channel::new(channel_index as i32, format!("channel {channel_index}"));
        channel.frequency_sampling = Some(pcm.sample_rate);
        channel.sample_count = Some(raw.len() as u32);

        let raw_f64: Vec<f64> = raw.iter().map(|&s| s as f64).collect();
        encode_channel(&raw_f64, fs, modality, config, &mut channel)?;
        perception.add_channel(channel);
    }

    Ok(perception)
}

fn encode_channel(
    raw: &[f64],
    fs: f64,
    modality: PerceptionModality,
    config: &EncodingConfig,
    channel: &mut Channel,
) -> Result<()> {
    // VibrotactileTexture/Stiffness skip the low-pass: their curve band
    // tracks the raw envelope rather than a smoothed one (`PcmEncoder.cpp`).
    let skip_lowpass = matches!(
        modality,
        PerceptionModality::VibrotactileTexture | PerceptionModality::Stiffness
    );

    let mut curve_type = CurveType::Unknown;
    let mut filtered = raw.to_vec();

    if config.curve_frequency_limit_hz > 0.0 {
        filtered = if skip_lowpass {
            raw.to_vec()
        } else {
            Filterbank::new(fs).lp(raw, config.curve_frequency_limit_hz)
        };

        curve_type = match modality {
            PerceptionModality::Force | PerceptionModality::Stiffness => CurveType::Linear,
            PerceptionModality::Vibrotactile | PerceptionModality::VibrotactileTexture => CurveType::Cubic,
            _ => CurveType::Unknown,
        };

        channel.add_band(build_curve_band(&filtered, fs, curve_type, config.curve_frequency_limit_hz));
    }

    if matches!(modality, PerceptionModality::Vibrotactile | PerceptionModality::Other) {
        channel.add_band(encode_wavelet_band(raw, &filtered, fs, curve_type, config)?);
    }

    Ok(())
}

fn build_curve_band(filtered: &[f64], fs: f64, curve_type: CurveType, curve_frequency_limit_hz: f64) -> Band {
    let extrema = interpolation::local_extrema(filtered, true);

    let mut band = Band::new(BandType::Curve, EncodingModality::Vectorial);
    band.curve_type = Some(curve_type);
    band.upper_frequency_limit = curve_frequency_limit_hz as i32;

    let mut effect = Effect::new(0, 0.0, BaseSignal::Sine, EffectType::Basis);
    for &(index, value) in &extrema {
        let position_ms = (MS_PER_S * index as f64 / fs) as i32;
        effect
            .keyframes
            .push(crate::scene::Keyframe::new(Some(position_ms), Some(value as f32), None));
    }
    band.add_effect(effect);
    band
}

/// High-pass of the raw signal plus the curve band's own interpolation
/// residual, blocked into power-of-two windows, each DWT'd, psychohaptically
/// bit-allocated, SPIHT-coded and arithmetic-coded (`Spiht_Enc.cpp::encodeEffect`).
fn encode_wavelet_band(
    raw: &[f64],
    filtered: &[f64],
    fs: f64,
    curve_type: CurveType,
    config: &EncodingConfig,
) -> Result<Band> {
    let signal = if config.curve_frequency_limit_hz > 0.0 {
        let points: Vec<(f64, f64)> = interpolation::local_extrema(filtered, true)
            .iter()
            .map(|&(i, v)| (i as f64, v))
            .collect();
        let residual: Vec<f64> = filtered
            .iter()
            .enumerate()
            .map(|(i, &f)| f - interpolation::interpolate(&points, curve_type, i as f64))
            .collect();
        let high_passed = Filterbank::new(fs).hp(raw, config.curve_frequency_limit_hz);
        high_passed.iter().zip(residual.iter()).map(|(&h, &d)| h + d).collect()
    } else {
        raw.to_vec()
    };

    let block_len = block_length(config.wavelet_window_length_ms, fs);
    let level = (block_len as f64).log2() as i32 - 2;
    let psy = PsychohapticModel::new(block_len, fs);
    let max_bits = config.wavelet_bitbudget_per_block.clamp(0, coder::MAXBITS);

    let mut band = Band::new(BandType::WaveletWave, EncodingModality::Wavelet);
    band.window_length = Some(block_len as u32);
    band.lower_frequency_limit = config.curve_frequency_limit_hz as i32;
    band.upper_frequency_limit = (fs / 2.0) as i32;

    let mut position = 0usize;
    for chunk in signal.chunks(block_len) {
        let mut block = chunk.to_vec();
        block.resize(block_len, 0.0);

        band.add_effect(Effect::wavelet_block(
            position as i32,
            encode_block(&block, &psy, level, max_bits),
        ));
        position += block_len;
    }

    Ok(band)
}

/// One analysis block: DWT, psychohaptic bit allocation (the per-subband
/// allocation's maximum becomes the block's single `maxallocbits`, since the
/// reference's `encodeEffect` takes that value pre-supplied rather than
/// deriving it itself), quantize, SPIHT-code, arithmetic-code.
fn encode_block(block: &[f64], psy: &PsychohapticModel, level: i32, max_bits: i32) -> Vec<u8> {
    let coeffs = wavelet::dwt(block, level as usize);
    let smr = psy.get_smr(block);
    let allocation = psychohaptic::allocate_bits(&smr.smr_db, max_bits as usize, max_bits as usize);
    let bits = allocation.iter().copied().max().unwrap_or(0) as i32;

    let wavmax = coeffs.iter().fold(0.0_f64, |acc, &c| acc.max(c.abs()));
    let multiplier = 2f64.powi(bits);
    let quantized: Vec<i64> = coeffs.iter().map(|&c| (c * multiplier).round() as i64).collect();

    let scratch = MaxDescendants::init(&quantized);
    let bitwavmax = coder::maximum_wavelet_coefficient(wavmax);
    let spiht = coder::encode(&quantized, &scratch, level, &bitwavmax, bits);

    let coded = ArithEncoder::default().encode(&spiht.bits, &spiht.context);
    convert_to_bytes(&coded)
}

/// Largest power of two not exceeding `window_length_ms` worth of samples at
/// `fs`, floored to 8 (the SPIHT/DWT minimum usable block length).
fn block_length(window_length_ms: f64, fs: f64) -> usize {
    let target = ((window_length_ms / 1000.0) * fs).floor().max(8.0) as usize;
    let mut p = 8usize;
    while p * 2 <= target {
        p *= 2;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_band_ms_conversion_matches_spec_scenario() {
        // (sample index, amplitude) extrema pairs at 8000 Hz, and their
        // expected millisecond keyframe positions.
        let extrema = [(0, 0.654), (24, 1.0), (40, 0.0), (80, -0.34), (656, -0.5648), (2500, 0.15)];
        let expected_ms = [0, 3, 5, 10, 82, 312];
        for (&(index, _), &expected) in extrema.iter().zip(expected_ms.iter()) {
            let position_ms = (MS_PER_S * index as f64 / 8000.0) as i32;
            assert_eq!(position_ms, expected);
        }
    }

    #[test]
    fn block_length_rounds_down_to_a_power_of_two() {
        assert_eq!(block_length(32.0, 8000.0), 256);
        assert_eq!(block_length(1.0, 8000.0), 8);
        assert_eq!(block_length(0.0, 8000.0), 8);
    }

    #[test]
    fn encode_pcm_rejects_a_channel_less_file() {
        let pcm = PcmFile {
            sample_rate: 8000,
            channels: Vec::new(),
        };
        let err = encode_pcm(&pcm, PerceptionModality::Vibrotactile, &EncodingConfig::default()).unwrap_err();
        assert!(matches!(err, HapticsError::Config(_)));
    }

    #[test]
    fn encode_pcm_produces_a_curve_and_wavelet_band_for_vibrotactile() {
        let fs = 8000u32;
        let samples: Vec<f32> = (0..2048)
            .map(|i| (2.0 * std::f64::consts::PI * 150.0 * i as f64 / fs as f64).sin() as f32)
            .collect();
        let pcm = PcmFile {
            sample_rate: fs,
            channels: vec![samples],
        };
        let config = EncodingConfig::default();

        let perception = encode_pcm(&pcm, PerceptionModality::Vibrotactile, &config).unwrap();
        assert_eq!(perception.channels.len(), 1);
        let bands = perception.channels[0].bands();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].band_type, BandType::Curve);
        assert_eq!(bands[1].band_type, BandType::WaveletWave);
        assert!(!bands[1].effects().is_empty());
        for effect in bands[1].effects() {
            assert!(effect.wavelet_bytes.is_some());
        }
    }

    #[test]
    fn encode_pcm_emits_no_wavelet_band_for_pressure() {
        let fs = 8000u32;
        let samples: Vec<f32> = (0..512).map(|i| (i as f32 / 512.0) - 0.5).collect();
        let pcm = PcmFile {
            sample_rate: fs,
            channels: vec![samples],
        };
        let perception = encode_pcm(&pcm, PerceptionModality::Pressure, &EncodingConfig::default()).unwrap();
        let bands = perception.channels[0].bands();
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].band_type, BandType::Curve);
    }
}
