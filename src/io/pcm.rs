//! PCM container I/O (§4.9, ambient — supplements the distilled spec).
//! Grounded in `wav_player.rs`'s `hound` usage and the reference
//! `WavParser.cpp`: reads any channel count/sample format, normalizing to
//! `[-1, 1]`; writes 16-bit PCM.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

use crate::error::{HapticsError, Result};

pub struct PcmFile {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

/// Reads a little-endian RIFF/WAVE file (16-bit int or 32-bit float),
/// de-interleaving into one normalized `[-1, 1]` buffer per channel.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<PcmFile> {
    let reader = WavReader::open(path.as_ref())
        .map_err(|e| HapticsError::parse(format!("failed to open {:?}: {e}", path.as_ref())))?;
    let spec = reader.spec();
    let channel_count = spec.channels as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| HapticsError::parse(format!("wav decode error: {e}")))?,
        SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| HapticsError::parse(format!("wav decode error: {e}")))?
                .into_iter()
                .map(|s| s as f32 / max)
                .collect()
        }
    };

    let mut channels = vec![Vec::with_capacity(interleaved.len() / channel_count.max(1)); channel_count];
    for frame in interleaved.chunks(channel_count) {
        for (c, &sample) in frame.iter().enumerate() {
            channels[c].push(sample);
        }
    }

    Ok(PcmFile {
        sample_rate: spec.sample_rate,
        channels,
    })
}

/// Writes 16-bit PCM, clamping every sample to `[-1, 1]` before
/// quantization, interleaving the given channel buffers (all must share the
/// same length).
pub fn write_wav<P: AsRef<Path>>(path: P, sample_rate: u32, channels: &[Vec<f32>]) -> Result<()> {
    if channels.is_empty() {
        return Err(HapticsError::config("write_wav requires at least one channel"));
    }
    let len = channels[0].len();
    if channels.iter().any(|c| c.len() != len) {
        return Err(HapticsError::config("write_wav channels must have equal length"));
    }

    let spec = WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path.as_ref(), spec)
        .map_err(|e| HapticsError::io(format!("failed to create {:?}: {e}", path.as_ref())))?;

    for i in 0..len {
        for channel in channels {
            let clamped = channel[i].clamp(-1.0, 1.0);
            let quantized = (clamped * i16::MAX as f32) as i16;
            writer
                .write_sample(quantized)
                .map_err(|e| HapticsError::io(format!("wav write error: {e}")))?;
        }
    }
    writer
        .finalize()
        .map_err(|e| HapticsError::io(format!("wav finalize error: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips_within_quantization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.wav");

        let left: Vec<f32> = (0..100).map(|i| (i as f32 / 100.0) * 2.0 - 1.0).collect();
        let right: Vec<f32> = left.iter().map(|&s| -s).collect();
        write_wav(&path, 8000, &[left.clone(), right.clone()]).unwrap();

        let read = read_wav(&path).unwrap();
        assert_eq!(read.sample_rate, 8000);
        assert_eq!(read.channels.len(), 2);
        for (a, b) in left.iter().zip(read.channels[0].iter()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn write_wav_rejects_mismatched_channel_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.wav");
        let err = write_wav(&path, 8000, &[vec![0.0; 4], vec![0.0; 3]]).unwrap_err();
        assert!(matches!(err, HapticsError::Config(_)));
    }
}
