//! Encoder/synthesizer configuration (§4.6, ambient). Plain `serde`-derived
//! structs with `Default` impls, following the `Calibration`/`Copedant`
//! pattern in `steel-capture` rather than a builder macro.

use serde::{Deserialize, Serialize};

/// Driver parameters for the PCM-to-scene encoder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Curve/wavelet split point in Hz; 0 disables the curve band entirely.
    pub curve_frequency_limit_hz: f64,
    /// Wavelet analysis block length, in milliseconds; rounded down to the
    /// nearest power-of-two sample count at the input's sample rate.
    pub wavelet_window_length_ms: f64,
    /// SPIHT bit-plane budget per block (`max_alloc_bits`), also the
    /// quantization exponent applied to a block's coefficients before
    /// SPIHT coding (see `codec::encoder`).
    pub wavelet_bitbudget_per_block: i32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            curve_frequency_limit_hz: 72.0,
            wavelet_window_length_ms: 32.0,
            wavelet_bitbudget_per_block: crate::spiht::coder::MAXBITS,
        }
    }
}

/// Parameters for re-synthesizing a scene to PCM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    pub sample_rate_hz: u32,
    /// Extra silence appended after the scene's natural duration, in ticks.
    pub pad_ticks: i32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 8000,
            pad_ticks: 0,
        }
    }
}
