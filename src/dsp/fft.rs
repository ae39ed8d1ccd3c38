//! FFT utilities for the psychohaptic model. Grounded in `FourierTools.cpp`
//! (zero-padding to the next power of two, `1/sqrt(N)` normalization, and
//! `GetAmplitude`/`GetFrequency` helpers); `rustfft` replaces the reference's
//! hand-rolled iterative FFT, the crate choice carried over from
//! `operationalgenomics-digital-genome-community`'s Cargo.toml.

use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

/// Next power of two `>= n`, matching the reference's zero-count search.
fn next_power_of_two(n: usize) -> usize {
    if n == 0 {
        return 1;
    }
    n.next_power_of_two()
}

/// Real-input FFT, zero-padded on the left to the next power of two (the
/// reference prepends its padding, rather than appending it) and scaled by
/// `1/sqrt(N)`.
pub fn fft(input: &[f64]) -> Vec<Complex64> {
    let padded_len = next_power_of_two(input.len());
    let zero_count = padded_len - input.len();

    let mut buffer: Vec<Complex64> = std::iter::repeat(Complex64::new(0.0, 0.0))
        .take(zero_count)
        .chain(input.iter().map(|&x| Complex64::new(x, 0.0)))
        .collect();

    let mut planner = FftPlanner::new();
    let plan = planner.plan_fft_forward(padded_len);
    plan.process(&mut buffer);

    let scale = 1.0 / (padded_len as f64).sqrt();
    buffer.iter().map(|c| c * scale).collect()
}

/// `2 * |c|`, the single-sided amplitude of a bin produced by [`fft`].
pub fn amplitude(c: Complex64) -> f64 {
    2.0 * c.norm()
}

/// Signed frequency (Hz) of FFT bin `index` out of `fft_size` bins sampled
/// at `sample_rate`, mirroring `FourierTools::GetFrequency`.
pub fn frequency(index: usize, fft_size: usize, sample_rate: f64) -> f64 {
    let half = (fft_size - 1) / 2 + 1;
    let signed_index = if index < half {
        index as i64
    } else {
        index as i64 - fft_size as i64
    };
    (signed_index as f64 * sample_rate / fft_size as f64).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_peaks_near_the_injected_tone() {
        let fs = 8000.0;
        let n = 256;
        let tone_hz = 500.0;
        let signal: Vec<f64> = (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * tone_hz * i as f64 / fs).sin())
            .collect();
        let spectrum = fft(&signal);
        let (peak_bin, _) = spectrum
            .iter()
            .take(n / 2)
            .enumerate()
            .max_by(|(_, a), (_, b)| a.norm().partial_cmp(&b.norm()).unwrap())
            .unwrap();
        let peak_freq = frequency(peak_bin, n, fs);
        assert!((peak_freq - tone_hz).abs() < fs / n as f64 * 2.0);
    }
}
