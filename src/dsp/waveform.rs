//! Base-signal generators and the chirp phase integral used by vectorial
//! wave bands (§4.1). Grounded in `Band::EvaluationSwitch`'s dispatch on
//! `encodingModality == Vectorial`; the per-waveform shapes are standard and
//! not separately named in the filtered reference pack.

use crate::scene::BaseSignal;

/// Evaluate a base signal at the given phase (radians), in `[-1, 1]`.
pub fn generate(base_signal: BaseSignal, phase: f64) -> f64 {
    match base_signal {
        BaseSignal::Sine => phase.sin(),
        BaseSignal::Square => {
            if phase.sin() >= 0.0 {
                1.0
            } else {
                -1.0
            }
        }
        BaseSignal::Triangle => (2.0 / std::f64::consts::PI) * phase.sin().asin(),
        BaseSignal::SawToothUp => {
            let cycle = phase.rem_euclid(2.0 * std::f64::consts::PI) / (2.0 * std::f64::consts::PI);
            2.0 * cycle - 1.0
        }
        BaseSignal::SawToothDown => {
            let cycle = phase.rem_euclid(2.0 * std::f64::consts::PI) / (2.0 * std::f64::consts::PI);
            1.0 - 2.0 * cycle
        }
    }
}

/// Chirp phase integral between two keyframes with frequencies `f0`/`f1` at
/// times `t0`/`t1` (ms), evaluated at `t` (ms): `pi*(f0*tau + 0.5*tau^2*(f1-f0)/(t1-t0))`.
pub fn chirp_phase(f0: f64, f1: f64, t0: f64, t1: f64, t: f64) -> f64 {
    let tau = t - t0;
    let duration = t1 - t0;
    if duration == 0.0 {
        return std::f64::consts::PI * f0 * tau;
    }
    std::f64::consts::PI * (f0 * tau + 0.5 * tau * tau * (f1 - f0) / duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_matches_std_sin() {
        assert_eq!(generate(BaseSignal::Sine, 1.23), 1.23f64.sin());
    }

    #[test]
    fn square_is_bipolar() {
        assert_eq!(generate(BaseSignal::Square, 0.1), 1.0);
        assert_eq!(generate(BaseSignal::Square, std::f64::consts::PI + 0.1), -1.0);
    }

    #[test]
    fn chirp_phase_reduces_to_constant_frequency_when_f0_equals_f1() {
        let phase = chirp_phase(100.0, 100.0, 0.0, 10.0, 5.0);
        assert!((phase - std::f64::consts::PI * 100.0 * 5.0).abs() < 1e-9);
    }
}
