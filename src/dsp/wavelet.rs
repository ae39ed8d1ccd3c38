//! Biorthogonal 9/7 wavelet transform: forward/inverse DWT with whole-sample
//! symmetric extension. Filter taps, signs, and the convolve/downsample/
//! recurse structure are taken verbatim from `Wavelet.h`/`Wavelet.cpp`.

const LP_0: f64 = 0.852_698_679_009_404;
const LP_1: f64 = 0.377_402_855_612_654;
const LP_2: f64 = -0.110_624_404_418_423;
const LP_3: f64 = -0.023_849_465_019_380;
const LP_4: f64 = 0.037_828_455_506_995;

const HP_0: f64 = -0.788_485_616_405_665;
const HP_1: f64 = 0.418_092_273_222_212;
const HP_2: f64 = 0.040_689_417_609_559;
const HP_3: f64 = -0.064_538_882_628_938;

const LP: [f64; 9] = [LP_4, LP_3, LP_2, LP_1, LP_0, LP_1, LP_2, LP_3, LP_4];
const HP: [f64; 7] = [HP_3, HP_2, HP_1, HP_0, HP_1, HP_2, HP_3];
const LPR: [f64; 7] = [HP_3, -HP_2, HP_1, -HP_0, HP_1, -HP_2, HP_3];
const HPR: [f64; 9] = [-LP_4, LP_3, -LP_2, LP_1, -LP_0, LP_1, -LP_2, LP_3, -LP_4];

/// Direct ("full") convolution: `out[j] = sum_i in[j - i] * h[i]`, with
/// `out` zero-padded to length `in.len() + h.len() - 1`.
fn conv1d(input: &[f64], h: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; input.len() + h.len() - 1];
    for (j, &x) in input.iter().enumerate() {
        out[j] += x * h[0];
    }
    for (i, &coeff) in h.iter().enumerate().skip(1) {
        for (j, &x) in input.iter().enumerate() {
            out[j + i] += x * coeff;
        }
    }
    out
}

/// Whole-sample symmetric extension by `h.len() / 2` samples on each side,
/// convolved with `h`, then cropped back to `in.len()`.
fn symconv1d(input: &[f64], h: &[f64]) -> Vec<f64> {
    let lext = h.len() / 2;
    let mut extended = Vec::with_capacity(input.len() + 2 * lext);
    extended.extend(input[1..=lext].iter().rev());
    extended.extend_from_slice(input);
    extended.extend(input[input.len() - lext - 1..input.len() - 1].iter().rev());

    let conv = conv1d(&extended, h);
    let extension = 2 * lext;
    conv[extension..conv.len() - extension].to_vec()
}

/// Same as [`symconv1d`] but accumulates into an existing buffer instead of
/// replacing it, mirroring `Wavelet::symconv1DAdd`.
fn symconv1d_add(input: &[f64], h: &[f64], out: &mut [f64]) {
    let lext = h.len() / 2;
    let mut extended = Vec::with_capacity(input.len() + 2 * lext);
    extended.extend(input[1..=lext].iter().rev());
    extended.extend_from_slice(input);
    extended.extend(input[input.len() - lext - 1..input.len() - 1].iter().rev());

    let conv = conv1d(&extended, h);
    for (i, slot) in out.iter_mut().enumerate() {
        *slot += conv[i + h.len() - 1];
    }
}

/// Forward `levels`-level 9/7 DWT. `input.len()` must be a power of two at
/// least `2^(levels+2)`.
pub fn dwt(input: &[f64], levels: usize) -> Vec<f64> {
    let mut out = input.to_vec();
    let mut x = input.to_vec();

    for i in 0..levels {
        let len = input.len() >> i;
        let slice = &x[..len];
        let h = symconv1d(slice, &HP);
        let l = symconv1d(slice, &LP);

        let half = len / 2;
        let mut j = 0;
        while j < len {
            out[j / 2] = l[j];
            out[j / 2 + half] = h[j + 1];
            x[j / 2] = l[j];
            j += 2;
        }
    }
    out
}

/// Inverse `levels`-level 9/7 DWT, the exact mirror of [`dwt`].
pub fn inv_dwt(input: &[f64], levels: usize) -> Vec<f64> {
    let mut out = input.to_vec();

    for i in (0..levels).rev() {
        let len = input.len() >> i;
        let mut l = vec![0.0; len];
        let mut h = vec![0.0; len];
        let half = len / 2;
        let mut j = 0;
        while j < len {
            l[j] = out[j / 2];
            h[j + 1] = out[j / 2 + half];
            j += 2;
        }
        let mut reconstructed = symconv1d(&h, &HPR);
        symconv1d_add(&l, &LPR, &mut reconstructed);
        out[..len].copy_from_slice(&reconstructed);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f64], b: &[f64], tol: f64) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < tol, "{x} != {y} (tol {tol})");
        }
    }

    #[test]
    fn round_trips_a_ramp_of_128_samples() {
        let input: Vec<f64> = (0..128).map(|i| i as f64).collect();
        let coeffs = dwt(&input, 1);
        let reconstructed = inv_dwt(&coeffs, 1);
        assert_close(&input, &reconstructed, 1e-5);
    }

    #[test]
    fn round_trips_every_power_of_two_length_and_level() {
        for &len in &[64usize, 128, 256, 512, 1024, 2048] {
            let max_level = (len as f64).log2() as usize - 3;
            for level in 1..=max_level {
                let input: Vec<f64> = (0..len)
                    .map(|i| ((i as f64) * 0.37).sin() * 10.0 - (i as f64 % 7.0))
                    .collect();
                let coeffs = dwt(&input, level);
                let reconstructed = inv_dwt(&coeffs, level);
                assert_close(&input, &reconstructed, 1e-5);
            }
        }
    }
}
