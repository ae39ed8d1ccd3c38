//! SPIHT coefficient coder: progressive bit-plane coding of a quantized
//! wavelet block into a symbol/context stream, ready for the adaptive
//! arithmetic coder. Grounded bit-for-bit in `Spiht_Enc.cpp`/`Spiht_Dec.cpp`
//! (SPEC_FULL.md §4.4). The reference decoder's `getBit` ignores its
//! `context` argument and pops from an already-fully-decoded bit vector; the
//! header plumbing that would have produced that vector (presumably an
//! `ArithDec` wired in by a caller not present in the filtered source) is
//! missing from the pack. This implementation instead threads
//! [`crate::spiht::arithmetic::ArithDecoder`] directly through the SPIHT
//! walk, decoding one bit at a time with the context the walk demands next
//! — the only way to make decode actually invertible without that missing
//! piece, and consistent with spec.md §4.4's prose ("every emitted bit of
//! the encoder is consumed in the same order by the decoder").

pub const MAXALLOCBITS_SIZE: usize = 4;
pub const WAVMAX_SIZE: usize = 24;
pub const MAXBITS: i32 = 15;
const FRACTIONBITS_0: i32 = 23;
const FRACTIONBITS_1: i32 = 19;
const INTEGERBITS_1: i32 = 4;

pub const CONTEXT_0: usize = 0;
pub const CONTEXT_1: usize = 1;
pub const CONTEXT_2: usize = 2;
pub const CONTEXT_3: usize = 3;
pub const CONTEXT_4: usize = 4;
pub const CONTEXT_5: usize = 5;
pub const CONTEXT_6: usize = 6;

/// LSB-first bit expansion of `val` into `length` bits (`Spiht_Enc::de2bi`).
fn de2bi(val: i64, length: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(length);
    let mut v = val;
    for _ in 0..length {
        out.push((v & 1) as u8);
        v >>= 1;
    }
    out
}

/// Inverse of [`de2bi`]: `Spiht_Dec::bi2de`.
fn bi2de(bits: &[u8]) -> i64 {
    bits.iter().enumerate().fold(0i64, |acc, (i, &b)| acc | ((b as i64) << i))
}

/// 1-based bit (from the LSB) of `value`'s absolute magnitude (`Spiht_Enc::bitget`).
fn bitget(value: i64, bit: i32) -> u8 {
    let mask = 1i64 << (bit - 1);
    if value & mask != 0 {
        1
    } else {
        0
    }
}

fn sgn(value: i64) -> i64 {
    (value > 0) as i64 - (value < 0) as i64
}

/// Encode the wavelet maximum into its mode bit plus quantized magnitude
/// bits (`Spiht_Enc::maximumWaveletCoefficient`).
pub fn maximum_wavelet_coefficient(qwavmax: f64) -> Vec<u8> {
    let (integerpart, mode, integerbits, fractionbits) = if qwavmax < 1.0 {
        (0.0, 0u8, 0, FRACTIONBITS_0)
    } else {
        (1.0, 1u8, INTEGERBITS_1, FRACTIONBITS_1)
    };

    let mut bitwavmax = Vec::with_capacity(WAVMAX_SIZE);
    bitwavmax.push(mode);
    let magnitude = ((qwavmax - integerpart) * 2f64.powi(fractionbits)) as i64;
    bitwavmax.extend(de2bi(magnitude, (integerbits + fractionbits) as usize));
    bitwavmax
}

/// Inverse of [`maximum_wavelet_coefficient`]: `bits` holds the mode bit
/// followed by `WAVMAX_SIZE - 1` magnitude bits (`Spiht_Dec::getWavmax`).
pub fn decode_wavmax(bits: &[u8]) -> f64 {
    let mode = bits[0];
    let temp = bi2de(&bits[1..WAVMAX_SIZE]);
    if mode == 0 {
        temp as f64 * 2f64.powi(-FRACTIONBITS_0)
    } else {
        temp as f64 * 2f64.powi(-4) + 1.0
    }
}

/// Bottom-up max-descendant / max-grand-descendant scratch for one block,
/// mirroring `Spiht_Enc::initMaxDescendants` exactly.
pub struct MaxDescendants {
    max_descendants: Vec<i64>,
    max_descendants1: Vec<i64>,
}

impl MaxDescendants {
    pub fn init(signal: &[i64]) -> Self {
        let length = signal.len();
        let start = length >> 1;

        let mut max_descendants = vec![0i64; start];
        let mut max_descendants1 = vec![0i64; start >> 1];

        let mut p1 = start;
        let mut p2 = p1 + 1;
        let mut target = start >> 1;

        for _ in 0..(start >> 1) {
            let v1 = signal[p1].abs();
            let v2 = signal[p2].abs();
            max_descendants[target] = v1.max(v2);
            p1 += 2;
            p2 += 2;
            target += 1;
        }

        let mut width = start >> 1;
        p1 = width;
        p2 = p1 + 1;
        target = width >> 1;

        while target > 1 {
            for _ in 0..(width >> 1) {
                let v1 = max_descendants[p1];
                let v2 = max_descendants[p2];
                max_descendants1[target] = v1.max(v2);

                let s1 = signal[p1].abs();
                max_descendants[target] = if s1 > max_descendants1[target] {
                    s1
                } else {
                    max_descendants1[target]
                };
                let s2 = signal[p2].abs();
                if s2 > max_descendants[target] {
                    max_descendants[target] = s2;
                }

                p1 += 2;
                p2 += 2;
                target += 1;
            }
            width >>= 1;
            p1 = width;
            p2 = p1 + 1;
            target = width >> 1;
        }

        Self {
            max_descendants,
            max_descendants1,
        }
    }

    /// `type_ == 0` for descendants, `1` for grand-descendants
    /// (`Spiht_Enc::maxDescendant`).
    fn max_descendant(&self, j: usize, type_: u8) -> i64 {
        if type_ == 1 {
            self.max_descendants1.get(j).copied().unwrap_or(0)
        } else {
            self.max_descendants.get(j).copied().unwrap_or(0)
        }
    }
}

#[derive(Clone, Copy)]
struct LisNode {
    pos: usize,
    is_type_b: bool,
}

/// Run one LIP/LIS pass forward over a Vec that may grow while it's being
/// walked (elements appended by `push` are visited within the same pass,
/// mirroring `std::list::push_back` during iteration); elements that
/// survive the pass (tombstoned `false` never set) persist to the next
/// bitplane.
struct GrowableList<T> {
    items: Vec<Option<T>>,
}

impl<T: Copy> GrowableList<T> {
    fn new(initial: Vec<T>) -> Self {
        Self {
            items: initial.into_iter().map(Some).collect(),
        }
    }

    fn push(&mut self, item: T) {
        self.items.push(Some(item));
    }

    fn take_tail(self) -> Vec<T> {
        self.items.into_iter().flatten().collect()
    }
}

pub struct SpihtEncodeResult {
    pub bits: Vec<u8>,
    pub context: Vec<usize>,
}

fn add_bit(bits: &mut Vec<u8>, context: &mut Vec<usize>, bit: u8, c: usize) {
    bits.push(bit);
    context.push(c);
}

/// Encode `instream` (quantized wavelet coefficients) into a SPIHT
/// symbol/context stream (`Spiht_Enc::encode`). `scratch` must have been
/// built from `instream` via [`MaxDescendants::init`].
pub fn encode(
    instream: &[i64],
    scratch: &MaxDescendants,
    level: i32,
    bitwavmax: &[u8],
    maxallocbits: i32,
) -> SpihtEncodeResult {
    let length = instream.len();
    let mut bits = Vec::new();
    let mut context = Vec::new();

    bits.extend(de2bi(maxallocbits as i64, MAXALLOCBITS_SIZE));
    context.extend(std::iter::repeat(CONTEXT_0).take(MAXALLOCBITS_SIZE));
    bits.extend_from_slice(bitwavmax);
    context.extend(std::iter::repeat(CONTEXT_0).take(bitwavmax.len()));

    let bandsize = 2usize << (((length as f64).log2() as i32) - level);
    let mut lip: Vec<usize> = (0..bandsize).collect();
    let mut lis: Vec<LisNode> = (bandsize / 2..bandsize)
        .map(|pos| LisNode { pos, is_type_b: false })
        .collect();
    let mut lsp: Vec<usize> = Vec::new();

    let mut n = maxallocbits;
    while n >= 0 {
        let compare = 1i64 << n;
        let lsp_index = lsp.len();

        let mut next_lip = Vec::new();
        for &idx in &lip {
            if instream[idx].abs() >= compare {
                add_bit(&mut bits, &mut context, 1, CONTEXT_2);
                add_bit(&mut bits, &mut context, (instream[idx] >= 0) as u8, CONTEXT_1);
                lsp.push(idx);
            } else {
                add_bit(&mut bits, &mut context, 0, CONTEXT_2);
                next_lip.push(idx);
            }
        }

        let mut queue = GrowableList::new(lis);
        let mut i = 0;
        while i < queue.items.len() {
            let node = queue.items[i].unwrap();
            if !node.is_type_b {
                let max_d = scratch.max_descendant(node.pos, 0);
                if max_d >= compare {
                    add_bit(&mut bits, &mut context, 1, CONTEXT_3);
                    let y = node.pos;
                    for index in [2 * y, 2 * y + 1] {
                        if instream[index].abs() >= compare {
                            lsp.push(index);
                            add_bit(&mut bits, &mut context, 1, CONTEXT_4);
                            add_bit(&mut bits, &mut context, (instream[index] >= 0) as u8, CONTEXT_1);
                        } else {
                            add_bit(&mut bits, &mut context, 0, CONTEXT_4);
                            next_lip.push(index);
                        }
                    }
                    if 4 * y + 3 < length {
                        queue.push(LisNode { pos: y, is_type_b: true });
                    }
                    queue.items[i] = None;
                } else {
                    add_bit(&mut bits, &mut context, 0, CONTEXT_3);
                }
            } else {
                let max_d = scratch.max_descendant(node.pos, 1);
                if max_d >= compare {
                    add_bit(&mut bits, &mut context, 1, CONTEXT_5);
                    let y = node.pos;
                    queue.push(LisNode { pos: 2 * y, is_type_b: false });
                    queue.push(LisNode { pos: 2 * y + 1, is_type_b: false });
                    queue.items[i] = None;
                } else {
                    add_bit(&mut bits, &mut context, 0, CONTEXT_5);
                }
            }
            i += 1;
        }
        lis = queue.take_tail();

        for &idx in lsp.iter().take(lsp_index) {
            add_bit(&mut bits, &mut context, bitget(instream[idx].abs(), n + 1), CONTEXT_6);
        }

        lip = next_lip;
        n -= 1;
    }

    SpihtEncodeResult { bits, context }
}

/// Decode a SPIHT stream back into a coefficient vector of length
/// `origlength`, given an arithmetic decoder primed on the matching encoded
/// bytes. Returns `(coefficients, max_alloc_bits, wavmax)`.
pub fn decode(
    decoder: &mut crate::spiht::arithmetic::ArithDecoder<'_>,
    origlength: usize,
    level: i32,
) -> (Vec<i64>, i32, f64) {
    let mut out = vec![0i64; origlength];

    let maxallocbits_bits: Vec<u8> = (0..MAXALLOCBITS_SIZE).map(|_| decoder.decode(CONTEXT_0)).collect();
    let n_real = bi2de(&maxallocbits_bits) as i32;

    let mode = decoder.decode(CONTEXT_0);
    let mut wavmax_bits = vec![mode];
    wavmax_bits.extend((0..WAVMAX_SIZE - 1).map(|_| decoder.decode(CONTEXT_0)));
    let wavmax = decode_wavmax(&wavmax_bits);

    let bandsize = 2usize << (((origlength as f64).log2() as i32) - level);
    let mut lip: Vec<usize> = (0..bandsize).collect();
    let mut lis: Vec<LisNode> = (bandsize / 2..bandsize)
        .map(|pos| LisNode { pos, is_type_b: false })
        .collect();
    let mut lsp: Vec<usize> = Vec::new();

    let mut n = n_real;
    while n >= 0 {
        let compare = 1i64 << n;
        let lsp_index = lsp.len();

        let mut next_lip = Vec::new();
        for &idx in &lip {
            if decoder.decode(CONTEXT_2) == 1 {
                out[idx] = if decoder.decode(CONTEXT_1) == 1 { compare } else { -compare };
                lsp.push(idx);
            } else {
                next_lip.push(idx);
            }
        }

        let mut queue = GrowableList::new(lis);
        let mut i = 0;
        while i < queue.items.len() {
            let node = queue.items[i].unwrap();
            if !node.is_type_b {
                if decoder.decode(CONTEXT_3) == 1 {
                    let y = node.pos;
                    for index in [2 * y, 2 * y + 1] {
                        if decoder.decode(CONTEXT_4) == 1 {
                            out[index] = if decoder.decode(CONTEXT_1) == 1 { compare } else { -compare };
                            lsp.push(index);
                        } else {
                            next_lip.push(index);
                        }
                    }
                    if 4 * y + 3 < origlength {
                        queue.push(LisNode { pos: y, is_type_b: true });
                    }
                    queue.items[i] = None;
                }
            } else if decoder.decode(CONTEXT_5) == 1 {
                let y = node.pos;
                queue.push(LisNode { pos: 2 * y, is_type_b: false });
                queue.push(LisNode { pos: 2 * y + 1, is_type_b: false });
                queue.items[i] = None;
            }
            i += 1;
        }
        lis = queue.take_tail();

        for &idx in lsp.iter().take(lsp_index) {
            if decoder.decode(CONTEXT_6) == 1 {
                out[idx] += sgn(out[idx]) * compare;
            }
        }

        lip = next_lip;
        n -= 1;
    }

    (out, n_real, wavmax)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spiht::arithmetic::{ArithDecoder, ArithEncoder};

    #[test]
    fn wavmax_round_trips_below_one() {
        let bits = maximum_wavelet_coefficient(0.375);
        assert!((decode_wavmax(&bits) - 0.375).abs() < 1e-5);
    }

    #[test]
    fn wavmax_round_trips_above_one() {
        let bits = maximum_wavelet_coefficient(1.5);
        assert!((decode_wavmax(&bits) - 1.5).abs() < 1e-4);
    }

    #[test]
    fn encode_then_decode_round_trips_a_sparse_block() {
        let mut block = vec![0i64; 512];
        block[0] = 4;
        block[3] = 3;
        block[300] = 1;
        let level = 7;
        let maxallocbits = 4;
        let wavmax = 1.5;

        let scratch = MaxDescendants::init(&block);
        let bitwavmax = maximum_wavelet_coefficient(wavmax);
        let result = encode(&block, &scratch, level, &bitwavmax, maxallocbits);

        let mut encoder = ArithEncoder::default();
        let encoded_bytes = crate::spiht::arithmetic::convert_to_bytes(
            &encoder.encode(&result.bits, &result.context),
        );

        let decoded_bits = crate::spiht::arithmetic::convert_to_bits(&encoded_bytes);
        let mut decoder = ArithDecoder::new(&decoded_bits);
        let (decoded, n_real, decoded_wavmax) = decode(&mut decoder, block.len(), level);

        assert_eq!(n_real, maxallocbits);
        assert!((decoded_wavmax - wavmax).abs() < 1e-4);
        assert_eq!(decoded, block);
    }
}
