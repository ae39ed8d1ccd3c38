//! Adaptive binary arithmetic coder, 7 contexts. Grounded bit-for-bit in
//! `Spiht/src/ArithEnc.cpp` and `ArithDec.cpp` (SPEC_FULL.md §4.5): the
//! rescale step literally divides the zero counter by `total * RESIZE_TOTAL`
//! rather than rescaling it proportionally, which the reference relies on to
//! make the model "forgetful" between blocks. This implementation keeps that
//! behavior rather than the more usual proportional rescale.

pub const RANGE_MAX: i64 = 1024;
pub const HALF: i64 = 512;
pub const FIRST_QTR: i64 = 256;
pub const THIRD_QTR: i64 = 768;
pub const CONTEXT_SIZE: usize = 7;
pub const RESET_HALF: i64 = 8;
pub const RESET_TOTAL: i64 = 16;
pub const RESIZE_TOTAL: i64 = 32;

#[derive(Clone, Copy)]
struct Counters {
    zeros: i64,
    total: i64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            zeros: RESET_HALF,
            total: RESET_TOTAL,
        }
    }
}

fn rescale(counters: &mut [Counters; CONTEXT_SIZE]) {
    for c in counters.iter_mut() {
        c.zeros = c.zeros / (c.total * RESIZE_TOTAL);
        if c.zeros == 0 {
            c.zeros = 1;
        }
        c.total = RESIZE_TOTAL;
        if c.zeros == c.total {
            c.zeros = c.total - 1;
        }
    }
}

/// Symbol probability scaled to `RANGE_MAX`, clamped away from the range
/// edges so neither branch of the split can collapse to zero width.
fn scaled_probability(counters: Counters, range_diff: i64) -> i64 {
    let p = ((counters.zeros as f64 / counters.total as f64) * RANGE_MAX as f64).round();
    let mut add = (range_diff as f64 * p) as i64 / RANGE_MAX;
    if add == 0 {
        add = 1;
    } else if add == range_diff {
        add = range_diff - 1;
    }
    add
}

pub struct ArithEncoder {
    counters: [Counters; CONTEXT_SIZE],
}

impl Default for ArithEncoder {
    fn default() -> Self {
        Self {
            counters: [Counters::default(); CONTEXT_SIZE],
        }
    }
}

impl ArithEncoder {
    pub fn reset_counters(&mut self) {
        self.counters = [Counters::default(); CONTEXT_SIZE];
    }

    /// Encode `instream` (each element a 0/1 bit), one context per bit.
    /// Returns the encoded bit sequence with trailing zero bits trimmed.
    pub fn encode(&mut self, instream: &[u8], context: &[usize]) -> Vec<u8> {
        assert_eq!(instream.len(), context.len());

        let mut range_lower: i64 = 0;
        let mut range_upper: i64 = RANGE_MAX;
        let mut bits_to_follow: i64 = 0;
        let mut out: Vec<u8> = Vec::with_capacity(instream.len() * 2);

        for (&symbol, &c) in instream.iter().zip(context.iter()) {
            let range_diff = range_upper - range_lower;
            let add = scaled_probability(self.counters[c], range_diff);

            if symbol == 0 {
                range_upper = range_lower + add;
            } else {
                range_lower += add;
            }

            loop {
                if range_upper <= HALF {
                    push_bit_with_follow(&mut out, 0, &mut bits_to_follow);
                } else if range_lower >= HALF {
                    push_bit_with_follow(&mut out, 1, &mut bits_to_follow);
                    range_lower -= HALF;
                    range_upper -= HALF;
                } else if range_lower >= FIRST_QTR && range_upper <= THIRD_QTR {
                    bits_to_follow += 1;
                    range_lower -= FIRST_QTR;
                    range_upper -= FIRST_QTR;
                } else {
                    break;
                }
                range_lower <<= 1;
                range_upper <<= 1;
            }

            if symbol == 0 {
                self.counters[c].zeros += 1;
            }
            self.counters[c].total += 1;
        }

        remainder(bits_to_follow, &mut out, range_lower, range_upper);
        while out.last() == Some(&0) {
            out.pop();
        }

        rescale(&mut self.counters);
        out
    }
}

fn push_bit_with_follow(out: &mut Vec<u8>, bit: u8, bits_to_follow: &mut i64) {
    out.push(bit);
    for _ in 0..*bits_to_follow {
        out.push(1 - bit);
    }
    *bits_to_follow = 0;
}

fn remainder(bits_to_follow: i64, out: &mut Vec<u8>, range_lower: i64, range_upper: i64) {
    if bits_to_follow > 0 {
        out.push(1);
        return;
    }
    let mut val = HALF;
    let mut lower = range_lower;
    let mut upper = range_upper;
    while lower > 0 {
        if val < upper {
            out.push(1);
            lower -= val;
            upper -= val;
        } else {
            out.push(0);
        }
        val >>= 1;
    }
}

const SHIFT_START: i64 = 9;
const DIGITS: usize = 10;

pub struct ArithDecoder<'a> {
    counters: [Counters; CONTEXT_SIZE],
    instream: &'a [u8],
    in_index: usize,
    range_diff: i64,
    range_lower: i64,
    range_upper: i64,
    in_leading: i64,
}

impl<'a> ArithDecoder<'a> {
    pub fn new(instream: &'a [u8]) -> Self {
        let mut in_leading: i64 = 0;
        let mut shift = SHIFT_START;
        let mut in_index = 0;
        for i in 0..DIGITS {
            if i < instream.len() {
                in_leading += (instream[in_index] as i64) << shift;
                in_index += 1;
                shift -= 1;
            } else {
                break;
            }
        }

        Self {
            counters: [Counters::default(); CONTEXT_SIZE],
            instream,
            in_index,
            range_diff: RANGE_MAX,
            range_lower: 0,
            range_upper: RANGE_MAX,
            in_leading,
        }
    }

    pub fn reset_counters(&mut self) {
        self.counters = [Counters::default(); CONTEXT_SIZE];
    }

    pub fn decode(&mut self, context: usize) -> u8 {
        let compare = scaled_probability(self.counters[context], self.range_diff);
        let value = self.in_leading - self.range_lower;

        let symbol = if value < compare {
            self.range_upper = self.range_lower + compare;
            0
        } else {
            self.range_lower += compare;
            1
        };

        loop {
            if self.range_upper <= HALF {
                self.shift_in(0);
            } else if self.range_lower >= HALF {
                self.range_lower -= HALF;
                self.shift_in(HALF);
            } else if self.range_lower >= FIRST_QTR && self.range_upper <= THIRD_QTR {
                self.range_lower -= FIRST_QTR;
                self.shift_in(FIRST_QTR);
            } else {
                break;
            }
        }

        self.range_diff = self.range_upper - self.range_lower;

        if symbol == 0 {
            self.counters[context].zeros += 1;
        }
        self.counters[context].total += 1;
        symbol
    }

    pub fn finish_block(&mut self) {
        rescale(&mut self.counters);
    }

    /// Shifts `[range_lower, range_upper)` and `in_leading` left by one bit,
    /// first subtracting `offset` from both (and from `in_leading` before
    /// the upper-half/quarter branches).
    fn shift_in(&mut self, offset: i64) {
        if offset != 0 {
            self.range_upper -= offset;
        } else {
            // range_upper already <= HALF; nothing to subtract.
        }
        self.range_upper <<= 1;
        self.range_lower <<= 1;

        let next_bit = if self.in_index < self.instream.len() {
            let bit = self.instream[self.in_index] as i64;
            self.in_index += 1;
            bit
        } else {
            0
        };
        self.in_leading = if offset != 0 {
            ((self.in_leading - offset) << 1) + next_bit
        } else {
            (self.in_leading << 1) + next_bit
        };
    }
}

/// Packs a 0/1 bit sequence into bytes, MSB first, zero-padding the final
/// byte (`ArithEnc::convert2bytes`).
pub fn convert_to_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &b)| acc | ((b & 1) << i))
        })
        .collect()
}

/// Inverse of [`convert_to_bytes`]: unpacks each byte into 8 bits, LSB
/// first, matching `ArithDec::convert2bits`.
pub fn convert_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for i in 0..8 {
            out.push((byte >> i) & 1);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_to_bits_round_trips_through_convert_to_bytes() {
        let bits = vec![1u8, 0, 1, 1, 0, 0, 1, 0, 1, 0, 1];
        let bytes = convert_to_bytes(&bits);
        let mut round_tripped = convert_to_bits(&bytes);
        round_tripped.truncate(bits.len());
        assert_eq!(round_tripped, bits);
    }

    #[test]
    fn encode_then_decode_round_trips_a_bit_sequence_with_constant_context() {
        let bits = vec![0u8, 1, 0, 0, 0, 0, 0, 0, 0, 0];
        let context = vec![0usize; bits.len()];

        let mut encoder = ArithEncoder::default();
        let encoded = encoder.encode(&bits, &context);

        let mut decoder = ArithDecoder::new(&encoded);
        let decoded: Vec<u8> = context.iter().map(|&c| decoder.decode(c)).collect();

        assert_eq!(decoded, bits);
    }

    #[test]
    fn encode_then_decode_round_trips_across_multiple_contexts() {
        let bits = vec![1u8, 1, 0, 1, 0, 0, 1, 1, 0, 1, 1, 0, 0, 0, 1];
        let context: Vec<usize> = (0..bits.len()).map(|i| i % CONTEXT_SIZE).collect();

        let mut encoder = ArithEncoder::default();
        let encoded = encoder.encode(&bits, &context);

        let mut decoder = ArithDecoder::new(&encoded);
        let decoded: Vec<u8> = context.iter().map(|&c| decoder.decode(c)).collect();

        assert_eq!(decoded, bits);
    }
}
