//! Band: a frequency-disjoint layer of a channel, encoded by one method.
//! Grounded in `Band.h`/`Band.cpp`; `EncodingModality` distinguishes the two
//! flavors of `Wave` band (vectorial basis-function synthesis vs. coded
//! wavelet coefficients) the way the reference's `Band::EvaluationSwitch`
//! does.

use serde::{Deserialize, Serialize};

use super::effect::Effect;

/// Duration, in milliseconds, of every transient-band impulse (§4.1).
pub const TRANSIENT_DURATION_MS: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandType {
    Curve,
    Transient,
    Wave,
    WaveletWave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveType {
    Unknown,
    Cubic,
    Linear,
    Akima,
    Bezier,
    Bspline,
}

/// How a `Wave`/`WaveletWave` band's effects are evaluated: directly from
/// keyframe-defined basis functions, or by decoding stored wavelet blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncodingModality {
    Vectorial,
    Wavelet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub band_type: BandType,
    pub curve_type: Option<CurveType>,
    pub encoding_modality: EncodingModality,
    /// Block length in samples, only meaningful for wavelet bands.
    pub window_length: Option<u32>,
    pub lower_frequency_limit: i32,
    pub upper_frequency_limit: i32,
    pub priority: Option<u8>,
    effects: Vec<Effect>,
}

impl Band {
    pub fn new(band_type: BandType, encoding_modality: EncodingModality) -> Self {
        Self {
            band_type,
            curve_type: None,
            encoding_modality,
            window_length: None,
            lower_frequency_limit: 0,
            upper_frequency_limit: 0,
            priority: None,
            effects: Vec::new(),
        }
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut Vec<Effect> {
        &mut self.effects
    }

    pub fn effect_at(&self, index: usize) -> Option<&Effect> {
        self.effects.get(index)
    }

    pub fn replace_effect_at(&mut self, index: usize, new_effect: Effect) -> bool {
        match self.effects.get_mut(index) {
            Some(slot) => {
                *slot = new_effect;
                true
            }
            None => false,
        }
    }

    /// Insert keeping non-decreasing position order, mirroring
    /// `Band::addEffect`'s `find_if`-based insertion point.
    pub fn add_effect(&mut self, new_effect: Effect) {
        let insert_at = self
            .effects
            .iter()
            .position(|e| e.position > new_effect.position)
            .unwrap_or(self.effects.len());
        self.effects.insert(insert_at, new_effect);
    }

    pub fn is_overlapping(&self, effect: &Effect, start: f64, stop: f64) -> bool {
        let position = effect.position as f64;
        let length = effect.effect_time_length(self.band_type, self.encoding_modality);
        (position <= start && position + length >= start)
            || (position <= stop && position + length >= stop)
            || (position >= start && position + length <= stop)
            || (position <= start && position + length >= stop)
    }

    /// Total duration covered by this band's effects, mirroring
    /// `Band::getBandTimeLength`.
    pub fn band_time_length(&self) -> f64 {
        match self.effects.last() {
            None => 0.0,
            Some(last) => {
                last.position as f64 + last.effect_time_length(self.band_type, self.encoding_modality)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::effect::{BaseSignal, EffectType};

    fn effect_at(position: i32) -> Effect {
        Effect::new(position, 0.0, BaseSignal::Sine, EffectType::Basis)
    }

    #[test]
    fn add_effect_keeps_non_decreasing_position_order() {
        let mut band = Band::new(BandType::Transient, EncodingModality::Vectorial);
        band.add_effect(effect_at(20));
        band.add_effect(effect_at(5));
        band.add_effect(effect_at(10));
        let positions: Vec<i32> = band.effects().iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![5, 10, 20]);
    }

    #[test]
    fn band_time_length_is_zero_with_no_effects() {
        let band = Band::new(BandType::Curve, EncodingModality::Vectorial);
        assert_eq!(band.band_time_length(), 0.0);
    }
}
