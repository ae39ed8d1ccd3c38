//! Effect: a timed contribution to a band. Grounded in `Effect.cpp`'s
//! `getEffectTimeLength`/`EvaluateVectorial`/`EvaluateTransient`/`EvaluateWavelet`
//! dispatch (the headers are not in the filtered reference pack, so the enum
//! shapes here follow spec.md's §3 prose directly).

use serde::{Deserialize, Serialize};

use super::band::{BandType, EncodingModality, TRANSIENT_DURATION_MS};
use super::keyframe::Keyframe;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseSignal {
    Sine,
    Square,
    Triangle,
    SawToothUp,
    SawToothDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectType {
    Basis,
    Reference,
    Timeline,
}

/// Two-level semantic tag. Not described in the filtered reference headers;
/// modeled as a closed family plus a free-form detail string, matching
/// spec.md's "optional semantic tag (two-level enum)" at face value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SemanticFamily {
    Other,
    Impact,
    Texture,
    Continuous,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticTag {
    pub family: SemanticFamily,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// Effect identity (`EFFECT_ID`, 16 bits on the wire), distinct from
    /// [`Effect::reference_id`] (a Reference-effect's pointer into the
    /// owning perception's effect library) and from the library's own `u32`
    /// dictionary keys.
    pub id: u16,
    pub position: i32,
    pub phase: f32,
    pub base_signal: BaseSignal,
    pub effect_type: EffectType,
    pub semantic: Option<SemanticTag>,
    pub keyframes: Vec<Keyframe>,
    /// Only meaningful when `effect_type == Reference`: id into the owning
    /// perception's effect library.
    pub reference_id: Option<u32>,
    /// Only meaningful when `effect_type == Timeline`: child effects whose
    /// `position` is relative to this effect's own position.
    pub children: Vec<Effect>,
    /// One SPIHT+arithmetic coded block, present exactly when the owning
    /// band's `encoding_modality` is `Wavelet` (`EFFECT_WAVELET_SIZE` in the
    /// reference field table). A wavelet band's effects list is the ordered
    /// sequence of blocks; `position` is the block's start offset.
    pub wavelet_bytes: Option<Vec<u8>>,
}

impl Effect {
    pub fn new(position: i32, phase: f32, base_signal: BaseSignal, effect_type: EffectType) -> Self {
        Self {
            id: 0,
            position,
            phase,
            base_signal,
            effect_type,
            semantic: None,
            keyframes: Vec::new(),
            reference_id: None,
            children: Vec::new(),
            wavelet_bytes: None,
        }
    }

    /// A wavelet-coded block effect: no keyframes, just the coded payload.
    pub fn wavelet_block(position: i32, bytes: Vec<u8>) -> Self {
        let mut effect = Self::new(position, 0.0, BaseSignal::Sine, EffectType::Basis);
        effect.wavelet_bytes = Some(bytes);
        effect
    }

    pub fn keyframes_size(&self) -> usize {
        self.keyframes.len()
    }

    pub fn keyframe_at(&self, index: usize) -> Option<&Keyframe> {
        self.keyframes.get(index)
    }

    /// Mirrors `Effect::getEffectTimeLength`: duration contributed to the
    /// owning band's timeline, dispatched on the band's type/modality rather
    /// than the effect's own, since a band's encoding choice determines how
    /// its effects are timed.
    pub fn effect_time_length(&self, band_type: BandType, encoding_modality: EncodingModality) -> f64 {
        match band_type {
            BandType::Transient => TRANSIENT_DURATION_MS,
            BandType::Curve => self.last_keyframe_offset(),
            BandType::Wave => match encoding_modality {
                EncodingModality::Vectorial => self.last_keyframe_offset(),
                EncodingModality::Wavelet => 0.0,
            },
            BandType::WaveletWave => 0.0,
        }
    }

    fn last_keyframe_offset(&self) -> f64 {
        self.keyframes
            .iter()
            .filter_map(|k| k.relative_position)
            .last()
            .unwrap_or(0) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_effect_time_length_is_fixed() {
        let effect = Effect::new(0, 0.0, BaseSignal::Sine, EffectType::Basis);
        assert_eq!(
            effect.effect_time_length(BandType::Transient, EncodingModality::Vectorial),
            TRANSIENT_DURATION_MS
        );
    }

    #[test]
    fn curve_effect_time_length_is_last_keyframe_offset() {
        let mut effect = Effect::new(0, 0.0, BaseSignal::Sine, EffectType::Basis);
        effect.keyframes.push(Keyframe::new(Some(10), Some(0.5), None));
        effect.keyframes.push(Keyframe::new(Some(40), Some(-0.2), None));
        assert_eq!(
            effect.effect_time_length(BandType::Curve, EncodingModality::Vectorial),
            40.0
        );
    }
}
