//! Channel: one actuator-addressable stream of bands. Grounded in `Channel.h`.

use serde::{Deserialize, Serialize};

use super::band::{Band, BandType, CurveType, EncodingModality};
use super::body_part::BodyPartTarget;

/// A signed 3-axis vector (direction, actuator resolution/target), matching
/// `Channel.h`'s int8_t-component `Vector`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vector {
    pub x: i8,
    pub y: i8,
    pub z: i8,
}

impl Vector {
    pub fn new(x: i8, y: i8, z: i8) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: i32,
    pub description: String,
    pub gain: f32,
    pub mixing_weight: f32,
    pub body_part_mask: u32,
    pub reference_device_id: Option<i32>,
    pub frequency_sampling: Option<u32>,
    pub sample_count: Option<u32>,
    pub direction: Option<Vector>,
    pub actuator_resolution: Option<Vector>,
    pub body_part_target: Option<Vec<BodyPartTarget>>,
    pub actuator_target: Option<Vec<Vector>>,
    pub vertices: Vec<i32>,
    bands: Vec<Band>,
}

impl Channel {
    pub fn new(id: i32, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            gain: 1.0,
            mixing_weight: 1.0,
            body_part_mask: 0,
            reference_device_id: None,
            frequency_sampling: None,
            sample_count: None,
            direction: None,
            actuator_resolution: None,
            body_part_target: None,
            actuator_target: None,
            vertices: Vec::new(),
            bands: Vec::new(),
        }
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn bands_mut(&mut self) -> &mut Vec<Band> {
        &mut self.bands
    }

    pub fn band_at(&self, index: usize) -> Option<&Band> {
        self.bands.get(index)
    }

    pub fn replace_band_at(&mut self, index: usize, new_band: Band) -> bool {
        match self.bands.get_mut(index) {
            Some(slot) => {
                *slot = new_band;
                true
            }
            None => false,
        }
    }

    pub fn add_band(&mut self, band: Band) {
        self.bands.push(band);
    }

    /// Appends and returns a new band of the given shape, mirroring
    /// `Channel::generateBand`.
    pub fn generate_band(
        &mut self,
        band_type: BandType,
        curve_type: Option<CurveType>,
        encoding_modality: EncodingModality,
        lower_frequency_limit: i32,
        upper_frequency_limit: i32,
    ) -> &mut Band {
        let mut band = Band::new(band_type, encoding_modality);
        band.curve_type = curve_type;
        band.lower_frequency_limit = lower_frequency_limit;
        band.upper_frequency_limit = upper_frequency_limit;
        self.bands.push(band);
        self.bands.last_mut().expect("just pushed")
    }

    /// Time covered by the channel, derived from its longest band.
    pub fn channel_time_length(&self) -> f64 {
        self.bands
            .iter()
            .map(Band::band_time_length)
            .fold(0.0_f64, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_band_appends_with_requested_shape() {
        let mut channel = Channel::new(0, "test");
        channel.generate_band(
            BandType::Curve,
            Some(CurveType::Linear),
            EncodingModality::Vectorial,
            0,
            72,
        );
        assert_eq!(channel.bands().len(), 1);
        assert_eq!(channel.bands()[0].band_type, BandType::Curve);
        assert_eq!(channel.bands()[0].curve_type, Some(CurveType::Linear));
    }
}
