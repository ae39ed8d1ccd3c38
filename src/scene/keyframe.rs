//! Keyframe: a (position, amplitude, frequency) sample, each optionally absent.
//! Absence means "inherit from the previous keyframe" (§3, §4.1).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Keyframe {
    pub relative_position: Option<i32>,
    pub amplitude_modulation: Option<f32>,
    pub frequency_modulation: Option<i32>,
}

impl Keyframe {
    pub fn new(
        relative_position: Option<i32>,
        amplitude_modulation: Option<f32>,
        frequency_modulation: Option<i32>,
    ) -> Self {
        Self {
            relative_position,
            amplitude_modulation,
            frequency_modulation,
        }
    }

    /// At least one field must be present; an all-absent keyframe carries no
    /// information and is rejected by importers and the binary/JSON readers.
    pub fn is_empty(&self) -> bool {
        self.relative_position.is_none()
            && self.amplitude_modulation.is_none()
            && self.frequency_modulation.is_none()
    }
}
