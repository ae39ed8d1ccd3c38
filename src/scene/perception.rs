//! Perception: one modality's worth of channels for a given avatar.
//! Grounded in `Perception.h`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::channel::Channel;
use super::effect::Effect;
use super::reference_device::ReferenceDevice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerceptionModality {
    Other,
    Pressure,
    Acceleration,
    Velocity,
    Position,
    Temperature,
    Vibrotactile,
    VibrotactileTexture,
    Stiffness,
    Water,
    Wind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perception {
    pub id: i32,
    pub avatar_id: i32,
    pub description: String,
    pub modality: PerceptionModality,
    /// Physical unit exponent, default -3 (milli-).
    pub unit_exponent: Option<i8>,
    /// Per-modality exponent, default 0.
    pub perception_unit_exponent: Option<i8>,
    pub reference_devices: Vec<ReferenceDevice>,
    pub channels: Vec<Channel>,
    pub effect_library: HashMap<u32, Effect>,
}

impl Perception {
    pub fn new(id: i32, avatar_id: i32, description: impl Into<String>, modality: PerceptionModality) -> Self {
        Self {
            id,
            avatar_id,
            description: description.into(),
            modality,
            unit_exponent: None,
            perception_unit_exponent: None,
            reference_devices: Vec::new(),
            channels: Vec::new(),
            effect_library: HashMap::new(),
        }
    }

    pub fn unit_exponent_or_default(&self) -> i8 {
        self.unit_exponent.unwrap_or(-3)
    }

    pub fn perception_unit_exponent_or_default(&self) -> i8 {
        self.perception_unit_exponent.unwrap_or(0)
    }

    pub fn add_reference_device(&mut self, device: ReferenceDevice) {
        self.reference_devices.push(device);
    }

    pub fn add_channel(&mut self, channel: Channel) {
        self.channels.push(channel);
    }
}
