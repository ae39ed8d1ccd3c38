//! Reference device: optional measured/rated characteristics of the
//! actuator a channel is authored against. Grounded in `ReferenceDevice.h`;
//! every field but `id`/`name` is optional there, which this mirrors with
//! `Option`. `ActuatorType` has no header in the filtered reference pack —
//! see DESIGN.md for how its variants were chosen.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActuatorType {
    Unknown,
    Eccentric,
    Linear,
    Piezoelectric,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDevice {
    pub id: i32,
    pub name: String,
    pub body_part_mask: Option<u32>,
    pub maximum_frequency: Option<f32>,
    pub minimum_frequency: Option<f32>,
    pub resonance_frequency: Option<f32>,
    pub maximum_amplitude: Option<f32>,
    pub impedance: Option<f32>,
    pub maximum_voltage: Option<f32>,
    pub maximum_current: Option<f32>,
    pub maximum_displacement: Option<f32>,
    pub weight: Option<f32>,
    pub size: Option<f32>,
    pub custom: Option<f32>,
    pub actuator_type: Option<ActuatorType>,
}

impl ReferenceDevice {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            body_part_mask: None,
            maximum_frequency: None,
            minimum_frequency: None,
            resonance_frequency: None,
            maximum_amplitude: None,
            impedance: None,
            maximum_voltage: None,
            maximum_current: None,
            maximum_displacement: None,
            weight: None,
            size: None,
            custom: None,
            actuator_type: None,
        }
    }
}
