//! Avatar: the body/device model a perception is expressed against.

use serde::{Deserialize, Serialize};

/// Tagged avatar kind. `Custom` additionally carries an opaque mesh reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "mesh")]
pub enum AvatarType {
    Vibration,
    Pressure,
    Temperature,
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Avatar {
    pub id: i32,
    pub lod: i32,
    pub avatar_type: AvatarType,
}

impl Avatar {
    pub fn new(id: i32, lod: i32, avatar_type: AvatarType) -> Self {
        Self {
            id,
            lod,
            avatar_type,
        }
    }
}
