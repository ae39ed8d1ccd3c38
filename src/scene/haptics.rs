//! Haptics: the top-level scene container. Grounded in `Haptics.h`. Owns
//! every avatar/perception/channel/band/effect/keyframe reachable from it
//! (§3 "Lifecycle").

use serde::{Deserialize, Serialize};

use super::avatar::Avatar;
use super::perception::Perception;
use super::sync::SyncMarker;

const DEFAULT_TIMESCALE: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Haptics {
    pub version: String,
    pub date: String,
    pub description: String,
    pub timescale: Option<u32>,
    pub avatars: Vec<Avatar>,
    pub perceptions: Vec<Perception>,
    pub sync_markers: Vec<SyncMarker>,
}

impl Haptics {
    pub fn new(version: impl Into<String>, date: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            date: date.into(),
            description: description.into(),
            timescale: None,
            avatars: Vec::new(),
            perceptions: Vec::new(),
            sync_markers: Vec::new(),
        }
    }

    pub fn timescale_or_default(&self) -> u32 {
        self.timescale.unwrap_or(DEFAULT_TIMESCALE)
    }

    pub fn add_avatar(&mut self, avatar: Avatar) {
        self.avatars.push(avatar);
    }

    pub fn avatar_at(&self, index: usize) -> Option<&Avatar> {
        self.avatars.get(index)
    }

    pub fn add_perception(&mut self, perception: Perception) {
        self.perceptions.push(perception);
    }

    pub fn perception_at(&self, index: usize) -> Option<&Perception> {
        self.perceptions.get(index)
    }

    pub fn replace_perception_at(&mut self, index: usize, new_perception: Perception) -> bool {
        match self.perceptions.get_mut(index) {
            Some(slot) => {
                *slot = new_perception;
                true
            }
            None => false,
        }
    }

    pub fn add_sync_marker(&mut self, marker: SyncMarker) {
        self.sync_markers.push(marker);
    }
}

impl Default for Haptics {
    fn default() -> Self {
        Self::new("", "", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timescale_is_one_thousand() {
        let scene = Haptics::default();
        assert_eq!(scene.timescale_or_default(), 1000);
    }

    #[test]
    fn replace_perception_at_rejects_out_of_range_index() {
        let mut scene = Haptics::default();
        let replacement = Perception::new(0, 0, "x", super::super::perception::PerceptionModality::Other);
        assert!(!scene.replace_perception_at(0, replacement));
    }
}
