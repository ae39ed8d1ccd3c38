//! Sync marker: additive timeline metadata, see `Sync.h` in the reference.

use serde::{Deserialize, Serialize};

const DEFAULT_TIMESCALE: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncMarker {
    pub timestamp: i32,
    pub timescale: Option<u32>,
}

impl SyncMarker {
    pub fn new(timestamp: i32) -> Self {
        Self {
            timestamp,
            timescale: None,
        }
    }

    /// Per-marker timescale, falling back to the scene default.
    pub fn timescale_or_default(&self) -> u32 {
        self.timescale.unwrap_or(DEFAULT_TIMESCALE)
    }
}
