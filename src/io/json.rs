//! Canonical JSON scene I/O (§4.8). Grounded in `steel-capture::calibration`'s
//! `serde_json` load/save pattern, applied to the `Haptics` scene model
//! instead of a `Calibration`.

use std::path::Path;

use crate::error::{HapticsError, Result};
use crate::scene::Haptics;

pub fn load<P: AsRef<Path>>(path: P) -> Result<Haptics> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| HapticsError::io(format!("failed to read {:?}: {e}", path.as_ref())))?;
    parse(&text)
}

pub fn parse(text: &str) -> Result<Haptics> {
    serde_json::from_str(text).map_err(|e| HapticsError::parse(format!("invalid scene JSON: {e}")))
}

pub fn save<P: AsRef<Path>>(scene: &Haptics, path: P) -> Result<()> {
    let text = to_string(scene)?;
    std::fs::write(path.as_ref(), text).map_err(|e| HapticsError::io(format!("failed to write {:?}: {e}", path.as_ref())))
}

pub fn to_string(scene: &Haptics) -> Result<String> {
    serde_json::to_string_pretty(scene).map_err(|e| HapticsError::internal(format!("scene serialize error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_an_empty_scene_through_json_text() {
        let scene = Haptics::new("1.0", "2024-01-01", "test scene");
        let text = to_string(&scene).unwrap();
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, scene);
    }

    #[test]
    fn round_trips_through_a_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        let scene = Haptics::new("1.0", "2024-01-01", "test scene");
        save(&scene, &path).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, scene);
    }

    #[test]
    fn parse_rejects_malformed_json() {
        assert!(parse("{not json").is_err());
    }
}
