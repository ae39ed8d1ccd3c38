//! Encoding/decoding pipeline around the scene model: PCM capture -> scene
//! (`encoder`), scene -> PCM (`synthesizer`), and their shared knobs
//! (`config`).

pub mod config;
pub mod encoder;
pub mod synthesizer;
