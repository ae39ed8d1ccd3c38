//! I/O surfaces around the scene model: the canonical JSON form, the binary
//! MIHS-style bitstream, PCM capture/render, and the OHM device sidecar.

pub mod binary;
pub mod bitstream;
pub mod json;
pub mod ohm;
pub mod pcm;
