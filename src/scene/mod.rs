//! Typed data model of the coded haptic scene: perceptions → channels →
//! bands → effects → keyframes, with the invariants of spec §3. This module
//! holds data and the bookkeeping operations the reference keeps on the data
//! classes themselves (ordered insertion, overlap checks); the evaluation
//! semantics of §4.1 live in `crate::codec::synthesizer`, which reads these
//! types rather than mutating them.

pub mod avatar;
pub mod band;
pub mod body_part;
pub mod channel;
pub mod effect;
pub mod haptics;
pub mod keyframe;
pub mod perception;
pub mod reference_device;
pub mod sync;

pub use avatar::{Avatar, AvatarType};
pub use band::{Band, BandType, CurveType, EncodingModality, TRANSIENT_DURATION_MS};
pub use body_part::BodyPartTarget;
pub use channel::{Channel, Vector};
pub use effect::{BaseSignal, Effect, EffectType, SemanticFamily, SemanticTag};
pub use haptics::Haptics;
pub use keyframe::Keyframe;
pub use perception::{Perception, PerceptionModality};
pub use reference_device::{ActuatorType, ReferenceDevice};
pub use sync::SyncMarker;
