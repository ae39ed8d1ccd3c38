//! Body part target enum, grounded in `BodyPartTarget.h`: discriminants are
//! part of the wire format, not just display labels, so they are fixed here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BodyPartTarget {
    Unknown = 0,
    All = 1,

    Top = 10,
    Down = 11,
    Right = 12,
    Left = 13,
    Front = 14,
    Back = 15,

    Arm = 20,
    Head = 21,
    Chest = 22,
    Waist = 23,
    Leg = 24,

    UpperArm = 30,
    Forearm = 31,
    Hand = 32,
    Crane = 33,
    Neck = 34,
    Thigh = 35,
    Calf = 36,
    Foot = 37,

    Palm = 40,
    Finger = 41,
    Sole = 42,
    Toe = 43,

    Thumb = 50,
    Index = 51,
    Middle = 52,
    Ring = 53,
    Pinky = 54,
    Hallux = 55,
    IndexToe = 56,
    MiddleToe = 57,
    RingToe = 58,
    PinkyToe = 59,

    FirstPhalanx = 60,
    SecondPhalanx = 61,
    ThirdPhalanx = 62,

    Minus = 254,
    Plus = 255,
}

impl BodyPartTarget {
    /// Round-trip through the repr value used on the wire; `None` for an
    /// unassigned code point rather than silently coercing to `Unknown`.
    pub fn from_u8(value: u8) -> Option<Self> {
        use BodyPartTarget::*;
        let variant = match value {
            0 => Unknown,
            1 => All,
            10 => Top,
            11 => Down,
            12 => Right,
            13 => Left,
            14 => Front,
            15 => Back,
            20 => Arm,
            21 => Head,
            22 => Chest,
            23 => Waist,
            24 => Leg,
            30 => UpperArm,
            31 => Forearm,
            32 => Hand,
            33 => Crane,
            34 => Neck,
            35 => Thigh,
            36 => Calf,
            37 => Foot,
            40 => Palm,
            41 => Finger,
            42 => Sole,
            43 => Toe,
            50 => Thumb,
            51 => Index,
            52 => Middle,
            53 => Ring,
            54 => Pinky,
            55 => Hallux,
            56 => IndexToe,
            57 => MiddleToe,
            58 => RingToe,
            59 => PinkyToe,
            60 => FirstPhalanx,
            61 => SecondPhalanx,
            62 => ThirdPhalanx,
            254 => Minus,
            255 => Plus,
            _ => return None,
        };
        Some(variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_declared_code_point() {
        let codes = [
            0u8, 1, 10, 11, 12, 13, 14, 15, 20, 21, 22, 23, 24, 30, 31, 32, 33, 34, 35, 36, 37, 40,
            41, 42, 43, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61, 62, 254, 255,
        ];
        for code in codes {
            let parsed = BodyPartTarget::from_u8(code).expect("declared code point");
            assert_eq!(parsed as u8, code);
        }
    }

    #[test]
    fn rejects_undeclared_code_point() {
        assert!(BodyPartTarget::from_u8(5).is_none());
    }
}
