//! Binary scene (de)serialization (§4.7), grounded in the packet/unit field
//! widths of `IOBinaryFields.h`: a 72-bit unit header (6-bit type + 2-bit
//! sync + 4-bit layer + 24-bit duration + 32-bit length + 4-bit reserved)
//! followed by MIHS packets, each with the literal 24-bit packet header
//! (6-bit type + 17-bit payload-length-in-bits + 1-bit reserved).
//!
//! `IOBinaryFields.h` names on the order of 80 more field widths for
//! avatar/perception/channel/band/effect/keyframe/reference-device entities,
//! each nested inside its own packet in the real format — but no matching
//! `IOBinary.cpp` encoder/decoder survived the filtering that produced this
//! reference pack, only call sites in test files. Rebuilding ~80 packet
//! types without the code that frames them would be inventing a format, not
//! learning one. This module instead frames exactly four top-level packets
//! (scene header, avatar list, perception list, sync marker list) and
//! serializes every nested entity (channels, bands, effects, keyframes...)
//! inline inside its parent's payload via count-prefixes. Every field named
//! in `IOBinaryFields.h` that this module touches is written at its declared
//! width (`EFFECT_POSITION` = 25 bits, `EFFECT_PHASE`/`KEYFRAME_FREQUENCY` =
//! 16 bits, `EFFECT_ID` = 16 bits, `EFFECT_BASE_SIGNAL`/`REFDEV_TYPE` = 4
//! bits, `KEYFRAME_AMPLITUDE` = 8 bits, `REFDEV_OPT_FIELDS` = 12 bits); a
//! handful of fields with no declared constant, or whose width this module
//! doesn't otherwise need to touch, still use a generic 32-bit slot. This
//! satisfies spec.md §8's testable property ("`decode(encode(scene)) ==
//! scene` structurally") without claiming byte-for-byte compatibility with
//! any real MIHS encoder. See DESIGN.md.
//!
//! `writeFloatNBits`/`readFloatNBits` are referenced by
//! `IOBinaryPrimitives.test.cpp` but neither their implementation nor their
//! `MAX_FLOAT` constant exist anywhere in the filtered pack. `MAX_FLOAT` is
//! reconstructed here as `100_000.0`, comfortably covering every amplitude/
//! frequency/gain value this codec produces while keeping the 32-bit linear
//! quantization error far under spec.md §8's `1e-3` tolerance. Fields with a
//! narrower declared width use [`write_quantized`]/[`read_quantized`]
//! instead, scaled to a range appropriate to that field rather than
//! `MAX_FLOAT`.
//!
//! spec.md §4.1's "unknown enum discriminant → default contribution, logged
//! once" clause only has teeth where a field's declared bit width actually
//! admits a discriminant beyond its known variants. `BandType`,
//! `EncodingModality`, `AvatarType` and `SemanticFamily` are all read from
//! bit widths that exactly cover their variant count — there is no
//! unrecognized-discriminant case to degrade, so their decoders keep a hard
//! `Err` (dead code paths for impossible states aren't worth carrying).
//! `CurveType`, `BaseSignal`, `EffectType`, `PerceptionModality` and
//! `ActuatorType` are all genuinely loose at their declared width; their
//! decoders log a [`log::warn!`] and substitute a documented default variant
//! instead of aborting the whole decode, which is the behavior this clause
//! actually asks for.

use crate::error::{HapticsError, Result};
use crate::io::bitstream::{BitReader, BitWriter};
use crate::scene::{
    ActuatorType, Avatar, AvatarType, BandType as SceneBandType, BaseSignal, BodyPartTarget, Channel, CurveType,
    EffectType, EncodingModality, Haptics, Perception, PerceptionModality, ReferenceDevice, SemanticFamily,
    SyncMarker, Vector,
};
use crate::scene::{Band, Effect, Keyframe, SemanticTag};
use log::warn;

const MAX_FLOAT: f32 = 100_000.0;

const PACKET_TYPE_BITS: u32 = 6;
const PACKET_LENGTH_BITS: u32 = 17;
const PACKET_RESERVED_BITS: u32 = 1;

// Declared widths (`IOBinaryFields.h`) for fields narrower than the generic
// 32-bit slot.
const EFFECT_ID_BITS: u32 = 16;
const EFFECT_POSITION_BITS: u32 = 25;
const EFFECT_PHASE_BITS: u32 = 16;
const EFFECT_BASE_SIGNAL_BITS: u32 = 4;
const REFDEV_TYPE_BITS: u32 = 4;
const REFDEV_OPT_FIELDS_BITS: u32 = 12;
const KEYFRAME_POSITION_BITS: u32 = 16;
const KEYFRAME_AMPLITUDE_BITS: u32 = 8;
const KEYFRAME_FREQUENCY_BITS: u32 = 16;

const PACKET_SCENE_HEADER: u64 = 0;
const PACKET_AVATAR_LIST: u64 = 1;
const PACKET_PERCEPTION_LIST: u64 = 2;
const PACKET_SYNC_MARKER_LIST: u64 = 3;

/// Serializes a whole scene into one unit (72-bit header + 4 packets).
pub fn encode_scene(scene: &Haptics) -> Vec<u8> {
    let packets = [
        encode_packet(PACKET_SCENE_HEADER, |w| write_scene_header(w, scene)),
        encode_packet(PACKET_AVATAR_LIST, |w| write_avatar_list(w, &scene.avatars)),
        encode_packet(PACKET_PERCEPTION_LIST, |w| write_perception_list(w, &scene.perceptions)),
        encode_packet(PACKET_SYNC_MARKER_LIST, |w| write_sync_marker_list(w, &scene.sync_markers)),
    ];
    let body: Vec<u8> = packets.into_iter().flatten().collect();

    let mut unit = BitWriter::new();
    unit.write_bits(0, 6); // unit type: always "scene" in this reduced format
    unit.write_bits(0b01, 2); // sync pattern
    unit.write_bits(0, 4); // layer
    unit.write_bits(0, 24); // duration: not tracked at the unit level here
    unit.write_bits((body.len() * 8) as u64, 32); // length, in bits
    unit.write_bits(0, 4); // reserved
    let mut out = unit.finish();
    out.extend(body);
    out
}

/// Inverse of [`encode_scene`].
pub fn decode_scene(bytes: &[u8]) -> Result<Haptics> {
    let mut r = BitReader::new(bytes);
    let _unit_type = r.read_bits(6)?;
    let _sync = r.read_bits(2)?;
    let _layer = r.read_bits(4)?;
    let _duration = r.read_bits(24)?;
    let _length_bits = r.read_bits(32)?;
    let _reserved = r.read_bits(4)?;

    let mut scene = Haptics::default();
    let (ty, bytes) = read_packet_header(&mut r)?;
    expect_packet(ty, PACKET_SCENE_HEADER)?;
    read_scene_header(&mut BitReader::new(&bytes), &mut scene)?;

    let (ty, bytes) = read_packet_header(&mut r)?;
    expect_packet(ty, PACKET_AVATAR_LIST)?;
    scene.avatars = read_avatar_list(&mut BitReader::new(&bytes))?;

    let (ty, bytes) = read_packet_header(&mut r)?;
    expect_packet(ty, PACKET_PERCEPTION_LIST)?;
    scene.perceptions = read_perception_list(&mut BitReader::new(&bytes))?;

    let (ty, bytes) = read_packet_header(&mut r)?;
    expect_packet(ty, PACKET_SYNC_MARKER_LIST)?;
    scene.sync_markers = read_sync_marker_list(&mut BitReader::new(&bytes))?;

    Ok(scene)
}

fn expect_packet(found: u64, expected: u64) -> Result<()> {
    if found != expected {
        return Err(HapticsError::parse(format!("expected packet type {expected}, found {found}")));
    }
    Ok(())
}

fn encode_packet(packet_type: u64, write_payload: impl FnOnce(&mut BitWriter)) -> Vec<u8> {
    let mut payload_writer = BitWriter::new();
    write_payload(&mut payload_writer);
    let payload_bits = payload_writer.bit_len() as u64;
    let payload = payload_writer.finish();

    let mut header = BitWriter::new();
    header.write_bits(packet_type, PACKET_TYPE_BITS);
    header.write_bits(payload_bits, PACKET_LENGTH_BITS);
    header.write_bits(0, PACKET_RESERVED_BITS);
    let mut out = header.finish();
    out.extend(payload);
    out
}

/// Reads the 24-bit packet header and hands back the packet's payload bytes
/// (byte-aligned, so it may include up to 7 trailing padding bits the
/// caller's struct-driven reads never touch).
fn read_packet_header(r: &mut BitReader) -> Result<(u64, Vec<u8>)> {
    let packet_type = r.read_bits(PACKET_TYPE_BITS)?;
    let payload_bits = r.read_bits(PACKET_LENGTH_BITS)?;
    let _reserved = r.read_bits(PACKET_RESERVED_BITS)?;
    let payload_bytes = ((payload_bits + 7) / 8) as usize;
    let mut bytes = Vec::with_capacity(payload_bytes);
    for _ in 0..payload_bytes {
        bytes.push(r.read_bits(8)? as u8);
    }
    Ok((packet_type, bytes))
}

// --- primitives -------------------------------------------------------

fn write_string(w: &mut BitWriter, s: &str) {
    let bytes = s.as_bytes();
    w.write_bits(bytes.len() as u64, 32);
    for &b in bytes {
        w.write_bits(b as u64, 8);
    }
}

fn read_string(r: &mut BitReader) -> Result<String> {
    let len = r.read_bits(32)? as usize;
    let mut bytes = Vec::with_capacity(len);
    for _ in 0..len {
        bytes.push(r.read_bits(8)? as u8);
    }
    String::from_utf8(bytes).map_err(|e| HapticsError::parse(format!("invalid utf8 string: {e}")))
}

fn write_f32(w: &mut BitWriter, value: f32) {
    let clamped = value.clamp(-MAX_FLOAT, MAX_FLOAT);
    let normalized = (clamped + MAX_FLOAT) / (2.0 * MAX_FLOAT);
    w.write_bits((normalized * u32::MAX as f32) as u64, 32);
}

fn read_f32(r: &mut BitReader) -> Result<f32> {
    let raw = r.read_bits(32)? as u32;
    let normalized = raw as f32 / u32::MAX as f32;
    Ok(normalized * 2.0 * MAX_FLOAT - MAX_FLOAT)
}

/// Linear quantizer for fields whose declared width is narrower than the
/// 32-bit general case above, scaled to `[min, max]` rather than `MAX_FLOAT`
/// so the field's whole code space goes toward its actual range.
fn write_quantized(w: &mut BitWriter, value: f32, bits: u32, min: f32, max: f32) {
    let max_code = (1u64 << bits) - 1;
    let normalized = ((value.clamp(min, max) - min) / (max - min)).clamp(0.0, 1.0);
    w.write_bits((normalized * max_code as f32).round() as u64, bits);
}

fn read_quantized(r: &mut BitReader, bits: u32, min: f32, max: f32) -> Result<f32> {
    let max_code = (1u64 << bits) - 1;
    let raw = r.read_bits(bits)? as f32;
    Ok(min + (raw / max_code as f32) * (max - min))
}

/// Wraps a phase offset (radians) into `(-PI, PI]` before quantization;
/// `effect.phase` only ever appears added into a chirp phase that is itself
/// fed through `sin`/`rem_euclid`, so this preserves its meaning exactly.
fn wrap_phase(value: f32) -> f32 {
    let two_pi = std::f32::consts::TAU;
    (value + std::f32::consts::PI).rem_euclid(two_pi) - std::f32::consts::PI
}

fn write_opt_quantized(w: &mut BitWriter, value: Option<f32>, bits: u32, min: f32, max: f32) {
    w.write_bit(value.is_some() as u8);
    if let Some(v) = value {
        write_quantized(w, v, bits, min, max);
    }
}

fn read_opt_quantized(r: &mut BitReader, bits: u32, min: f32, max: f32) -> Result<Option<f32>> {
    Ok(if r.read_bit()? == 1 { Some(read_quantized(r, bits, min, max)?) } else { None })
}

fn write_opt_signed(w: &mut BitWriter, value: Option<i32>, bits: u32) {
    w.write_bit(value.is_some() as u8);
    if let Some(v) = value {
        w.write_signed(v as i64, bits);
    }
}

fn read_opt_signed(r: &mut BitReader, bits: u32) -> Result<Option<i32>> {
    Ok(if r.read_bit()? == 1 { Some(r.read_signed(bits)? as i32) } else { None })
}

fn write_opt_f32(w: &mut BitWriter, value: Option<f32>) {
    w.write_bit(value.is_some() as u8);
    if let Some(v) = value {
        write_f32(w, v);
    }
}

fn read_opt_f32(r: &mut BitReader) -> Result<Option<f32>> {
    Ok(if r.read_bit()? == 1 { Some(read_f32(r)?) } else { None })
}

fn write_opt_i32(w: &mut BitWriter, value: Option<i32>) {
    w.write_bit(value.is_some() as u8);
    if let Some(v) = value {
        w.write_signed(v as i64, 32);
    }
}

fn read_opt_i32(r: &mut BitReader) -> Result<Option<i32>> {
    Ok(if r.read_bit()? == 1 {
        Some(r.read_signed(32)? as i32)
    } else {
        None
    })
}

fn write_opt_u32(w: &mut BitWriter, value: Option<u32>) {
    w.write_bit(value.is_some() as u8);
    if let Some(v) = value {
        w.write_bits(v as u64, 32);
    }
}

fn read_opt_u32(r: &mut BitReader) -> Result<Option<u32>> {
    Ok(if r.read_bit()? == 1 {
        Some(r.read_bits(32)? as u32)
    } else {
        None
    })
}

fn write_opt_i8(w: &mut BitWriter, value: Option<i8>) {
    w.write_bit(value.is_some() as u8);
    if let Some(v) = value {
        w.write_signed(v as i64, 8);
    }
}

fn read_opt_i8(r: &mut BitReader) -> Result<Option<i8>> {
    Ok(if r.read_bit()? == 1 { Some(r.read_signed(8)? as i8) } else { None })
}

fn write_opt_u8(w: &mut BitWriter, value: Option<u8>) {
    w.write_bit(value.is_some() as u8);
    if let Some(v) = value {
        w.write_bits(v as u64, 8);
    }
}

fn read_opt_u8(r: &mut BitReader) -> Result<Option<u8>> {
    Ok(if r.read_bit()? == 1 { Some(r.read_bits(8)? as u8) } else { None })
}

fn write_vector(w: &mut BitWriter, v: Vector) {
    w.write_signed(v.x as i64, 8);
    w.write_signed(v.y as i64, 8);
    w.write_signed(v.z as i64, 8);
}

fn read_vector(r: &mut BitReader) -> Result<Vector> {
    Ok(Vector::new(
        r.read_signed(8)? as i8,
        r.read_signed(8)? as i8,
        r.read_signed(8)? as i8,
    ))
}

// --- scene header / avatars --------------------------------------------

fn write_scene_header(w: &mut BitWriter, scene: &Haptics) {
    write_string(w, &scene.version);
    write_string(w, &scene.date);
    write_string(w, &scene.description);
    write_opt_u32(w, scene.timescale);
}

fn read_scene_header(r: &mut BitReader, scene: &mut Haptics) -> Result<()> {
    scene.version = read_string(r)?;
    scene.date = read_string(r)?;
    scene.description = read_string(r)?;
    scene.timescale = read_opt_u32(r)?;
    Ok(())
}

fn write_avatar_type(w: &mut BitWriter, avatar_type: &AvatarType) {
    match avatar_type {
        AvatarType::Vibration => w.write_bits(0, 2),
        AvatarType::Pressure => w.write_bits(1, 2),
        AvatarType::Temperature => w.write_bits(2, 2),
        AvatarType::Custom(mesh) => {
            w.write_bits(3, 2);
            write_string(w, mesh);
        }
    }
}

fn read_avatar_type(r: &mut BitReader) -> Result<AvatarType> {
    Ok(match r.read_bits(2)? {
        0 => AvatarType::Vibration,
        1 => AvatarType::Pressure,
        2 => AvatarType::Temperature,
        3 => AvatarType::Custom(read_string(r)?),
        other => return Err(HapticsError::parse(format!("unknown avatar type discriminant {other}"))),
    })
}

fn write_avatar_list(w: &mut BitWriter, avatars: &[Avatar]) {
    w.write_bits(avatars.len() as u64, 32);
    for avatar in avatars {
        w.write_signed(avatar.id as i64, 32);
        w.write_signed(avatar.lod as i64, 32);
        write_avatar_type(w, &avatar.avatar_type);
    }
}

fn read_avatar_list(r: &mut BitReader) -> Result<Vec<Avatar>> {
    let count = r.read_bits(32)? as usize;
    (0..count)
        .map(|_| {
            let id = r.read_signed(32)? as i32;
            let lod = r.read_signed(32)? as i32;
            let avatar_type = read_avatar_type(r)?;
            Ok(Avatar::new(id, lod, avatar_type))
        })
        .collect()
}

// --- perception / reference device / channel ---------------------------

fn write_perception_modality(w: &mut BitWriter, modality: PerceptionModality) {
    use PerceptionModality::*;
    let code = match modality {
        Other => 0,
        Pressure => 1,
        Acceleration => 2,
        Velocity => 3,
        Position => 4,
        Temperature => 5,
        Vibrotactile => 6,
        VibrotactileTexture => 7,
        Stiffness => 8,
        Water => 9,
        Wind => 10,
    };
    w.write_bits(code, 4);
}

fn read_perception_modality(r: &mut BitReader) -> Result<PerceptionModality> {
    use PerceptionModality::*;
    Ok(match r.read_bits(4)? {
        0 => Other,
        1 => Pressure,
        2 => Acceleration,
        3 => Velocity,
        4 => Position,
        5 => Temperature,
        6 => Vibrotactile,
        7 => VibrotactileTexture,
        8 => Stiffness,
        9 => Water,
        10 => Wind,
        other => {
            warn!("unrecognized perception modality discriminant {other}, defaulting to Other");
            Other
        }
    })
}

fn write_actuator_type(w: &mut BitWriter, actuator_type: ActuatorType) {
    use ActuatorType::*;
    let code = match actuator_type {
        Unknown => 0,
        Eccentric => 1,
        Linear => 2,
        Piezoelectric => 3,
        Other => 4,
    };
    w.write_bits(code, REFDEV_TYPE_BITS);
}

fn read_actuator_type(r: &mut BitReader) -> Result<ActuatorType> {
    use ActuatorType::*;
    Ok(match r.read_bits(REFDEV_TYPE_BITS)? {
        0 => Unknown,
        1 => Eccentric,
        2 => Linear,
        3 => Piezoelectric,
        4 => Other,
        other => {
            warn!("unrecognized actuator type discriminant {other}, defaulting to Unknown");
            Unknown
        }
    })
}

/// Bit position, within the 12-bit `REFDEV_OPT_FIELDS` mask, of each of
/// `ReferenceDevice`'s optional fields besides `body_part_mask` (which
/// carries its own leading presence bit, matching `REFDEV_BODY_PART_MASK`
/// being declared as its own field rather than part of this mask), in
/// declaration order.
const REFDEV_MAX_FREQUENCY_BIT: u32 = 0;
const REFDEV_MIN_FREQUENCY_BIT: u32 = 1;
const REFDEV_RES_FREQUENCY_BIT: u32 = 2;
const REFDEV_MAX_AMPLITUDE_BIT: u32 = 3;
const REFDEV_IMPEDANCE_BIT: u32 = 4;
const REFDEV_MAX_VOLTAGE_BIT: u32 = 5;
const REFDEV_MAX_CURRENT_BIT: u32 = 6;
const REFDEV_MAX_DISPLACEMENT_BIT: u32 = 7;
const REFDEV_WEIGHT_BIT: u32 = 8;
const REFDEV_SIZE_BIT: u32 = 9;
const REFDEV_CUSTOM_BIT: u32 = 10;
const REFDEV_ACTUATOR_TYPE_BIT: u32 = 11;

fn write_reference_device(w: &mut BitWriter, device: &ReferenceDevice) {
    w.write_signed(device.id as i64, 32);
    write_string(w, &device.name);
    write_opt_u32(w, device.body_part_mask);

    let mut mask: u64 = 0;
    let present = [
        (REFDEV_MAX_FREQUENCY_BIT, device.maximum_frequency.is_some()),
        (REFDEV_MIN_FREQUENCY_BIT, device.minimum_frequency.is_some()),
        (REFDEV_RES_FREQUENCY_BIT, device.resonance_frequency.is_some()),
        (REFDEV_MAX_AMPLITUDE_BIT, device.maximum_amplitude.is_some()),
        (REFDEV_IMPEDANCE_BIT, device.impedance.is_some()),
        (REFDEV_MAX_VOLTAGE_BIT, device.maximum_voltage.is_some()),
        (REFDEV_MAX_CURRENT_BIT, device.maximum_current.is_some()),
        (REFDEV_MAX_DISPLACEMENT_BIT, device.maximum_displacement.is_some()),
        (REFDEV_WEIGHT_BIT, device.weight.is_some()),
        (REFDEV_SIZE_BIT, device.size.is_some()),
        (REFDEV_CUSTOM_BIT, device.custom.is_some()),
        (REFDEV_ACTUATOR_TYPE_BIT, device.actuator_type.is_some()),
    ];
    for &(bit, is_present) in &present {
        if is_present {
            mask |= 1 << bit;
        }
    }
    w.write_bits(mask, REFDEV_OPT_FIELDS_BITS);

    if let Some(v) = device.maximum_frequency {
        write_f32(w, v);
    }
    if let Some(v) = device.minimum_frequency {
        write_f32(w, v);
    }
    if let Some(v) = device.resonance_frequency {
        write_f32(w, v);
    }
    if let Some(v) = device.maximum_amplitude {
        write_f32(w, v);
    }
    if let Some(v) = device.impedance {
        write_f32(w, v);
    }
    if let Some(v) = device.maximum_voltage {
        write_f32(w, v);
    }
    if let Some(v) = device.maximum_current {
        write_f32(w, v);
    }
    if let Some(v) = device.maximum_displacement {
        write_f32(w, v);
    }
    if let Some(v) = device.weight {
        write_f32(w, v);
    }
    if let Some(v) = device.size {
        write_f32(w, v);
    }
    if let Some(v) = device.custom {
        write_f32(w, v);
    }
    if let Some(actuator_type) = device.actuator_type {
        write_actuator_type(w, actuator_type);
    }
}

fn read_reference_device(r: &mut BitReader) -> Result<ReferenceDevice> {
    let id = r.read_signed(32)? as i32;
    let name = read_string(r)?;
    let mut device = ReferenceDevice::new(id, name);
    device.body_part_mask = read_opt_u32(r)?;

    let mask = r.read_bits(REFDEV_OPT_FIELDS_BITS)?;
    let has = |bit: u32| mask & (1 << bit) != 0;

    device.maximum_frequency = has(REFDEV_MAX_FREQUENCY_BIT).then(|| read_f32(r)).transpose()?;
    device.minimum_frequency = has(REFDEV_MIN_FREQUENCY_BIT).then(|| read_f32(r)).transpose()?;
    device.resonance_frequency = has(REFDEV_RES_FREQUENCY_BIT).then(|| read_f32(r)).transpose()?;
    device.maximum_amplitude = has(REFDEV_MAX_AMPLITUDE_BIT).then(|| read_f32(r)).transpose()?;
    device.impedance = has(REFDEV_IMPEDANCE_BIT).then(|| read_f32(r)).transpose()?;
    device.maximum_voltage = has(REFDEV_MAX_VOLTAGE_BIT).then(|| read_f32(r)).transpose()?;
    device.maximum_current = has(REFDEV_MAX_CURRENT_BIT).then(|| read_f32(r)).transpose()?;
    device.maximum_displacement = has(REFDEV_MAX_DISPLACEMENT_BIT).then(|| read_f32(r)).transpose()?;
    device.weight = has(REFDEV_WEIGHT_BIT).then(|| read_f32(r)).transpose()?;
    device.size = has(REFDEV_SIZE_BIT).then(|| read_f32(r)).transpose()?;
    device.custom = has(REFDEV_CUSTOM_BIT).then(|| read_f32(r)).transpose()?;
    device.actuator_type = if has(REFDEV_ACTUATOR_TYPE_BIT) {
        Some(read_actuator_type(r)?)
    } else {
        None
    };

    Ok(device)
}

fn write_body_part_targets(w: &mut BitWriter, targets: &Option<Vec<BodyPartTarget>>) {
    w.write_bit(targets.is_some() as u8);
    if let Some(list) = targets {
        w.write_bits(list.len() as u64, 32);
        for &target in list {
            w.write_bits(target as u64, 8);
        }
    }
}

fn read_body_part_targets(r: &mut BitReader) -> Result<Option<Vec<BodyPartTarget>>> {
    if r.read_bit()? == 0 {
        return Ok(None);
    }
    let count = r.read_bits(32)? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let code = r.read_bits(8)? as u8;
        out.push(BodyPartTarget::from_u8(code).ok_or_else(|| HapticsError::parse(format!("unknown body part code {code}")))?);
    }
    Ok(Some(out))
}

fn write_channel(w: &mut BitWriter, channel: &Channel) {
    w.write_signed(channel.id as i64, 32);
    write_string(w, &channel.description);
    write_f32(w, channel.gain);
    write_f32(w, channel.mixing_weight);
    w.write_bits(channel.body_part_mask as u64, 32);
    write_opt_i32(w, channel.reference_device_id);
    write_opt_u32(w, channel.frequency_sampling);
    write_opt_u32(w, channel.sample_count);

    w.write_bit(channel.direction.is_some() as u8);
    if let Some(v) = channel.direction {
        write_vector(w, v);
    }
    w.write_bit(channel.actuator_resolution.is_some() as u8);
    if let Some(v) = channel.actuator_resolution {
        write_vector(w, v);
    }
    write_body_part_targets(w, &channel.body_part_target);

    w.write_bit(channel.actuator_target.is_some() as u8);
    if let Some(list) = &channel.actuator_target {
        w.write_bits(list.len() as u64, 32);
        for &v in list {
            write_vector(w, v);
        }
    }

    w.write_bits(channel.vertices.len() as u64, 32);
    for &v in &channel.vertices {
        w.write_signed(v as i64, 32);
    }

    w.write_bits(channel.bands().len() as u64, 32);
    for band in channel.bands() {
        write_band(w, band);
    }
}

fn read_channel(r: &mut BitReader) -> Result<Channel> {
    let id = r.read_signed(32)? as i32;
    let description = read_string(r)?;
    let mut channel = Channel::new(id, description);
    channel.gain = read_f32(r)?;
    channel.mixing_weight = read_f32(r)?;
    channel.body_part_mask = r.read_bits(32)? as u32;
    channel.reference_device_id = read_opt_i32(r)?;
    channel.frequency_sampling = read_opt_u32(r)?;
    channel.sample_count = read_opt_u32(r)?;

    channel.direction = if r.read_bit()? == 1 { Some(read_vector(r)?) } else { None };
    channel.actuator_resolution = if r.read_bit()? == 1 { Some(read_vector(r)?) } else { None };
    channel.body_part_target = read_body_part_targets(r)?;

    channel.actuator_target = if r.read_bit()? == 1 {
        let count = r.read_bits(32)? as usize;
        let mut list = Vec::with_capacity(count);
        for _ in 0..count {
            list.push(read_vector(r)?);
        }
        Some(list)
    } else {
        None
    };

    let vertex_count = r.read_bits(32)? as usize;
    for _ in 0..vertex_count {
        channel.vertices.push(r.read_signed(32)? as i32);
    }

    let band_count = r.read_bits(32)? as usize;
    for _ in 0..band_count {
        channel.add_band(read_band(r)?);
    }

    Ok(channel)
}

fn write_band_type(w: &mut BitWriter, band_type: SceneBandType) {
    use SceneBandType::*;
    let code = match band_type {
        Curve => 0,
        Transient => 1,
        Wave => 2,
        WaveletWave => 3,
    };
    w.write_bits(code, 2);
}

fn read_band_type(r: &mut BitReader) -> Result<SceneBandType> {
    use SceneBandType::*;
    Ok(match r.read_bits(2)? {
        0 => Curve,
        1 => Transient,
        2 => Wave,
        3 => WaveletWave,
        other => return Err(HapticsError::parse(format!("unknown band type discriminant {other}"))),
    })
}

fn write_curve_type(w: &mut BitWriter, curve_type: CurveType) {
    use CurveType::*;
    let code = match curve_type {
        Unknown => 0,
        Cubic => 1,
        Linear => 2,
        Akima => 3,
        Bezier => 4,
        Bspline => 5,
    };
    w.write_bits(code, 3);
}

fn read_curve_type(r: &mut BitReader) -> Result<CurveType> {
    use CurveType::*;
    Ok(match r.read_bits(3)? {
        0 => Unknown,
        1 => Cubic,
        2 => Linear,
        3 => Akima,
        4 => Bezier,
        5 => Bspline,
        other => {
            warn!("unrecognized curve type discriminant {other}, defaulting to Unknown");
            Unknown
        }
    })
}

fn write_encoding_modality(w: &mut BitWriter, modality: EncodingModality) {
    w.write_bit(matches!(modality, EncodingModality::Wavelet) as u8);
}

fn read_encoding_modality(r: &mut BitReader) -> Result<EncodingModality> {
    Ok(if r.read_bit()? == 1 {
        EncodingModality::Wavelet
    } else {
        EncodingModality::Vectorial
    })
}

fn write_band(w: &mut BitWriter, band: &Band) {
    write_band_type(w, band.band_type);
    w.write_bit(band.curve_type.is_some() as u8);
    if let Some(curve_type) = band.curve_type {
        write_curve_type(w, curve_type);
    }
    write_encoding_modality(w, band.encoding_modality);
    write_opt_u32(w, band.window_length);
    w.write_signed(band.lower_frequency_limit as i64, 32);
    w.write_signed(band.upper_frequency_limit as i64, 32);
    write_opt_u8(w, band.priority);

    w.write_bits(band.effects().len() as u64, 32);
    for effect in band.effects() {
        write_effect(w, effect);
    }
}

fn read_band(r: &mut BitReader) -> Result<Band> {
    let band_type = read_band_type(r)?;
    let curve_type = if r.read_bit()? == 1 { Some(read_curve_type(r)?) } else { None };
    let encoding_modality = read_encoding_modality(r)?;

    let mut band = Band::new(band_type, encoding_modality);
    band.curve_type = curve_type;
    band.window_length = read_opt_u32(r)?;
    band.lower_frequency_limit = r.read_signed(32)? as i32;
    band.upper_frequency_limit = r.read_signed(32)? as i32;
    band.priority = read_opt_u8(r)?;

    let effect_count = r.read_bits(32)? as usize;
    for _ in 0..effect_count {
        band.add_effect(read_effect(r)?);
    }
    Ok(band)
}

fn write_base_signal(w: &mut BitWriter, base_signal: BaseSignal) {
    use BaseSignal::*;
    let code = match base_signal {
        Sine => 0,
        Square => 1,
        Triangle => 2,
        SawToothUp => 3,
        SawToothDown => 4,
    };
    w.write_bits(code, EFFECT_BASE_SIGNAL_BITS);
}

fn read_base_signal(r: &mut BitReader) -> Result<BaseSignal> {
    use BaseSignal::*;
    Ok(match r.read_bits(EFFECT_BASE_SIGNAL_BITS)? {
        0 => Sine,
        1 => Square,
        2 => Triangle,
        3 => SawToothUp,
        4 => SawToothDown,
        other => {
            warn!("unrecognized base signal discriminant {other}, defaulting to Sine");
            Sine
        }
    })
}

fn write_effect_type(w: &mut BitWriter, effect_type: EffectType) {
    use EffectType::*;
    let code = match effect_type {
        Basis => 0,
        Reference => 1,
        Timeline => 2,
    };
    w.write_bits(code, 2);
}

fn read_effect_type(r: &mut BitReader) -> Result<EffectType> {
    use EffectType::*;
    Ok(match r.read_bits(2)? {
        0 => Basis,
        1 => Reference,
        2 => Timeline,
        other => {
            warn!("unrecognized effect type discriminant {other}, defaulting to Basis");
            Basis
        }
    })
}

fn write_semantic_family(w: &mut BitWriter, family: &SemanticFamily) {
    use SemanticFamily::*;
    let code = match family {
        Other => 0,
        Impact => 1,
        Texture => 2,
        Continuous => 3,
    };
    w.write_bits(code, 2);
}

fn read_semantic_family(r: &mut BitReader) -> Result<SemanticFamily> {
    use SemanticFamily::*;
    Ok(match r.read_bits(2)? {
        0 => Other,
        1 => Impact,
        2 => Texture,
        3 => Continuous,
        other => return Err(HapticsError::parse(format!("unknown semantic family discriminant {other}"))),
    })
}

fn write_keyframe(w: &mut BitWriter, keyframe: &Keyframe) {
    write_opt_signed(w, keyframe.relative_position, KEYFRAME_POSITION_BITS);
    write_opt_quantized(w, keyframe.amplitude_modulation, KEYFRAME_AMPLITUDE_BITS, -1.0, 1.0);
    write_opt_signed(w, keyframe.frequency_modulation, KEYFRAME_FREQUENCY_BITS);
}

fn read_keyframe(r: &mut BitReader) -> Result<Keyframe> {
    Ok(Keyframe::new(
        read_opt_signed(r, KEYFRAME_POSITION_BITS)?,
        read_opt_quantized(r, KEYFRAME_AMPLITUDE_BITS, -1.0, 1.0)?,
        read_opt_signed(r, KEYFRAME_FREQUENCY_BITS)?,
    ))
}

fn write_effect(w: &mut BitWriter, effect: &Effect) {
    w.write_bits(effect.id as u64, EFFECT_ID_BITS);
    w.write_signed(effect.position as i64, EFFECT_POSITION_BITS);
    write_quantized(w, wrap_phase(effect.phase), EFFECT_PHASE_BITS, -std::f32::consts::PI, std::f32::consts::PI);
    write_base_signal(w, effect.base_signal);
    write_effect_type(w, effect.effect_type);

    w.write_bit(effect.semantic.is_some() as u8);
    if let Some(semantic) = &effect.semantic {
        write_semantic_family(w, &semantic.family);
        write_string(w, &semantic.detail);
    }

    w.write_bits(effect.keyframes.len() as u64, 32);
    for keyframe in &effect.keyframes {
        write_keyframe(w, keyframe);
    }

    write_opt_u32(w, effect.reference_id);

    w.write_bits(effect.children.len() as u64, 32);
    for child in &effect.children {
        write_effect(w, child);
    }

    w.write_bit(effect.wavelet_bytes.is_some() as u8);
    if let Some(bytes) = &effect.wavelet_bytes {
        w.write_bits(bytes.len() as u64, 32);
        for &b in bytes {
            w.write_bits(b as u64, 8);
        }
    }
}

fn read_effect(r: &mut BitReader) -> Result<Effect> {
    let id = r.read_bits(EFFECT_ID_BITS)? as u16;
    let position = r.read_signed(EFFECT_POSITION_BITS)? as i32;
    let phase = read_quantized(r, EFFECT_PHASE_BITS, -std::f32::consts::PI, std::f32::consts::PI)?;
    let base_signal = read_base_signal(r)?;
    let effect_type = read_effect_type(r)?;
    let mut effect = Effect::new(position, phase, base_signal, effect_type);
    effect.id = id;

    effect.semantic = if r.read_bit()? == 1 {
        let family = read_semantic_family(r)?;
        let detail = read_string(r)?;
        Some(SemanticTag { family, detail })
    } else {
        None
    };

    let keyframe_count = r.read_bits(32)? as usize;
    for _ in 0..keyframe_count {
        effect.keyframes.push(read_keyframe(r)?);
    }

    effect.reference_id = read_opt_u32(r)?;

    let child_count = r.read_bits(32)? as usize;
    for _ in 0..child_count {
        effect.children.push(read_effect(r)?);
    }

    effect.wavelet_bytes = if r.read_bit()? == 1 {
        let len = r.read_bits(32)? as usize;
        let mut bytes = Vec::with_capacity(len);
        for _ in 0..len {
            bytes.push(r.read_bits(8)? as u8);
        }
        Some(bytes)
    } else {
        None
    };

    Ok(effect)
}

fn write_perception_list(w: &mut BitWriter, perceptions: &[Perception]) {
    w.write_bits(perceptions.len() as u64, 32);
    for perception in perceptions {
        w.write_signed(perception.id as i64, 32);
        w.write_signed(perception.avatar_id as i64, 32);
        write_string(w, &perception.description);
        write_perception_modality(w, perception.modality);
        write_opt_i8(w, perception.unit_exponent);
        write_opt_i8(w, perception.perception_unit_exponent);

        w.write_bits(perception.reference_devices.len() as u64, 32);
        for device in &perception.reference_devices {
            write_reference_device(w, device);
        }

        w.write_bits(perception.channels.len() as u64, 32);
        for channel in &perception.channels {
            write_channel(w, channel);
        }

        w.write_bits(perception.effect_library.len() as u64, 32);
        for (&key, effect) in &perception.effect_library {
            w.write_bits(key as u64, 32);
            write_effect(w, effect);
        }
    }
}

fn read_perception_list(r: &mut BitReader) -> Result<Vec<Perception>> {
    let count = r.read_bits(32)? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let id = r.read_signed(32)? as i32;
        let avatar_id = r.read_signed(32)? as i32;
        let description = read_string(r)?;
        let modality = read_perception_modality(r)?;
        let mut perception = Perception::new(id, avatar_id, description, modality);
        perception.unit_exponent = read_opt_i8(r)?;
        perception.perception_unit_exponent = read_opt_i8(r)?;

        let device_count = r.read_bits(32)? as usize;
        for _ in 0..device_count {
            perception.add_reference_device(read_reference_device(r)?);
        }

        let channel_count = r.read_bits(32)? as usize;
        for _ in 0..channel_count {
            perception.add_channel(read_channel(r)?);
        }

        let effect_count = r.read_bits(32)? as usize;
        for _ in 0..effect_count {
            let key = r.read_bits(32)? as u32;
            perception.effect_library.insert(key, read_effect(r)?);
        }

        out.push(perception);
    }
    Ok(out)
}

fn write_sync_marker_list(w: &mut BitWriter, markers: &[SyncMarker]) {
    w.write_bits(markers.len() as u64, 32);
    for marker in markers {
        w.write_signed(marker.timestamp as i64, 32);
        write_opt_u32(w, marker.timescale);
    }
}

fn read_sync_marker_list(r: &mut BitReader) -> Result<Vec<SyncMarker>> {
    let count = r.read_bits(32)? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let timestamp = r.read_signed(32)? as i32;
        let mut marker = SyncMarker::new(timestamp);
        marker.timescale = read_opt_u32(r)?;
        out.push(marker);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{BandType, Effect as SceneEffect};

    #[test]
    fn float_quantization_round_trips_within_spec_tolerance() {
        let mut w = BitWriter::new();
        write_f32(&mut w, 1.65436789);
        write_f32(&mut w, -6345.365);
        let bytes = w.finish();

        let mut r = BitReader::new(&bytes);
        assert!((read_f32(&mut r).unwrap() - 1.65436789).abs() < 1e-3);
        assert!((read_f32(&mut r).unwrap() - (-6345.365)).abs() < 1e-3);
    }

    #[test]
    fn round_trips_an_empty_scene() {
        let scene = Haptics::new("1.0", "2024-01-01", "empty");
        let bytes = encode_scene(&scene);
        let decoded = decode_scene(&bytes).unwrap();
        assert_eq!(decoded, scene);
    }

    #[test]
    fn round_trips_a_scene_with_a_wavelet_coded_channel() {
        let mut scene = Haptics::new("1.0", "2024-01-01", "wavelet round trip");
        scene.add_avatar(Avatar::new(0, 0, AvatarType::Vibration));

        let mut perception = Perception::new(0, 0, "vibration", PerceptionModality::Vibrotactile);
        let mut channel = Channel::new(0, "channel 0");
        channel.frequency_sampling = Some(8000);

        let mut band = Band::new(BandType::WaveletWave, EncodingModality::Wavelet);
        band.window_length = Some(64);
        band.add_effect(SceneEffect::wavelet_block(0, vec![1, 2, 3, 4]));
        channel.add_band(band);

        perception.add_channel(channel);
        scene.add_perception(perception);
        scene.add_sync_marker(SyncMarker::new(1000));

        let bytes = encode_scene(&scene);
        let decoded = decode_scene(&bytes).unwrap();
        assert_eq!(decoded, scene);
    }

    #[test]
    fn decode_defaults_an_unrepresentable_curve_type_discriminant_to_unknown() {
        let mut w = BitWriter::new();
        w.write_bits(6, 3); // 3 bits can encode 0-7; only 0-5 are declared curve types
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        assert_eq!(read_curve_type(&mut r).unwrap(), CurveType::Unknown);
    }

    #[test]
    fn decode_defaults_an_unrepresentable_base_signal_discriminant_to_sine() {
        let mut w = BitWriter::new();
        w.write_bits(9, 4); // 4 bits can encode 0-15; only 0-4 are declared base signals
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        assert_eq!(read_base_signal(&mut r).unwrap(), BaseSignal::Sine);
    }

    #[test]
    fn effect_round_trips_its_id_and_position_at_their_declared_widths() {
        let mut effect = SceneEffect::new((1 << 20) - 1, 1.5, BaseSignal::Triangle, EffectType::Basis);
        effect.id = 4242;
        effect.keyframes.push(Keyframe::new(Some(12), Some(0.25), Some(440)));

        let mut w = BitWriter::new();
        write_effect(&mut w, &effect);
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        let decoded = read_effect(&mut r).unwrap();

        assert_eq!(decoded.id, 4242);
        assert_eq!(decoded.position, effect.position);
        assert!((decoded.phase - 1.5).abs() < 1e-2);
        assert_eq!(decoded.keyframes[0].relative_position, Some(12));
        assert_eq!(decoded.keyframes[0].frequency_modulation, Some(440));
        assert!((decoded.keyframes[0].amplitude_modulation.unwrap() - 0.25).abs() < 1e-2);
    }

    #[test]
    fn band_type_round_trips_every_declared_variant() {
        for band_type in [BandType::Curve, BandType::Transient, BandType::Wave, BandType::WaveletWave] {
            let mut w = BitWriter::new();
            write_band_type(&mut w, band_type);
            let bytes = w.finish();
            let mut r = BitReader::new(&bytes);
            assert_eq!(read_band_type(&mut r).unwrap(), band_type);
        }
    }
}
