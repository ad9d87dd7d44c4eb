use byteorder::{BigEndian, WriteBytesExt};

use crate::ParserError;
use crate::common::types::Rgb;
use crate::definition::Definition;
use crate::definition::object::{ObjectDefinition, ParamValue};
use crate::definition::overlay::OverlayDefinition;
use crate::definition::varbit::VarbitDefinition;
use crate::map::locations::LocationType;

fn write_string(buf: &mut Vec<u8>, string: &str) {
    buf.extend_from_slice(string.as_bytes());
    buf.push(0);
}

#[test]
fn object_with_typed_models() -> Result<(), anyhow::Error> {
    let mut buf = Vec::new();
    buf.write_u8(1)?;
    buf.write_u8(2)?;
    buf.write_u16::<BigEndian>(1234)?;
    buf.write_u8(10)?;
    buf.write_u16::<BigEndian>(1235)?;
    buf.write_u8(22)?;
    buf.write_u8(2)?;
    write_string(&mut buf, "Oak tree");
    buf.write_u8(14)?;
    buf.write_u8(2)?;
    buf.write_u8(24)?;
    buf.write_u16::<BigEndian>(0xFFFF)?;
    buf.write_u8(30)?;
    write_string(&mut buf, "Chop down");
    buf.write_u8(31)?;
    write_string(&mut buf, "Hidden");
    buf.write_u8(81)?;
    buf.write_u8(2)?;
    buf.write_u8(249)?;
    buf.write_u8(2)?;
    buf.write_u8(0)?;
    buf.write_u24::<BigEndian>(7)?;
    buf.write_i32::<BigEndian>(-5)?;
    buf.write_u8(1)?;
    buf.write_u24::<BigEndian>(8)?;
    write_string(&mut buf, "axe");
    buf.write_u8(0)?;

    let def = ObjectDefinition::decode(1276, &buf)?;
    assert_eq!(def.id, 1276);
    assert_eq!(def.name, "Oak tree");
    assert_eq!(def.model_ids, vec![1234, 1235]);
    assert_eq!(def.models_for_type(LocationType::Centrepiece), vec![1234]);
    assert_eq!(def.models_for_type(LocationType::GroundDecoration), vec![1235]);
    assert!(def.models_for_type(LocationType::WallStraight).is_empty());
    assert_eq!(def.size_x, 2);
    assert_eq!(def.size_y, 1);
    assert_eq!(def.animation_id, -1);
    assert!(!def.is_animated());
    assert_eq!(def.actions[0].as_deref(), Some("Chop down"));
    assert_eq!(def.actions[1], None);
    assert_eq!(def.contoured_ground, 512);
    assert_eq!(def.int1, 1);
    assert_eq!(def.clip_type, 2);
    assert_eq!(def.support_items, 1);
    assert_eq!(def.params.get(&7), Some(&ParamValue::Int(-5)));
    assert_eq!(def.params.get(&8), Some(&ParamValue::Str("axe".to_string())));
    Ok(())
}

#[test]
fn object_defaults_resolve_after_decoding() -> Result<(), anyhow::Error> {
    let mut buf = Vec::new();
    buf.write_u8(1)?;
    buf.write_u8(1)?;
    buf.write_u16::<BigEndian>(99)?;
    buf.write_u8(22)?;
    buf.write_u8(17)?;
    buf.write_u8(73)?;
    buf.write_u8(0)?;

    let def = ObjectDefinition::decode(5, &buf)?;
    assert_eq!(def.int1, 0);
    assert_eq!(def.clip_type, 0);
    assert!(!def.blocks_projectile);
    assert!(def.obstructs_ground);
    assert_eq!(def.support_items, 0);
    assert_eq!(def.contoured_ground, -1);
    Ok(())
}

#[test]
fn interactivity_follows_first_model_type() -> Result<(), anyhow::Error> {
    // wall first, centrepiece second, no actions
    let def = ObjectDefinition::decode(1, &[1, 2, 0, 100, 0, 0, 101, 10, 0])?;
    assert_eq!(def.int1, 0);

    let def = ObjectDefinition::decode(2, &[1, 2, 0, 100, 10, 0, 101, 0, 0])?;
    assert_eq!(def.int1, 1);
    Ok(())
}

#[test]
fn untyped_models_serve_centrepieces_only() -> Result<(), anyhow::Error> {
    let mut buf = Vec::new();
    buf.write_u8(5)?;
    buf.write_u8(1)?;
    buf.write_u16::<BigEndian>(77)?;
    buf.write_u8(0)?;

    let def = ObjectDefinition::decode(2, &buf)?;
    assert_eq!(def.models_for_type(LocationType::Centrepiece), vec![77]);
    assert_eq!(def.models_for_type(LocationType::CentrepieceDiagonal), vec![77]);
    assert!(def.models_for_type(LocationType::WallStraight).is_empty());
    Ok(())
}

#[test]
fn object_transforms_append_default() -> Result<(), anyhow::Error> {
    let mut buf = Vec::new();
    buf.write_u8(92)?;
    buf.write_u16::<BigEndian>(300)?;
    buf.write_u16::<BigEndian>(0xFFFF)?;
    buf.write_u16::<BigEndian>(42)?;
    buf.write_u8(1)?;
    buf.write_u16::<BigEndian>(10)?;
    buf.write_u16::<BigEndian>(0xFFFF)?;
    buf.write_u8(0)?;

    let def = ObjectDefinition::decode(1, &buf)?;
    assert_eq!(def.transform_varbit, 300);
    assert_eq!(def.transform_varp, -1);
    assert_eq!(def.transforms, vec![10, -1, 42]);
    Ok(())
}

#[test]
fn object_rejects_unknown_opcode() {
    let result = ObjectDefinition::decode(1, &[200, 0]);
    assert!(matches!(
        result,
        Err(ParserError::UnknownOpcode {
            opcode: 200,
            kind: "object"
        })
    ));
}

#[test]
fn object_rejects_truncated_record() {
    // opcode 14 without its operand and without the terminator
    let result = ObjectDefinition::decode(1, &[14]);
    assert!(matches!(result, Err(ParserError::IOError(_))));
    assert!(matches!(ObjectDefinition::decode(1, &[]), Err(ParserError::EmptySource)));
}

#[test]
fn overlay_derives_hsl() -> Result<(), anyhow::Error> {
    let mut buf = Vec::new();
    buf.write_u8(1)?;
    buf.write_u24::<BigEndian>(0xFF0000)?;
    buf.write_u8(2)?;
    buf.write_u8(31)?;
    buf.write_u8(5)?;
    buf.write_u8(0)?;

    let def = OverlayDefinition::decode(3, &buf)?;
    assert_eq!(def.primary_rgb, Rgb(0xFF0000));
    assert_eq!(def.texture_id, 31);
    assert!(!def.hide_underlay);
    assert_eq!(def.secondary_rgb, None);
    assert_eq!(def.primary_hsl.hue, 0);
    assert_eq!(def.primary_hsl.saturation, 255);
    assert_eq!(def.primary_hsl.lightness, 127);
    Ok(())
}

#[test]
fn varbit_extracts_its_bits() -> Result<(), anyhow::Error> {
    let def = VarbitDefinition::decode(9, &[1, 0x01, 0x2C, 3, 5, 0])?;
    assert_eq!(def.index, 300);
    assert_eq!(def.mask(), 0b111);
    assert_eq!(def.extract(0b1_0110_1000), 0b101);
    Ok(())
}

#[test]
fn varbit_rejects_inverted_range() {
    assert!(matches!(
        VarbitDefinition::decode(9, &[1, 0, 1, 6, 2, 0]),
        Err(ParserError::FormatError { .. })
    ));
}
