use std::io::Cursor;

use byteorder::ReadBytesExt;

use crate::ParserError;
use crate::common::reader::read_u24;
use crate::common::types::{Hsl, Rgb};
use crate::definition::Definition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayDefinition {
    pub id: u32,
    pub primary_rgb: Rgb,
    pub texture_id: i32,
    pub hide_underlay: bool,
    pub secondary_rgb: Option<Rgb>,
    // derived after decoding
    pub primary_hsl: Hsl,
    pub secondary_hsl: Option<Hsl>,
}

impl Definition for OverlayDefinition {
    const KIND: &'static str = "overlay";

    fn decode(id: u32, data: &[u8]) -> Result<Self, ParserError> {
        let mut rdr = Cursor::new(data);
        let mut def = OverlayDefinition {
            id,
            primary_rgb: Rgb(0),
            texture_id: -1,
            hide_underlay: true,
            secondary_rgb: None,
            primary_hsl: Hsl::default(),
            secondary_hsl: None,
        };

        loop {
            match rdr.read_u8()? {
                0 => break,
                1 => def.primary_rgb = Rgb(read_u24(&mut rdr)?),
                2 => def.texture_id = rdr.read_u8()? as i32,
                5 => def.hide_underlay = false,
                7 => def.secondary_rgb = Some(Rgb(read_u24(&mut rdr)?)),
                opcode => {
                    return Err(ParserError::UnknownOpcode {
                        opcode: opcode as u16,
                        kind: Self::KIND,
                    });
                }
            }
        }

        def.primary_hsl = def.primary_rgb.into();
        def.secondary_hsl = def.secondary_rgb.map(Hsl::from);
        Ok(def)
    }
}
