use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};

use crate::ParserError;
use crate::definition::Definition;

/// A bit range inside of a player variable (varp).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarbitDefinition {
    pub id: u32,
    pub index: u16,
    pub start_bit: u8,
    pub end_bit: u8,
}

impl VarbitDefinition {
    pub fn mask(&self) -> u32 {
        let width = (self.end_bit.saturating_sub(self.start_bit) as u32 + 1).min(32);
        ((1u64 << width) - 1) as u32
    }

    pub fn extract(&self, varp_value: i32) -> i32 {
        ((varp_value as u32 >> self.start_bit.min(31)) & self.mask()) as i32
    }
}

impl Definition for VarbitDefinition {
    const KIND: &'static str = "varbit";

    fn decode(id: u32, data: &[u8]) -> Result<Self, ParserError> {
        let mut rdr = Cursor::new(data);
        let mut def = VarbitDefinition {
            id,
            index: 0,
            start_bit: 0,
            end_bit: 0,
        };

        loop {
            match rdr.read_u8()? {
                0 => break,
                1 => {
                    def.index = rdr.read_u16::<BigEndian>()?;
                    def.start_bit = rdr.read_u8()?;
                    def.end_bit = rdr.read_u8()?;
                }
                opcode => {
                    return Err(ParserError::UnknownOpcode {
                        opcode: opcode as u16,
                        kind: Self::KIND,
                    });
                }
            }
        }

        if def.end_bit < def.start_bit {
            return Err(ParserError::FormatError {
                reason: "Varbit end bit lies before its start bit",
            });
        }

        Ok(def)
    }
}
