use std::io::Cursor;

use byteorder::ReadBytesExt;
use num_enum::TryFromPrimitive;

use crate::ParserError;
use crate::common::reader::{read_extended_smart, read_unsigned_smart};
use crate::map::PLANES;

/// The shape a location takes on its tile. The numeric values are part of the cache format.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum LocationType {
    WallStraight = 0,
    WallDiagonalCorner = 1,
    WallCorner = 2,
    WallSquareCorner = 3,
    WallDecorStraightNoOffset = 4,
    WallDecorStraightOffset = 5,
    WallDecorDiagonalOffset = 6,
    WallDecorDiagonalNoOffset = 7,
    WallDecorDiagonalBoth = 8,
    WallDiagonal = 9,
    Centrepiece = 10,
    CentrepieceDiagonal = 11,
    RoofStraight = 12,
    RoofDiagonalWithRoofEdge = 13,
    RoofDiagonal = 14,
    RoofCornerConcave = 15,
    RoofCornerConvex = 16,
    RoofFlat = 17,
    RoofEdgeStraight = 18,
    RoofEdgeDiagonalCorner = 19,
    RoofEdgeCorner = 20,
    RoofEdgeCornerSquare = 21,
    GroundDecoration = 22,
}

impl LocationType {
    pub fn is_wall(&self) -> bool {
        (*self as u8) <= LocationType::WallSquareCorner as u8
    }

    pub fn is_wall_decoration(&self) -> bool {
        (LocationType::WallDecorStraightNoOffset as u8..=LocationType::WallDecorDiagonalBoth as u8)
            .contains(&(*self as u8))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LocationSpawn {
    pub id: u32,
    pub plane: u8,
    pub x: u8,
    pub y: u8,
    pub kind: LocationType,
    pub rotation: u8,
}

pub struct LocationReader {}

impl LocationReader {
    /// Parses an already decrypted location record.
    pub fn parse_locations(data: &[u8]) -> Result<Vec<LocationSpawn>, ParserError> {
        let mut rdr = Cursor::new(data);
        let mut spawns = Vec::new();
        let mut id: i64 = -1;

        loop {
            let id_delta = read_extended_smart(&mut rdr)?;
            if id_delta == 0 {
                break;
            }
            id += id_delta as i64;

            let mut position: u32 = 0;
            loop {
                let position_delta = read_unsigned_smart(&mut rdr)?;
                if position_delta == 0 {
                    break;
                }
                position += position_delta as u32 - 1;

                let plane = (position >> 12) as u8;
                if plane as usize >= PLANES {
                    return Err(ParserError::FormatError {
                        reason: "Location plane out of range",
                    });
                }

                let attributes = rdr.read_u8()?;
                let kind = LocationType::try_from(attributes >> 2).map_err(|_| ParserError::FormatError {
                    reason: "Unknown location type",
                })?;

                spawns.push(LocationSpawn {
                    id: id as u32,
                    plane,
                    x: ((position >> 6) & 0x3F) as u8,
                    y: (position & 0x3F) as u8,
                    kind,
                    rotation: attributes & 0x3,
                });
            }
        }

        Ok(spawns)
    }
}
