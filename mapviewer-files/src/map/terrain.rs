use std::io::{Cursor, Read};
use std::sync::OnceLock;

use bitflags::bitflags;
use byteorder::{BigEndian, ReadBytesExt};

use crate::ParserError;
use crate::map::{PLANES, REGION_SIZE};

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct TileSettings: u8 {
        const BLOCKED = 0x1;
        /// Set on plane 1: the whole column is shifted down one level (bridges).
        const BRIDGE = 0x2;
        const ROOF = 0x4;
        /// Always drawn, regardless of the plane cutoff.
        const FORCE_LOWEST_PLANE = 0x8;
        const UNDER_ROOF = 0x10;
    }
}

impl Default for TileSettings {
    fn default() -> Self {
        TileSettings::empty()
    }
}

/// Revisions starting at this one store terrain opcodes and overlay ids as u16.
pub const EXTENDED_TERRAIN_REVISION: u32 = 209;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TerrainFormat {
    Legacy,
    Extended,
}

impl TerrainFormat {
    pub fn for_revision(revision: u32) -> Self {
        if revision >= EXTENDED_TERRAIN_REVISION {
            TerrainFormat::Extended
        } else {
            TerrainFormat::Legacy
        }
    }

    fn read_value<R: Read>(&self, rdr: &mut R) -> Result<u16, ParserError> {
        Ok(match self {
            TerrainFormat::Legacy => rdr.read_u8()? as u16,
            TerrainFormat::Extended => rdr.read_u16::<BigEndian>()?,
        })
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TerrainTile {
    pub height: i32,
    pub overlay_id: u16,
    pub overlay_path: u8,
    pub overlay_rotation: u8,
    pub settings: TileSettings,
    pub underlay_id: u16,
}

impl TerrainTile {
    pub fn has_floor(&self) -> bool {
        self.overlay_id != 0 || self.underlay_id != 0
    }
}

/// Decoded terrain of one region, indexed by `[plane][x][y]`.
#[derive(Debug, Clone)]
pub struct Terrain {
    tiles: Vec<TerrainTile>,
}

impl Terrain {
    fn index(plane: usize, x: usize, y: usize) -> usize {
        (plane * REGION_SIZE + x) * REGION_SIZE + y
    }

    pub fn empty() -> Self {
        Self {
            tiles: vec![TerrainTile::default(); PLANES * REGION_SIZE * REGION_SIZE],
        }
    }

    pub fn tile(&self, plane: usize, x: usize, y: usize) -> Option<&TerrainTile> {
        if plane >= PLANES || x >= REGION_SIZE || y >= REGION_SIZE {
            return None;
        }
        self.tiles.get(Self::index(plane, x, y))
    }

    pub fn tile_mut(&mut self, plane: usize, x: usize, y: usize) -> Option<&mut TerrainTile> {
        if plane >= PLANES || x >= REGION_SIZE || y >= REGION_SIZE {
            return None;
        }
        self.tiles.get_mut(Self::index(plane, x, y))
    }

    /// Height at the tile, clamping coordinates to the region so corner lookups stay inside.
    pub fn height(&self, plane: usize, x: usize, y: usize) -> i32 {
        let x = x.min(REGION_SIZE - 1);
        let y = y.min(REGION_SIZE - 1);
        self.tile(plane.min(PLANES - 1), x, y)
            .map(|tile| tile.height)
            .unwrap_or(0)
    }
}

pub struct TerrainReader {}

impl TerrainReader {
    /// `base_x`/`base_y` are the world tile coordinates of the region's south-west corner,
    /// needed to seed the procedural height of tiles without an explicit height.
    pub fn parse_terrain(data: &[u8], base_x: i32, base_y: i32, format: TerrainFormat) -> Result<Terrain, ParserError> {
        if data.is_empty() {
            return Err(ParserError::EmptySource);
        }

        let mut rdr = Cursor::new(data);
        let mut terrain = Terrain::empty();

        for plane in 0..PLANES {
            for x in 0..REGION_SIZE {
                for y in 0..REGION_SIZE {
                    let below = if plane > 0 {
                        terrain.height(plane - 1, x, y)
                    } else {
                        0
                    };

                    let mut tile = TerrainTile::default();
                    loop {
                        let opcode = format.read_value(&mut rdr)?;
                        if opcode == 0 {
                            tile.height = if plane == 0 {
                                -procedural_height(base_x + x as i32 + 932731, base_y + y as i32 + 556238) * 8
                            } else {
                                below - 240
                            };
                            break;
                        }

                        if opcode == 1 {
                            let mut height = rdr.read_u8()? as i32;
                            if height == 1 {
                                height = 0;
                            }
                            tile.height = if plane == 0 {
                                -height * 8
                            } else {
                                below - height * 8
                            };
                            break;
                        }

                        if opcode <= 49 {
                            tile.overlay_id = format.read_value(&mut rdr)?;
                            tile.overlay_path = ((opcode - 2) / 4) as u8;
                            tile.overlay_rotation = ((opcode - 2) & 3) as u8;
                        } else if opcode <= 81 {
                            tile.settings = TileSettings::from_bits_retain((opcode - 49) as u8);
                        } else {
                            tile.underlay_id = opcode - 81;
                        }
                    }

                    if let Some(slot) = terrain.tile_mut(plane, x, y) {
                        *slot = tile;
                    }
                }
            }
        }

        Ok(terrain)
    }
}

fn cosine_table() -> &'static [i32; 2048] {
    static TABLE: OnceLock<[i32; 2048]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0i32; 2048];
        for (i, value) in table.iter_mut().enumerate() {
            *value = (65536.0 * (i as f64 * 0.0030679615).cos()) as i32;
        }
        table
    })
}

fn noise(x: i32, y: i32) -> i32 {
    let mut n = x.wrapping_add(y.wrapping_mul(57));
    n ^= n.wrapping_shl(13);
    let value = n
        .wrapping_mul(n.wrapping_mul(n).wrapping_mul(15731).wrapping_add(789221))
        .wrapping_add(1376312589)
        & i32::MAX;
    (value >> 19) & 0xFF
}

fn smooth_noise(x: i32, y: i32) -> i32 {
    let corners = noise(x - 1, y - 1) + noise(x + 1, y - 1) + noise(x - 1, y + 1) + noise(x + 1, y + 1);
    let sides = noise(x - 1, y) + noise(x + 1, y) + noise(x, y - 1) + noise(x, y + 1);
    let center = noise(x, y);
    center / 4 + sides / 8 + corners / 16
}

fn interpolate(a: i32, b: i32, fraction: i32, scale: i32) -> i32 {
    let f = (65536 - cosine_table()[(fraction * 1024 / scale) as usize]) >> 1;
    ((a * (65536 - f)) >> 16) + ((b * f) >> 16)
}

fn interpolated_noise(x: i32, y: i32, scale: i32) -> i32 {
    let int_x = x / scale;
    let frac_x = x & (scale - 1);
    let int_y = y / scale;
    let frac_y = y & (scale - 1);

    let v1 = smooth_noise(int_x, int_y);
    let v2 = smooth_noise(int_x + 1, int_y);
    let v3 = smooth_noise(int_x, int_y + 1);
    let v4 = smooth_noise(int_x + 1, int_y + 1);

    let i1 = interpolate(v1, v2, frac_x, scale);
    let i2 = interpolate(v3, v4, frac_x, scale);
    interpolate(i1, i2, frac_y, scale)
}

/// Deterministic height (in height units / 8) for plane 0 tiles that don't store one.
pub fn procedural_height(x: i32, y: i32) -> i32 {
    let n = interpolated_noise(x + 45365, y + 91923, 4) - 128
        + ((interpolated_noise(x + 10294, y + 37821, 2) - 128) >> 1)
        + ((interpolated_noise(x, y, 1) - 128) >> 2);
    let n = (n as f64 * 0.3) as i32 + 35;
    n.clamp(10, 60)
}
