pub mod locations;
pub mod terrain;


/// Number of height levels in a region.
pub const PLANES: usize = 4;
/// Tiles along one axis of a region.
pub const REGION_SIZE: usize = 64;

pub fn region_id(region_x: u32, region_y: u32) -> u32 {
    (region_x << 8) | region_y
}

pub fn region_coords(region_id: u32) -> (u32, u32) {
    (region_id >> 8, region_id & 0xFF)
}

/// Name of the maps-index group holding the terrain of a region.
pub fn terrain_group_name(region_x: u32, region_y: u32) -> String {
    format!("m{}_{}", region_x, region_y)
}

/// Name of the maps-index group holding the (encrypted) locations of a region.
pub fn locations_group_name(region_x: u32, region_y: u32) -> String {
    format!("l{}_{}", region_x, region_y)
}
