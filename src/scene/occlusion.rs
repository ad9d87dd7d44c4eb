use mapviewer_files::map::terrain::Terrain;
use mapviewer_files::map::{PLANES, REGION_SIZE};

pub trait OcclusionMap {
    fn is_occluded(&self, plane: usize, x: usize, y: usize) -> bool;
}

/// One bit per tile and plane. Out of bounds tiles are never occluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridOcclusionMap {
    planes: usize,
    size_x: usize,
    size_y: usize,
    bits: Vec<u64>,
}

impl GridOcclusionMap {
    pub fn new(planes: usize, size_x: usize, size_y: usize) -> Self {
        let tiles = planes * size_x * size_y;
        Self {
            planes,
            size_x,
            size_y,
            bits: vec![0; tiles.div_ceil(64)],
        }
    }

    /// A tile is hidden as soon as any plane above it carries a floor at the same position.
    pub fn from_terrain(terrain: &Terrain) -> Self {
        let mut map = Self::new(PLANES, REGION_SIZE, REGION_SIZE);
        for x in 0..REGION_SIZE {
            for y in 0..REGION_SIZE {
                let mut covered = false;
                for plane in (0..PLANES).rev() {
                    map.set_occluded(plane, x, y, covered);
                    covered |= terrain
                        .tile(plane, x, y)
                        .is_some_and(|tile| tile.has_floor());
                }
            }
        }
        map
    }

    fn bit(&self, plane: usize, x: usize, y: usize) -> Option<usize> {
        if plane >= self.planes || x >= self.size_x || y >= self.size_y {
            return None;
        }
        Some((plane * self.size_x + x) * self.size_y + y)
    }

    pub fn set_occluded(&mut self, plane: usize, x: usize, y: usize, occluded: bool) {
        let Some(bit) = self.bit(plane, x, y) else {
            return;
        };

        let mask = 1u64 << (bit % 64);
        if occluded {
            self.bits[bit / 64] |= mask;
        } else {
            self.bits[bit / 64] &= !mask;
        }
    }

    pub fn occluded_count(&self) -> usize {
        self.bits.iter().map(|word| word.count_ones() as usize).sum()
    }
}

impl OcclusionMap for GridOcclusionMap {
    fn is_occluded(&self, plane: usize, x: usize, y: usize) -> bool {
        self.bit(plane, x, y)
            .is_some_and(|bit| self.bits[bit / 64] & (1u64 << (bit % 64)) != 0)
    }
}

#[cfg(test)]
mod tests {
    use mapviewer_files::map::terrain::Terrain;

    use crate::scene::occlusion::{GridOcclusionMap, OcclusionMap};

    #[test]
    fn floors_above_occlude_everything_below() {
        let mut terrain = Terrain::empty();
        if let Some(tile) = terrain.tile_mut(2, 5, 7) {
            tile.underlay_id = 3;
        }
        if let Some(tile) = terrain.tile_mut(0, 9, 9) {
            tile.overlay_id = 1;
        }

        let map = GridOcclusionMap::from_terrain(&terrain);
        assert!(map.is_occluded(0, 5, 7));
        assert!(map.is_occluded(1, 5, 7));
        assert!(!map.is_occluded(2, 5, 7));
        assert!(!map.is_occluded(3, 5, 7));
        assert!(!map.is_occluded(0, 9, 9));
        assert_eq!(map.occluded_count(), 2);
    }

    #[test]
    fn out_of_bounds_is_visible() {
        let mut map = GridOcclusionMap::new(1, 2, 2);
        map.set_occluded(0, 1, 1, true);
        map.set_occluded(0, 5, 5, true);
        assert!(map.is_occluded(0, 1, 1));
        assert!(!map.is_occluded(0, 5, 5));
        assert!(!map.is_occluded(3, 1, 1));

        map.set_occluded(0, 1, 1, false);
        assert_eq!(map.occluded_count(), 0);
    }
}
