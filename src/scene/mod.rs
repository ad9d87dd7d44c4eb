use std::sync::Arc;

use mapviewer_files::definition::object::ObjectDefinition;
use mapviewer_files::map::locations::LocationType;
use mapviewer_files::map::{PLANES, REGION_SIZE};

pub mod builder;
pub mod model;
pub mod objects;
pub mod occlusion;

pub use model::{BoundsModelProvider, DynamicObject, Model, ModelProvider, Renderable};

/// Fine units per tile, scene coordinates and heights use this resolution.
pub const TILE_SIZE: i32 = 128;

/// Placement data shared by every kind of item on a tile.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub def: Arc<ObjectDefinition>,
    pub kind: LocationType,
    pub rotation: u8,
    /// Center of the item in fine units, relative to the scene origin.
    pub scene_x: i32,
    pub scene_y: i32,
    pub scene_height: i32,
}

#[derive(Debug, Clone)]
pub struct FloorDecoration {
    pub object: SceneObject,
    pub renderable: Renderable,
}

#[derive(Debug, Clone)]
pub struct WallObject {
    pub object: SceneObject,
    pub renderable0: Option<Renderable>,
    /// The second face of corner walls.
    pub renderable1: Option<Renderable>,
}

#[derive(Debug, Clone)]
pub struct WallDecoration {
    pub object: SceneObject,
    pub renderable0: Option<Renderable>,
    pub renderable1: Option<Renderable>,
    pub offset_x: i32,
    pub offset_y: i32,
}

/// Scenery that may span several tiles. Every covered tile holds the same `Arc`.
#[derive(Debug, Clone)]
pub struct GameObject {
    pub object: SceneObject,
    pub renderable: Renderable,
    pub start_x: usize,
    pub start_y: usize,
    pub end_x: usize,
    pub end_y: usize,
}

#[derive(Debug, Clone)]
pub struct Tile {
    pub plane: usize,
    pub x: usize,
    pub y: usize,
    /// Lowest plane cutoff at which this tile is still drawn.
    pub min_plane: u8,
    pub floor_decoration: Option<FloorDecoration>,
    pub wall_object: Option<WallObject>,
    pub wall_decoration: Option<WallDecoration>,
    pub game_objects: Vec<Arc<GameObject>>,
}

impl Tile {
    pub fn new(plane: usize, x: usize, y: usize) -> Self {
        Self {
            plane,
            x,
            y,
            min_plane: plane as u8,
            floor_decoration: None,
            wall_object: None,
            wall_decoration: None,
            game_objects: vec![],
        }
    }
}

/// A `[plane][x][y]` grid of optional tiles.
#[derive(Debug, Clone)]
pub struct Scene {
    pub planes: usize,
    pub size_x: usize,
    pub size_y: usize,
    tiles: Vec<Option<Tile>>,
}

impl Scene {
    pub fn new(planes: usize, size_x: usize, size_y: usize) -> Self {
        Self {
            planes,
            size_x,
            size_y,
            tiles: vec![None; planes * size_x * size_y],
        }
    }

    /// A scene covering exactly one region.
    pub fn for_region() -> Self {
        Self::new(PLANES, REGION_SIZE, REGION_SIZE)
    }

    fn index(&self, plane: usize, x: usize, y: usize) -> Option<usize> {
        if plane >= self.planes || x >= self.size_x || y >= self.size_y {
            return None;
        }
        Some((plane * self.size_x + x) * self.size_y + y)
    }

    pub fn tile(&self, plane: usize, x: usize, y: usize) -> Option<&Tile> {
        self.index(plane, x, y)
            .and_then(|index| self.tiles[index].as_ref())
    }

    pub fn tile_mut(&mut self, plane: usize, x: usize, y: usize) -> Option<&mut Tile> {
        self.index(plane, x, y)
            .and_then(|index| self.tiles[index].as_mut())
    }

    /// Creates the tile if it doesn't exist yet, `None` when out of bounds.
    pub fn ensure_tile(&mut self, plane: usize, x: usize, y: usize) -> Option<&mut Tile> {
        let index = self.index(plane, x, y)?;
        Some(self.tiles[index].get_or_insert_with(|| Tile::new(plane, x, y)))
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().flatten()
    }
}
