use std::sync::Arc;

use log::trace;
use mapviewer_files::map::locations::LocationType;
use mapviewer_files::map::terrain::{Terrain, TileSettings};

use crate::chunk::{ChunkData, ChunkLocation};
use crate::scene::model::ModelProvider;
use crate::scene::{
    FloorDecoration, GameObject, Scene, SceneObject, TILE_SIZE, Tile, WallDecoration, WallObject,
};

/// Unit offsets of a straight wall decoration per rotation, pointing away from the wall.
const STRAIGHT_DECORATION_OFFSETS: [(i32, i32); 4] = [(1, 0), (0, -1), (-1, 0), (0, 1)];
/// Unit offsets of a diagonal wall decoration per rotation.
const DIAGONAL_DECORATION_OFFSETS: [(i32, i32); 4] = [(1, -1), (-1, -1), (-1, 1), (1, 1)];

/// Places decoded chunks into a [`Scene`], asking the provider for every renderable.
pub struct SceneBuilder<'p, P: ModelProvider + ?Sized> {
    provider: &'p P,
}

impl<'p, P: ModelProvider + ?Sized> SceneBuilder<'p, P> {
    pub fn new(provider: &'p P) -> Self {
        Self { provider }
    }

    pub fn build(&self, chunk: &ChunkData) -> Scene {
        let mut scene = Scene::for_region();
        let terrain = &chunk.terrain;

        for plane in 0..scene.planes {
            for x in 0..scene.size_x {
                for y in 0..scene.size_y {
                    if terrain
                        .tile(plane, x, y)
                        .is_some_and(|tile| tile.has_floor())
                    {
                        ensure_tile(&mut scene, terrain, plane, x, y);
                    }
                }
            }
        }

        let mut skipped = 0;
        for location in &chunk.locations {
            if !self.place(&mut scene, terrain, location) {
                skipped += 1;
            }
        }

        trace!(
            "Built scene for region {}_{}, {} of {} locations had nothing to draw",
            chunk.region_x,
            chunk.region_y,
            skipped,
            chunk.locations.len()
        );
        scene
    }

    /// Returns false when the location has nothing to draw or lies outside the scene.
    fn place(&self, scene: &mut Scene, terrain: &Terrain, location: &ChunkLocation) -> bool {
        let spawn = &location.spawn;
        let def = &location.def;
        let plane = spawn.plane as usize;
        let (x, y) = (spawn.x as usize, spawn.y as usize);
        let rotation = spawn.rotation & 3;
        let kind = spawn.kind;

        let (size_x, size_y) = if matches!(
            kind,
            LocationType::Centrepiece | LocationType::CentrepieceDiagonal
        ) {
            if rotation & 1 == 1 {
                (def.size_y as usize, def.size_x as usize)
            } else {
                (def.size_x as usize, def.size_y as usize)
            }
        } else {
            (1, 1)
        };
        let (size_x, size_y) = (size_x.max(1), size_y.max(1));

        let object = SceneObject {
            def: def.clone(),
            kind,
            rotation,
            scene_x: x as i32 * TILE_SIZE + size_x as i32 * TILE_SIZE / 2,
            scene_y: y as i32 * TILE_SIZE + size_y as i32 * TILE_SIZE / 2,
            scene_height: footprint_height(terrain, plane, x, y, size_x, size_y),
        };
        let renderable = |rotation: u8| self.provider.renderable(def, kind, rotation & 3);

        if kind.is_wall() {
            let renderable0 = renderable(rotation);
            let renderable1 = if kind == LocationType::WallCorner {
                renderable(rotation + 1)
            } else {
                None
            };
            if renderable0.is_none() && renderable1.is_none() {
                return false;
            }

            let Some(tile) = ensure_tile(scene, terrain, plane, x, y) else {
                return false;
            };
            tile.wall_object = Some(WallObject {
                object,
                renderable0,
                renderable1,
            });
            return true;
        }

        if kind.is_wall_decoration() {
            let displacement = def.decor_displacement as i32;
            let (renderable0, renderable1, offset) = match kind {
                LocationType::WallDecorStraightOffset => {
                    let (dx, dy) = STRAIGHT_DECORATION_OFFSETS[rotation as usize];
                    (renderable(rotation), None, (dx * displacement, dy * displacement))
                }
                LocationType::WallDecorDiagonalOffset => {
                    let (dx, dy) = DIAGONAL_DECORATION_OFFSETS[rotation as usize];
                    (
                        renderable(rotation),
                        None,
                        (dx * displacement / 2, dy * displacement / 2),
                    )
                }
                LocationType::WallDecorDiagonalNoOffset => (renderable(rotation + 2), None, (0, 0)),
                LocationType::WallDecorDiagonalBoth => {
                    let (dx, dy) = DIAGONAL_DECORATION_OFFSETS[rotation as usize];
                    (
                        renderable(rotation),
                        renderable(rotation + 2),
                        (dx * displacement / 2, dy * displacement / 2),
                    )
                }
                _ => (renderable(rotation), None, (0, 0)),
            };
            if renderable0.is_none() && renderable1.is_none() {
                return false;
            }

            let Some(tile) = ensure_tile(scene, terrain, plane, x, y) else {
                return false;
            };
            tile.wall_decoration = Some(WallDecoration {
                object,
                renderable0,
                renderable1,
                offset_x: offset.0,
                offset_y: offset.1,
            });
            return true;
        }

        let Some(renderable) = renderable(rotation) else {
            return false;
        };

        if kind == LocationType::GroundDecoration {
            let Some(tile) = ensure_tile(scene, terrain, plane, x, y) else {
                return false;
            };
            tile.floor_decoration = Some(FloorDecoration { object, renderable });
            return true;
        }

        let end_x = (x + size_x - 1).min(scene.size_x - 1);
        let end_y = (y + size_y - 1).min(scene.size_y - 1);
        let game_object = Arc::new(GameObject {
            object,
            renderable,
            start_x: x,
            start_y: y,
            end_x,
            end_y,
        });

        let mut placed = false;
        for tile_x in x..=end_x {
            for tile_y in y..=end_y {
                if let Some(tile) = ensure_tile(scene, terrain, plane, tile_x, tile_y) {
                    tile.game_objects.push(game_object.clone());
                    placed = true;
                }
            }
        }
        placed
    }
}

/// Tiles are drawn down to their own plane, tiles flagged to always show and the upper levels of a bridge column
/// one plane lower.
pub fn min_plane(terrain: &Terrain, plane: usize, x: usize, y: usize) -> u8 {
    let settings = terrain
        .tile(plane, x, y)
        .map(|tile| tile.settings)
        .unwrap_or_default();
    if settings.contains(TileSettings::FORCE_LOWEST_PLANE) {
        return 0;
    }

    let bridge = terrain
        .tile(1, x, y)
        .is_some_and(|tile| tile.settings.contains(TileSettings::BRIDGE));
    if bridge && plane > 0 {
        return (plane - 1) as u8;
    }

    plane as u8
}

fn ensure_tile<'s>(scene: &'s mut Scene, terrain: &Terrain, plane: usize, x: usize, y: usize) -> Option<&'s mut Tile> {
    let tile = scene.ensure_tile(plane, x, y)?;
    tile.min_plane = min_plane(terrain, plane, x, y);
    Some(tile)
}

/// Mean height of the four corners spanned by the footprint.
fn footprint_height(terrain: &Terrain, plane: usize, x: usize, y: usize, size_x: usize, size_y: usize) -> i32 {
    (terrain.height(plane, x, y)
        + terrain.height(plane, x + size_x, y)
        + terrain.height(plane, x, y + size_y)
        + terrain.height(plane, x + size_x, y + size_y))
        >> 2
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use itertools::Itertools;
    use mapviewer_files::definition::object::ObjectDefinition;
    use mapviewer_files::map::locations::{LocationSpawn, LocationType};
    use mapviewer_files::map::terrain::{Terrain, TileSettings};

    use crate::chunk::chunk_data_loader::ChunkDataLoader;
    use crate::chunk::chunk_data_loader::fixtures::{store, xteas};
    use crate::chunk::{ChunkData, ChunkLocation};
    use crate::scene::builder::{SceneBuilder, min_plane};
    use crate::scene::model::BoundsModelProvider;
    use crate::scene::objects::{WALL_DECORATION_PRIORITY, get_scene_objects};
    use crate::scene::occlusion::GridOcclusionMap;

    fn typed_definition(id: u32, kind: LocationType) -> Arc<ObjectDefinition> {
        let mut def = ObjectDefinition::new(id);
        def.model_ids = vec![id as u16];
        def.model_types = Some(vec![kind as u8]);
        Arc::new(def)
    }

    fn location(def: &Arc<ObjectDefinition>, plane: u8, x: u8, y: u8, kind: LocationType, rotation: u8) -> ChunkLocation {
        ChunkLocation {
            spawn: LocationSpawn {
                id: def.id,
                plane,
                x,
                y,
                kind,
                rotation,
            },
            def: def.clone(),
        }
    }

    fn chunk(terrain: Terrain, locations: Vec<ChunkLocation>) -> ChunkData {
        ChunkData {
            region_x: 50,
            region_y: 50,
            terrain,
            locations,
            minimize_draw_calls: false,
        }
    }

    #[test]
    fn decoded_region_builds_and_extracts() -> Result<(), anyhow::Error> {
        let loader = ChunkDataLoader::new(Arc::new(store()), xteas());
        let chunk = loader.load(50, 50, false)?.expect("region 50_50 exists");

        let provider = BoundsModelProvider::new();
        let scene = SceneBuilder::new(&provider).build(&chunk);

        assert!(scene.tile(0, 10, 10).is_some_and(|tile| tile.wall_object.is_some()));
        // the 2x2 tree at 3_4 covers four tiles with the same object
        let covered = [(3, 4), (4, 4), (3, 5), (4, 5)]
            .iter()
            .map(|(x, y)| scene.tile(0, *x, *y).map(|tile| tile.game_objects.len()))
            .collect_vec();
        assert_eq!(covered, vec![Some(1); 4]);

        let occlusion = GridOcclusionMap::from_terrain(&chunk.terrain);
        let objects = get_scene_objects(&scene, &occlusion, 3);
        assert_eq!(objects.object_models.len(), 3);
        assert_eq!(objects.object_models[0].scene_height, -16);
        Ok(())
    }

    #[test]
    fn wall_decorations_get_offset_from_displacement() {
        let mut def = (*typed_definition(20, LocationType::WallDecorStraightOffset)).clone();
        def.decor_displacement = 16;
        let def = Arc::new(def);
        let both = typed_definition(21, LocationType::WallDecorDiagonalBoth);

        let chunk = chunk(
            Terrain::empty(),
            vec![
                location(&def, 0, 2, 2, LocationType::WallDecorStraightOffset, 1),
                location(&both, 0, 3, 3, LocationType::WallDecorDiagonalBoth, 0),
            ],
        );
        let provider = BoundsModelProvider::new();
        let scene = SceneBuilder::new(&provider).build(&chunk);

        let straight = scene
            .tile(0, 2, 2)
            .and_then(|tile| tile.wall_decoration.as_ref())
            .expect("decoration placed");
        assert_eq!((straight.offset_x, straight.offset_y), (0, -16));
        assert!(straight.renderable1.is_none());

        let diagonal = scene
            .tile(0, 3, 3)
            .and_then(|tile| tile.wall_decoration.as_ref())
            .expect("decoration placed");
        assert_eq!((diagonal.offset_x, diagonal.offset_y), (8, -8));
        assert!(diagonal.renderable1.is_some());

        let objects = get_scene_objects(&scene, &GridOcclusionMap::new(1, 1, 1), 0);
        assert_eq!(objects.object_models.len(), 3);
        assert!(
            objects
                .object_models
                .iter()
                .all(|model| model.priority == WALL_DECORATION_PRIORITY)
        );
    }

    #[test]
    fn rotated_game_objects_swap_their_footprint() {
        let mut def = (*typed_definition(30, LocationType::Centrepiece)).clone();
        def.size_x = 3;
        def.size_y = 1;
        let def = Arc::new(def);

        let chunk = chunk(
            Terrain::empty(),
            vec![location(&def, 0, 62, 10, LocationType::Centrepiece, 1)],
        );
        let provider = BoundsModelProvider::new();
        let scene = SceneBuilder::new(&provider).build(&chunk);

        let game_object = scene
            .tile(0, 62, 10)
            .and_then(|tile| tile.game_objects.first())
            .expect("object placed");
        assert_eq!(
            (game_object.start_x, game_object.end_x, game_object.start_y, game_object.end_y),
            (62, 62, 10, 12)
        );
        assert_eq!(
            (game_object.object.scene_x, game_object.object.scene_y),
            (62 * 128 + 64, 10 * 128 + 192)
        );
        assert!(scene.tile(0, 62, 12).is_some());
        assert!(scene.tile(0, 63, 10).is_none());
    }

    #[test]
    fn objects_without_models_are_skipped() {
        let def = typed_definition(40, LocationType::GroundDecoration);
        let chunk = chunk(
            Terrain::empty(),
            vec![location(&def, 0, 1, 1, LocationType::WallStraight, 0)],
        );
        let provider = BoundsModelProvider::new();
        let scene = SceneBuilder::new(&provider).build(&chunk);
        assert_eq!(scene.tiles().count(), 0);
    }

    #[test]
    fn bridges_and_forced_tiles_lower_min_plane() {
        let mut terrain = Terrain::empty();
        if let Some(tile) = terrain.tile_mut(1, 4, 4) {
            tile.settings = TileSettings::BRIDGE;
            tile.underlay_id = 1;
        }
        if let Some(tile) = terrain.tile_mut(2, 6, 6) {
            tile.settings = TileSettings::FORCE_LOWEST_PLANE;
        }

        assert_eq!(min_plane(&terrain, 1, 4, 4), 0);
        assert_eq!(min_plane(&terrain, 2, 4, 4), 1);
        assert_eq!(min_plane(&terrain, 0, 4, 4), 0);
        assert_eq!(min_plane(&terrain, 2, 6, 6), 0);
        assert_eq!(min_plane(&terrain, 2, 7, 7), 2);

        let provider = BoundsModelProvider::new();
        let scene = SceneBuilder::new(&provider).build(&chunk(terrain, vec![]));
        assert_eq!(scene.tile(1, 4, 4).map(|tile| tile.min_plane), Some(0));
        assert_eq!(scene.tiles().count(), 1);
    }
}
