use std::sync::Arc;

use log::trace;
use mapviewer_files::definition::object::ObjectDefinition;
use mapviewer_files::map::locations::LocationType;

use crate::scene::model::{DynamicObject, Model, Renderable};
use crate::scene::occlusion::OcclusionMap;
use crate::scene::{GameObject, Scene, SceneObject};
use crate::util::identity_set::ArcIdentitySet;

pub const FLOOR_DECORATION_PRIORITY: u8 = 1;
pub const WALL_OBJECT_PRIORITY: u8 = 1;
pub const WALL_DECORATION_PRIORITY: u8 = 10;
pub const GAME_OBJECT_PRIORITY: u8 = 1;

const NON_INTERACTIVE: i32 = 0;
const INTERACTIVE: i32 = 1;
/// Ground decorations with this clip type stay in full detail.
const FULL_DETAIL_CLIP_TYPE: i32 = 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContourGround {
    /// The whole model sits on the height of its tile center.
    CenterTile,
    /// Every vertex follows the terrain below it.
    Vertex,
}

impl ContourGround {
    pub fn for_definition(def: &ObjectDefinition) -> Self {
        if def.contoured_ground >= 0 {
            ContourGround::Vertex
        } else {
            ContourGround::CenterTile
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InteractType {
    Object,
}

#[derive(Debug, Clone)]
pub struct SceneModel {
    pub model: Arc<Model>,
    pub low_detail: bool,
    pub scene_height: i32,
    pub scene_x: i32,
    pub scene_y: i32,
    /// Filled in when the model is merged into a render buffer.
    pub height_offset: i32,
    pub plane: u8,
    pub contour_ground: ContourGround,
    pub priority: u8,
    pub interact_type: InteractType,
    pub interact_id: u32,
}

#[derive(Debug, Clone)]
pub struct AnimatedSceneObject<'a> {
    pub animated_object: Arc<DynamicObject>,
    pub scene_object: &'a SceneObject,
    pub scene_x: i32,
    pub scene_y: i32,
    pub height_offset: i32,
    pub plane: u8,
    pub contour_ground: ContourGround,
    pub priority: u8,
    pub interact_type: InteractType,
    pub interact_id: u32,
}

#[derive(Debug, Default)]
pub struct SceneObjects<'a> {
    pub object_models: Vec<SceneModel>,
    pub animated_scene_objects: Vec<AnimatedSceneObject<'a>>,
}

/// Whether a static model may be drawn with reduced detail. Coordinates are truncated to the tile.
pub fn is_low_detail<O: OcclusionMap + ?Sized>(
    kind: LocationType,
    def: &ObjectDefinition,
    local_x: f32,
    local_y: f32,
    plane: usize,
    occlusion_map: &O,
) -> bool {
    if kind == LocationType::GroundDecoration
        && def.int1 == NON_INTERACTIVE
        && def.clip_type != FULL_DETAIL_CLIP_TYPE
        && !def.obstructs_ground
    {
        return true;
    }

    let centrepiece = matches!(
        kind,
        LocationType::Centrepiece | LocationType::CentrepieceDiagonal
    );
    if (centrepiece || kind.is_wall_decoration()) && def.int1 == INTERACTIVE {
        let (x, y) = (local_x.trunc() as i64, local_y.trunc() as i64);
        // left of or below the map, nothing occludes there
        if x < 0 || y < 0 {
            return false;
        }
        return occlusion_map.is_occluded(plane, x as usize, y as usize);
    }

    false
}

#[derive(Debug, Copy, Clone)]
struct TilePosition {
    plane: usize,
    x: usize,
    y: usize,
}

struct Extraction<'a, 'o, O: ?Sized> {
    occlusion_map: &'o O,
    objects: SceneObjects<'a>,
}

impl<'a, O: OcclusionMap + ?Sized> Extraction<'a, '_, O> {
    fn emit(
        &mut self,
        renderable: &Renderable,
        scene_object: &'a SceneObject,
        offset: (i32, i32),
        position: TilePosition,
        priority: u8,
    ) {
        let def = &scene_object.def;
        let scene_x = scene_object.scene_x + offset.0;
        let scene_y = scene_object.scene_y + offset.1;
        let contour_ground = ContourGround::for_definition(def);

        match renderable {
            Renderable::Model(model) => self.objects.object_models.push(SceneModel {
                model: model.clone(),
                low_detail: is_low_detail(
                    scene_object.kind,
                    def,
                    position.x as f32,
                    position.y as f32,
                    position.plane,
                    self.occlusion_map,
                ),
                scene_height: scene_object.scene_height,
                scene_x,
                scene_y,
                height_offset: 0,
                plane: position.plane as u8,
                contour_ground,
                priority,
                interact_type: InteractType::Object,
                interact_id: def.id,
            }),
            Renderable::Animated(animated_object) => self.objects.animated_scene_objects.push(AnimatedSceneObject {
                animated_object: animated_object.clone(),
                scene_object,
                scene_x,
                scene_y,
                height_offset: 0,
                plane: position.plane as u8,
                contour_ground,
                priority,
                interact_type: InteractType::Object,
                interact_id: def.id,
            }),
        }
    }
}

/// Collects everything drawable on the tiles visible at `max_plane`, in plane, x, y order. Game objects spanning
/// several tiles are emitted once, on the first tile that holds them.
pub fn get_scene_objects<'a, O: OcclusionMap + ?Sized>(
    scene: &'a Scene,
    occlusion_map: &O,
    max_plane: u8,
) -> SceneObjects<'a> {
    let mut extraction = Extraction {
        occlusion_map,
        objects: SceneObjects::default(),
    };
    let mut emitted_game_objects: ArcIdentitySet<GameObject> = ArcIdentitySet::new();

    for plane in 0..scene.planes {
        for tile_x in 0..scene.size_x {
            for tile_y in 0..scene.size_y {
                let Some(tile) = scene.tile(plane, tile_x, tile_y) else {
                    continue;
                };

                if tile.min_plane > max_plane {
                    continue;
                }

                let position = TilePosition {
                    plane,
                    x: tile_x,
                    y: tile_y,
                };

                if let Some(floor_decoration) = &tile.floor_decoration {
                    extraction.emit(
                        &floor_decoration.renderable,
                        &floor_decoration.object,
                        (0, 0),
                        position,
                        FLOOR_DECORATION_PRIORITY,
                    );
                }

                if let Some(wall) = &tile.wall_object {
                    for renderable in [&wall.renderable0, &wall.renderable1].into_iter().flatten() {
                        extraction.emit(
                            renderable,
                            &wall.object,
                            (0, 0),
                            position,
                            WALL_OBJECT_PRIORITY,
                        );
                    }
                }

                if let Some(decoration) = &tile.wall_decoration {
                    let offset = (decoration.offset_x, decoration.offset_y);
                    for renderable in [&decoration.renderable0, &decoration.renderable1]
                        .into_iter()
                        .flatten()
                    {
                        extraction.emit(
                            renderable,
                            &decoration.object,
                            offset,
                            position,
                            WALL_DECORATION_PRIORITY,
                        );
                    }
                }

                for game_object in &tile.game_objects {
                    if !emitted_game_objects.insert(game_object) {
                        continue;
                    }

                    extraction.emit(
                        &game_object.renderable,
                        &game_object.object,
                        (0, 0),
                        position,
                        GAME_OBJECT_PRIORITY,
                    );
                }
            }
        }
    }

    trace!(
        "Extracted {} static and {} animated objects, {} distinct game objects",
        extraction.objects.object_models.len(),
        extraction.objects.animated_scene_objects.len(),
        emitted_game_objects.len()
    );
    extraction.objects
}
