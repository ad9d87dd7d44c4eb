use std::sync::Arc;

use glam::IVec3;
use mapviewer_files::definition::object::ObjectDefinition;
use mapviewer_files::map::locations::LocationType;

use crate::scene::TILE_SIZE;

const WALL_HEIGHT: i32 = 2 * TILE_SIZE;
const WALL_THICKNESS: i32 = 16;
const DECORATION_SIZE: i32 = 32;
const FLOOR_DECORATION_HEIGHT: i32 = 8;
/// Unit of the model scale fields of an object definition.
const MODEL_SCALE_UNIT: i32 = 128;

/// Static geometry in fine units, `x` east, `y` up (negative) and `z` north, centered on its tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub vertices: Vec<IVec3>,
    pub triangles: Vec<[u16; 3]>,
}

impl Model {
    pub fn cuboid(min: IVec3, max: IVec3) -> Self {
        let vertices = (0..8)
            .map(|corner| {
                IVec3::new(
                    if corner & 1 == 0 { min.x } else { max.x },
                    if corner & 2 == 0 { min.y } else { max.y },
                    if corner & 4 == 0 { min.z } else { max.z },
                )
            })
            .collect();

        Self {
            vertices,
            triangles: vec![
                [0, 2, 1],
                [1, 2, 3],
                [4, 5, 6],
                [5, 7, 6],
                [0, 1, 4],
                [1, 5, 4],
                [2, 6, 3],
                [3, 6, 7],
                [0, 4, 2],
                [2, 4, 6],
                [1, 3, 5],
                [3, 7, 5],
            ],
        }
    }

    /// Rotates by quarter turns, clockwise when looking down.
    pub fn rotate(&mut self, rotation: u8) {
        for vertex in &mut self.vertices {
            for _ in 0..(rotation & 3) {
                *vertex = IVec3::new(vertex.z, vertex.y, -vertex.x);
            }
        }
    }

    pub fn translate(&mut self, offset: IVec3) {
        for vertex in &mut self.vertices {
            *vertex += offset;
        }
    }

    pub fn bounds(&self) -> Option<(IVec3, IVec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(min, max), vertex| (min.min(*vertex), max.max(*vertex))),
        )
    }
}

/// An object whose geometry changes over time. Resolved to frames by the animation system each tick.
#[derive(Debug, Clone)]
pub struct DynamicObject {
    pub def: Arc<ObjectDefinition>,
    pub kind: LocationType,
    pub rotation: u8,
    pub animation_id: i32,
    pub randomize_start: bool,
}

#[derive(Debug, Clone)]
pub enum Renderable {
    Model(Arc<Model>),
    Animated(Arc<DynamicObject>),
}

/// Turns placed objects into something drawable. `None` when the object has nothing to show for that shape.
pub trait ModelProvider {
    fn renderable(&self, def: &Arc<ObjectDefinition>, kind: LocationType, rotation: u8) -> Option<Renderable>;
}

/// Box geometry derived from the definition's footprint and scale. Allows building scenes without model data.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoundsModelProvider {}

impl BoundsModelProvider {
    pub fn new() -> Self {
        Self {}
    }

    fn scaled(value: i32, scale: u16) -> i32 {
        value * scale as i32 / MODEL_SCALE_UNIT
    }

    fn model_for(def: &ObjectDefinition, kind: LocationType, rotation: u8) -> Model {
        let half = TILE_SIZE / 2;
        let (min, max) = if kind.is_wall() {
            // along the west edge before rotation
            (
                IVec3::new(-half, -WALL_HEIGHT, -half),
                IVec3::new(-half + WALL_THICKNESS, 0, half),
            )
        } else if kind.is_wall_decoration() {
            (
                IVec3::new(-half, -WALL_HEIGHT / 2 - DECORATION_SIZE, -DECORATION_SIZE / 2),
                IVec3::new(-half + WALL_THICKNESS / 2, -WALL_HEIGHT / 2, DECORATION_SIZE / 2),
            )
        } else if kind == LocationType::GroundDecoration {
            (
                IVec3::new(-half, -FLOOR_DECORATION_HEIGHT, -half),
                IVec3::new(half, 0, half),
            )
        } else {
            let half_x = def.size_x as i32 * half;
            let half_y = def.size_y as i32 * half;
            (IVec3::new(-half_x, -TILE_SIZE, -half_y), IVec3::new(half_x, 0, half_y))
        };

        let scale = |vertex: IVec3| {
            IVec3::new(
                Self::scaled(vertex.x, def.model_size_x),
                Self::scaled(vertex.y, def.model_size_height),
                Self::scaled(vertex.z, def.model_size_y),
            )
        };

        let mut model = Model::cuboid(scale(min), scale(max));
        model.rotate(rotation);
        model.translate(IVec3::new(
            def.offset_x as i32,
            def.offset_height as i32,
            def.offset_y as i32,
        ));
        model
    }
}

impl ModelProvider for BoundsModelProvider {
    fn renderable(&self, def: &Arc<ObjectDefinition>, kind: LocationType, rotation: u8) -> Option<Renderable> {
        if def.models_for_type(kind).is_empty() {
            return None;
        }

        if def.is_animated() {
            return Some(Renderable::Animated(Arc::new(DynamicObject {
                def: def.clone(),
                kind,
                rotation,
                animation_id: def.animation_id,
                randomize_start: def.randomize_anim_start,
            })));
        }

        Some(Renderable::Model(Arc::new(Self::model_for(def, kind, rotation))))
    }
}
