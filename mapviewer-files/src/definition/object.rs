use std::collections::HashMap;
use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};

use crate::ParserError;
use crate::common::reader::{read_array, read_optional_u16, read_string, read_u24};
use crate::definition::Definition;
use crate::map::locations::LocationType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(i32),
    Str(String),
}

/// Placeable world objects ("locs"): walls, decorations, scenery, doors, trees, ...
#[derive(Debug, Clone)]
pub struct ObjectDefinition {
    pub id: u32,
    pub name: String,
    pub model_ids: Vec<u16>,
    /// `None` when the models apply to every location type (opcode 5).
    pub model_types: Option<Vec<u8>>,
    pub size_x: u8,
    pub size_y: u8,
    pub clip_type: i32,
    pub blocks_projectile: bool,
    /// Interactivity, which also doubles as the "may be occluded" marker for centrepieces and wall decorations.
    pub int1: i32,
    pub contoured_ground: i32,
    pub merge_normals: bool,
    pub model_clipped: bool,
    pub animation_id: i32,
    pub decor_displacement: u8,
    pub ambient: i8,
    pub contrast: i32,
    pub actions: [Option<String>; 5],
    pub recolor_from: Vec<u16>,
    pub recolor_to: Vec<u16>,
    pub retexture_from: Vec<u16>,
    pub retexture_to: Vec<u16>,
    pub map_function_id: i32,
    pub category: i32,
    pub is_rotated: bool,
    pub clipped: bool,
    pub model_size_x: u16,
    pub model_size_height: u16,
    pub model_size_y: u16,
    pub map_scene_id: i32,
    pub blocking_mask: u8,
    pub offset_x: i16,
    pub offset_height: i16,
    pub offset_y: i16,
    pub obstructs_ground: bool,
    pub is_hollow: bool,
    pub support_items: i32,
    pub transform_varbit: i32,
    pub transform_varp: i32,
    pub transforms: Vec<i32>,
    pub ambient_sound_id: i32,
    pub ambient_sound_distance: u8,
    pub ambient_sound_change_ticks_min: u16,
    pub ambient_sound_change_ticks_max: u16,
    pub ambient_sound_ids: Vec<u16>,
    pub map_icon_id: i32,
    pub randomize_anim_start: bool,
    pub params: HashMap<u32, ParamValue>,
}

impl ObjectDefinition {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            name: "null".to_string(),
            model_ids: vec![],
            model_types: None,
            size_x: 1,
            size_y: 1,
            clip_type: 2,
            blocks_projectile: true,
            int1: -1,
            contoured_ground: -1,
            merge_normals: false,
            model_clipped: false,
            animation_id: -1,
            decor_displacement: 16,
            ambient: 0,
            contrast: 0,
            actions: Default::default(),
            recolor_from: vec![],
            recolor_to: vec![],
            retexture_from: vec![],
            retexture_to: vec![],
            map_function_id: -1,
            category: -1,
            is_rotated: false,
            clipped: true,
            model_size_x: 128,
            model_size_height: 128,
            model_size_y: 128,
            map_scene_id: -1,
            blocking_mask: 0,
            offset_x: 0,
            offset_height: 0,
            offset_y: 0,
            obstructs_ground: false,
            is_hollow: false,
            support_items: -1,
            transform_varbit: -1,
            transform_varp: -1,
            transforms: vec![],
            ambient_sound_id: -1,
            ambient_sound_distance: 0,
            ambient_sound_change_ticks_min: 0,
            ambient_sound_change_ticks_max: 0,
            ambient_sound_ids: vec![],
            map_icon_id: -1,
            randomize_anim_start: true,
            params: HashMap::new(),
        }
    }

    pub fn is_animated(&self) -> bool {
        self.animation_id != -1
    }

    pub fn has_actions(&self) -> bool {
        self.actions.iter().any(Option::is_some)
    }

    /// The model ids to use for the given location type, empty if this object has no model for it.
    /// Untyped models only serve centrepieces, diagonal centrepieces share the centrepiece models.
    pub fn models_for_type(&self, location_type: LocationType) -> Vec<u16> {
        let location_type = match location_type {
            LocationType::CentrepieceDiagonal => LocationType::Centrepiece,
            other => other,
        };

        match &self.model_types {
            None if location_type == LocationType::Centrepiece => self.model_ids.clone(),
            None => vec![],
            Some(types) => types
                .iter()
                .zip(self.model_ids.iter())
                .filter(|(kind, _)| **kind == location_type as u8)
                .map(|(_, id)| *id)
                .collect(),
        }
    }

    fn read_opcode(&mut self, opcode: u8, rdr: &mut Cursor<&[u8]>) -> Result<(), ParserError> {
        match opcode {
            1 => {
                let count = rdr.read_u8()? as usize;
                let mut ids = Vec::with_capacity(count);
                let mut types = Vec::with_capacity(count);
                for _ in 0..count {
                    ids.push(rdr.read_u16::<BigEndian>()?);
                    types.push(rdr.read_u8()?);
                }
                self.model_ids = ids;
                self.model_types = Some(types);
            }
            2 => self.name = read_string(rdr)?,
            5 => {
                let count = rdr.read_u8()? as usize;
                self.model_ids = read_array::<u16, _>(rdr, count)?;
                self.model_types = None;
            }
            14 => self.size_x = rdr.read_u8()?,
            15 => self.size_y = rdr.read_u8()?,
            17 => {
                self.clip_type = 0;
                self.blocks_projectile = false;
            }
            18 => self.blocks_projectile = false,
            19 => self.int1 = rdr.read_u8()? as i32,
            21 => self.contoured_ground = 0,
            22 => self.merge_normals = true,
            23 => self.model_clipped = true,
            24 => self.animation_id = read_optional_u16(rdr)?,
            27 => self.clip_type = 1,
            28 => self.decor_displacement = rdr.read_u8()?,
            29 => self.ambient = rdr.read_i8()?,
            30..=34 => {
                let action = read_string(rdr)?;
                self.actions[(opcode - 30) as usize] = if action.eq_ignore_ascii_case("hidden") {
                    None
                } else {
                    Some(action)
                };
            }
            39 => self.contrast = rdr.read_i8()? as i32 * 25,
            40 => {
                let count = rdr.read_u8()? as usize;
                for _ in 0..count {
                    self.recolor_from.push(rdr.read_u16::<BigEndian>()?);
                    self.recolor_to.push(rdr.read_u16::<BigEndian>()?);
                }
            }
            41 => {
                let count = rdr.read_u8()? as usize;
                for _ in 0..count {
                    self.retexture_from.push(rdr.read_u16::<BigEndian>()?);
                    self.retexture_to.push(rdr.read_u16::<BigEndian>()?);
                }
            }
            60 => self.map_function_id = rdr.read_u16::<BigEndian>()? as i32,
            61 => self.category = rdr.read_u16::<BigEndian>()? as i32,
            62 => self.is_rotated = true,
            64 => self.clipped = false,
            65 => self.model_size_x = rdr.read_u16::<BigEndian>()?,
            66 => self.model_size_height = rdr.read_u16::<BigEndian>()?,
            67 => self.model_size_y = rdr.read_u16::<BigEndian>()?,
            68 => self.map_scene_id = rdr.read_u16::<BigEndian>()? as i32,
            69 => self.blocking_mask = rdr.read_u8()?,
            70 => self.offset_x = rdr.read_i16::<BigEndian>()?,
            71 => self.offset_height = rdr.read_i16::<BigEndian>()?,
            72 => self.offset_y = rdr.read_i16::<BigEndian>()?,
            73 => self.obstructs_ground = true,
            74 => self.is_hollow = true,
            75 => self.support_items = rdr.read_u8()? as i32,
            77 | 92 => {
                self.transform_varbit = read_optional_u16(rdr)?;
                self.transform_varp = read_optional_u16(rdr)?;
                let default_transform = if opcode == 92 {
                    Some(read_optional_u16(rdr)?)
                } else {
                    None
                };

                let count = rdr.read_u8()? as usize;
                let mut transforms = Vec::with_capacity(count + 2);
                for _ in 0..=count {
                    transforms.push(read_optional_u16(rdr)?);
                }
                transforms.push(default_transform.unwrap_or(-1));
                self.transforms = transforms;
            }
            78 => {
                self.ambient_sound_id = rdr.read_u16::<BigEndian>()? as i32;
                self.ambient_sound_distance = rdr.read_u8()?;
            }
            79 => {
                self.ambient_sound_change_ticks_min = rdr.read_u16::<BigEndian>()?;
                self.ambient_sound_change_ticks_max = rdr.read_u16::<BigEndian>()?;
                self.ambient_sound_distance = rdr.read_u8()?;
                let count = rdr.read_u8()? as usize;
                self.ambient_sound_ids = read_array::<u16, _>(rdr, count)?;
            }
            81 => self.contoured_ground = rdr.read_u8()? as i32 * 256,
            82 => self.map_icon_id = rdr.read_u16::<BigEndian>()? as i32,
            89 => self.randomize_anim_start = false,
            249 => {
                let count = rdr.read_u8()? as usize;
                for _ in 0..count {
                    let is_string = rdr.read_u8()? == 1;
                    let key = read_u24(rdr)?;
                    let value = if is_string {
                        ParamValue::Str(read_string(rdr)?)
                    } else {
                        ParamValue::Int(rdr.read_i32::<BigEndian>()?)
                    };
                    self.params.insert(key, value);
                }
            }
            _ => {
                return Err(ParserError::UnknownOpcode {
                    opcode: opcode as u16,
                    kind: Self::KIND,
                });
            }
        }
        Ok(())
    }

    fn post_decode(&mut self) {
        if self.int1 == -1 {
            // only the first model type counts
            let has_centrepiece_model = !self.model_ids.is_empty()
                && match &self.model_types {
                    None => true,
                    Some(types) => types.first() == Some(&(LocationType::Centrepiece as u8)),
                };
            self.int1 = if has_centrepiece_model || self.has_actions() { 1 } else { 0 };
        }

        if self.is_hollow {
            self.clip_type = 0;
            self.blocks_projectile = false;
        }

        if self.support_items == -1 {
            self.support_items = if self.clip_type != 0 { 1 } else { 0 };
        }
    }
}

impl Definition for ObjectDefinition {
    const KIND: &'static str = "object";

    fn decode(id: u32, data: &[u8]) -> Result<Self, ParserError> {
        if data.is_empty() {
            return Err(ParserError::EmptySource);
        }

        let mut rdr = Cursor::new(data);
        let mut def = ObjectDefinition::new(id);
        loop {
            let opcode = rdr.read_u8()?;
            if opcode == 0 {
                break;
            }
            def.read_opcode(opcode, &mut rdr)?;
        }

        def.post_decode();
        Ok(def)
    }
}
