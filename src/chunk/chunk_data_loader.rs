use std::sync::Arc;

use log::{trace, warn};
use mapviewer_files::map::locations::{LocationReader, LocationSpawn};
use mapviewer_files::map::terrain::{TerrainFormat, TerrainReader};
use mapviewer_files::map::{REGION_SIZE, locations_group_name, region_id, terrain_group_name};
use mapviewer_files::xtea;

use crate::chunk::{ChunkData, ChunkLoadError, ChunkLoadResult, ChunkLocation};
use crate::io::cache::definition_loader::DefinitionLoader;
use crate::io::cache::loaders::CachedObjectLoader;
use crate::io::cache::store::{CONFIG_INDEX, IndexArchive, MAPS_INDEX, MemoryStore};
use crate::io::cache::xteas::XteaKeyTable;

/// The decoding half of a chunk loader worker. Owned by exactly one worker thread.
pub struct ChunkDataLoader {
    store: Arc<MemoryStore>,
    xteas: XteaKeyTable,
    objects: CachedObjectLoader<IndexArchive>,
    terrain_format: TerrainFormat,
}

impl ChunkDataLoader {
    pub fn new(store: Arc<MemoryStore>, xteas: XteaKeyTable) -> Self {
        let cache_info = store.cache_info().clone();
        let terrain_format = TerrainFormat::for_revision(cache_info.revision);
        let objects = CachedObjectLoader::for_config(IndexArchive::new(store.clone(), CONFIG_INDEX), cache_info);

        Self {
            store,
            xteas,
            objects,
            terrain_format,
        }
    }

    /// `Ok(None)` when the cache has no terrain for this region, which is common for ocean and unused regions.
    pub fn load(&self, region_x: u32, region_y: u32, minimize_draw_calls: bool) -> ChunkLoadResult {
        let Some(terrain_data) = self
            .store
            .group_id_by_name(MAPS_INDEX, &terrain_group_name(region_x, region_y))
            .and_then(|group_id| self.store.read_file(MAPS_INDEX, group_id, 0))
        else {
            trace!("Region {}_{} has no terrain", region_x, region_y);
            return Ok(None);
        };

        let base_x = (region_x as usize * REGION_SIZE) as i32;
        let base_y = (region_y as usize * REGION_SIZE) as i32;
        let terrain = TerrainReader::parse_terrain(terrain_data, base_x, base_y, self.terrain_format).map_err(
            |source| ChunkLoadError::Terrain {
                region_x,
                region_y,
                source,
            },
        )?;

        let mut locations = Vec::new();
        for spawn in self.load_spawns(region_x, region_y)? {
            match self.objects.load(spawn.id) {
                Ok(def) => locations.push(ChunkLocation { spawn, def }),
                Err(err) => warn!(
                    "Skipping location {} in region {}_{}: {}",
                    spawn.id, region_x, region_y, err
                ),
            }
        }

        if minimize_draw_calls {
            // stable, so spawns of the same object keep their relative order
            locations.sort_by_key(|location| location.spawn.id);
        }

        trace!(
            "Loaded region {}_{} with {} locations",
            region_x,
            region_y,
            locations.len()
        );

        Ok(Some(ChunkData {
            region_x,
            region_y,
            terrain,
            locations,
            minimize_draw_calls,
        }))
    }

    fn load_spawns(&self, region_x: u32, region_y: u32) -> Result<Vec<LocationSpawn>, ChunkLoadError> {
        let Some(encrypted) = self
            .store
            .group_id_by_name(MAPS_INDEX, &locations_group_name(region_x, region_y))
            .and_then(|group_id| self.store.read_file(MAPS_INDEX, group_id, 0))
        else {
            return Ok(vec![]);
        };

        let Some(key) = self.xteas.get(region_id(region_x, region_y)) else {
            warn!(
                "No xtea key for region {}_{}, its locations stay hidden",
                region_x, region_y
            );
            return Ok(vec![]);
        };

        let mut data = encrypted.to_vec();
        xtea::decipher(&mut data, key);

        LocationReader::parse_locations(&data).map_err(|source| ChunkLoadError::Locations {
            region_x,
            region_y,
            source,
        })
    }
}
