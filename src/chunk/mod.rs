use std::sync::Arc;

use mapviewer_files::ParserError;
use mapviewer_files::definition::object::ObjectDefinition;
use mapviewer_files::map::locations::LocationSpawn;
use mapviewer_files::map::terrain::Terrain;
use mapviewer_files::map::{REGION_SIZE, region_id};
use thiserror::Error;

pub mod chunk_data_loader;
pub mod worker_pool;

#[derive(Debug, Clone)]
pub struct ChunkLocation {
    pub spawn: LocationSpawn,
    pub def: Arc<ObjectDefinition>,
}

/// Everything decoded for one region. Workers hand it over and keep nothing of it.
#[derive(Debug, Clone)]
pub struct ChunkData {
    pub region_x: u32,
    pub region_y: u32,
    pub terrain: Terrain,
    pub locations: Vec<ChunkLocation>,
    pub minimize_draw_calls: bool,
}

impl ChunkData {
    pub fn region_id(&self) -> u32 {
        region_id(self.region_x, self.region_y)
    }

    /// World tile coordinates of the south-west corner.
    pub fn base_tile(&self) -> (i32, i32) {
        (
            (self.region_x as usize * REGION_SIZE) as i32,
            (self.region_y as usize * REGION_SIZE) as i32,
        )
    }
}

#[derive(Error, Debug)]
pub enum ChunkLoadError {
    #[error("Failed to decode the terrain of region {region_x}_{region_y}")]
    Terrain {
        region_x: u32,
        region_y: u32,
        #[source]
        source: ParserError,
    },

    #[error("Failed to decode the locations of region {region_x}_{region_y}")]
    Locations {
        region_x: u32,
        region_y: u32,
        #[source]
        source: ParserError,
    },

    #[error("Chunk loader worker panicked while loading region {region_x}_{region_y}")]
    WorkerPanicked { region_x: u32, region_y: u32 },

    #[error("The chunk loader pool has been shut down")]
    PoolClosed,
}

pub type ChunkLoadResult = Result<Option<ChunkData>, ChunkLoadError>;
