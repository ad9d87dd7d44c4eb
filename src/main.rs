use std::fs::File;
use std::io::BufReader;

use anyhow::Context;
use clap::Parser;
use itertools::Itertools;
use log::{info, warn};
use mapviewer::chunk::worker_pool::{ChunkLoaderPool, default_pool_size};
use mapviewer::io::cache::store::MemoryStore;
use mapviewer::io::cache::xteas::XteaKeyTable;
use mapviewer::scene::BoundsModelProvider;
use mapviewer::scene::builder::SceneBuilder;
use mapviewer::scene::objects::get_scene_objects;
use mapviewer::scene::occlusion::GridOcclusionMap;
use mapviewer::settings::{CliArgs, OperationMode, RegionCoords};
use mapviewer_files::map::{PLANES, REGION_SIZE};
use tokio::task::JoinSet;

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let args = CliArgs::parse();
    log::trace!("Starting with args: {:?}", args);

    let store = MemoryStore::load_dump(&args.cache_dir)
        .with_context(|| format!("Failed to load the cache dump at {}", args.cache_dir.display()))?;
    let xteas = load_xteas(&args)?;

    let pool_size = match &args.operation_mode {
        OperationMode::Extract { .. } => 1,
        OperationMode::LoadRegions { .. } => args.pool_size.unwrap_or_else(default_pool_size),
    };
    let pool = ChunkLoaderPool::new(pool_size).context("Failed to start the chunk loaders")?;
    pool.init(store, xteas)?;

    match args.operation_mode {
        OperationMode::LoadRegions {
            regions,
            minimize_draw_calls,
        } => load_regions(&pool, &regions, minimize_draw_calls),
        OperationMode::Extract { region } => extract(&pool, region, args.max_plane),
    }
}

fn load_xteas(args: &CliArgs) -> Result<XteaKeyTable, anyhow::Error> {
    let path = args.xteas_path();
    if !path.exists() {
        warn!("No xteas at {}, all locations stay hidden", path.display());
        return Ok(XteaKeyTable::new());
    }

    let file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
    let xteas =
        XteaKeyTable::from_json_reader(BufReader::new(file)).with_context(|| format!("Failed to parse {}", path.display()))?;
    info!("Loaded {} xtea keys", xteas.len());
    Ok(xteas)
}

fn load_regions(pool: &ChunkLoaderPool, regions: &[RegionCoords], minimize_draw_calls: bool) -> Result<(), anyhow::Error> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("Failed to build the runtime")?;

    runtime.block_on(async {
        let mut pending = JoinSet::new();
        for region in regions.iter().unique() {
            let chunk = pool.load(region.x, region.y, minimize_draw_calls);
            pending.spawn(async move {
                let region = chunk.region();
                (region, chunk.await)
            });
        }

        // completions arrive in any order, the region travels along
        while let Some(joined) = pending.join_next().await {
            let ((region_x, region_y), result) = joined.context("Chunk task failed")?;
            match result {
                Ok(Some(chunk)) => println!(
                    "{}_{}: {} locations, {} tiles with a floor",
                    region_x,
                    region_y,
                    chunk.locations.len(),
                    (0..PLANES)
                        .cartesian_product(0..REGION_SIZE)
                        .cartesian_product(0..REGION_SIZE)
                        .filter(|((plane, x), y)| chunk
                            .terrain
                            .tile(*plane, *x, *y)
                            .is_some_and(|tile| tile.has_floor()))
                        .count()
                ),
                Ok(None) => println!("{}_{}: not present", region_x, region_y),
                Err(err) => println!("{}_{}: failed: {:#}", region_x, region_y, anyhow::Error::from(err)),
            }
        }

        Ok::<(), anyhow::Error>(())
    })
}

fn extract(pool: &ChunkLoaderPool, region: RegionCoords, max_plane: u8) -> Result<(), anyhow::Error> {
    let Some(chunk) = pool
        .load(region.x, region.y, true)
        .wait()
        .with_context(|| format!("Failed to load region {}_{}", region.x, region.y))?
    else {
        println!("{}_{}: not present", region.x, region.y);
        return Ok(());
    };

    let provider = BoundsModelProvider::new();
    let scene = SceneBuilder::new(&provider).build(&chunk);
    let occlusion = GridOcclusionMap::from_terrain(&chunk.terrain);
    let objects = get_scene_objects(&scene, &occlusion, max_plane);

    info!(
        "Region {}_{}: {} tiles, {} models ({} low detail), {} animated, {} occluded tiles",
        region.x,
        region.y,
        scene.tiles().count(),
        objects.object_models.len(),
        objects
            .object_models
            .iter()
            .filter(|model| model.low_detail)
            .count(),
        objects.animated_scene_objects.len(),
        occlusion.occluded_count()
    );

    for model in &objects.object_models {
        println!(
            "model {:>6} plane {} at ({}, {}, {}) priority {:>2} {:?}{}",
            model.interact_id,
            model.plane,
            model.scene_x,
            model.scene_y,
            model.scene_height,
            model.priority,
            model.contour_ground,
            if model.low_detail { " low detail" } else { "" }
        );
    }

    for animated in &objects.animated_scene_objects {
        println!(
            "animated {:>6} plane {} at ({}, {}) priority {:>2} animation {}",
            animated.interact_id,
            animated.plane,
            animated.scene_x,
            animated.scene_y,
            animated.priority,
            animated.animated_object.animation_id
        );
    }

    Ok(())
}
