use std::sync::Arc;

use mapviewer_files::definition::Definition;
use mapviewer_files::definition::object::ObjectDefinition;
use mapviewer_files::definition::overlay::OverlayDefinition;
use mapviewer_files::definition::varbit::VarbitDefinition;

use crate::io::cache::cache_info::CacheInfo;
use crate::io::cache::definition_loader::{ArchiveDefinitionLoader, CachedArchiveDefinitionLoader};
use crate::io::common::loader::ArchiveReader;

/// Binds a definition type to its group within the config index.
pub trait ConfigGroup: Definition {
    const GROUP_ID: u32;
}

impl ConfigGroup for OverlayDefinition {
    const GROUP_ID: u32 = 4;
}

impl ConfigGroup for ObjectDefinition {
    const GROUP_ID: u32 = 6;
}

impl ConfigGroup for VarbitDefinition {
    const GROUP_ID: u32 = 14;
}

impl<T: ConfigGroup, A: ArchiveReader> ArchiveDefinitionLoader<T, A> {
    pub fn for_config(config_archive: A, cache_info: Arc<CacheInfo>) -> Self {
        ArchiveDefinitionLoader::new(config_archive, T::GROUP_ID, cache_info)
    }
}

impl<T: ConfigGroup, A: ArchiveReader> CachedArchiveDefinitionLoader<T, A> {
    pub fn for_config(config_archive: A, cache_info: Arc<CacheInfo>) -> Self {
        CachedArchiveDefinitionLoader::from_archive(config_archive, T::GROUP_ID, cache_info)
    }
}

pub type OverlayLoader<A> = ArchiveDefinitionLoader<OverlayDefinition, A>;
pub type CachedOverlayLoader<A> = CachedArchiveDefinitionLoader<OverlayDefinition, A>;

pub type VarbitLoader<A> = ArchiveDefinitionLoader<VarbitDefinition, A>;
pub type CachedVarbitLoader<A> = CachedArchiveDefinitionLoader<VarbitDefinition, A>;

pub type ObjectLoader<A> = ArchiveDefinitionLoader<ObjectDefinition, A>;
pub type CachedObjectLoader<A> = CachedArchiveDefinitionLoader<ObjectDefinition, A>;
