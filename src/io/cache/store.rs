use std::collections::HashMap;
use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, trace};
use thiserror::Error;

use crate::io::cache::cache_info::CacheInfo;
use crate::io::common::loader::ArchiveReader;

pub const CONFIG_INDEX: u8 = 2;
pub const MAPS_INDEX: u8 = 5;

const CACHE_INFO_FILE: &str = "cache_info.json";
const GROUP_NAMES_FILE: &str = "names.tsv";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed cache dump entry {path}: {reason}")]
    InvalidEntry { path: PathBuf, reason: &'static str },

    #[error("Failed to parse {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Group names are only stored as hashes (java `String#hashCode` of the lowercase name).
pub fn name_hash(name: &str) -> i32 {
    name.to_lowercase()
        .chars()
        .fold(0i32, |hash, c| hash.wrapping_mul(31).wrapping_add(c as i32))
}

#[derive(Debug, Default)]
struct StoreIndex {
    groups: HashMap<u32, HashMap<u32, Vec<u8>>>,
    names: HashMap<i32, u32>,
}

/// All records of a cache, fully resident in memory. Built once, then handed over to the chunk
/// loader workers and only ever read from there on.
#[derive(Debug)]
pub struct MemoryStore {
    cache_info: Arc<CacheInfo>,
    indices: HashMap<u8, StoreIndex>,
}

impl MemoryStore {
    pub fn new(cache_info: CacheInfo) -> Self {
        Self {
            cache_info: Arc::new(cache_info),
            indices: HashMap::new(),
        }
    }

    pub fn cache_info(&self) -> &Arc<CacheInfo> {
        &self.cache_info
    }

    pub fn insert_file(&mut self, index: u8, group_id: u32, file_id: u32, data: Vec<u8>) {
        self.indices
            .entry(index)
            .or_default()
            .groups
            .entry(group_id)
            .or_default()
            .insert(file_id, data);
    }

    pub fn set_group_name(&mut self, index: u8, group_id: u32, name: &str) {
        self.indices
            .entry(index)
            .or_default()
            .names
            .insert(name_hash(name), group_id);
    }

    pub fn read_file(&self, index: u8, group_id: u32, file_id: u32) -> Option<&[u8]> {
        self.indices
            .get(&index)?
            .groups
            .get(&group_id)?
            .get(&file_id)
            .map(Vec::as_slice)
    }

    pub fn group_id_by_name(&self, index: u8, name: &str) -> Option<u32> {
        self.indices
            .get(&index)?
            .names
            .get(&name_hash(name))
            .copied()
    }

    pub fn byte_len(&self) -> usize {
        self.indices
            .values()
            .flat_map(|index| index.groups.values())
            .flat_map(|group| group.values())
            .map(Vec::len)
            .sum()
    }

    /// Loads an extracted cache: `<root>/cache_info.json`, `<root>/<index>/<group>/<file>.dat` and an optional
    /// `<root>/<index>/names.tsv` with `group<TAB>name` lines.
    pub fn load_dump(root: &Path) -> Result<Self, StoreError> {
        let info_path = root.join(CACHE_INFO_FILE);
        let info_file = File::open(&info_path).map_err(|source| StoreError::Io {
            path: info_path.clone(),
            source,
        })?;
        let cache_info = CacheInfo::from_reader(BufReader::new(info_file)).map_err(|source| StoreError::Json {
            path: info_path.clone(),
            source,
        })?;

        let mut store = MemoryStore::new(cache_info);
        for (index, index_path) in numeric_entries(root)? {
            let index = u8::try_from(index).map_err(|_| StoreError::InvalidEntry {
                path: index_path.clone(),
                reason: "index id exceeds 255",
            })?;

            for (group_id, group_path) in numeric_entries(&index_path)? {
                for (file_id, file_path) in numeric_entries(&group_path)? {
                    let data = fs::read(&file_path).map_err(|source| StoreError::Io {
                        path: file_path.clone(),
                        source,
                    })?;
                    store.insert_file(index, group_id, file_id, data);
                }
            }

            let names_path = index_path.join(GROUP_NAMES_FILE);
            if names_path.is_file() {
                let names = fs::read_to_string(&names_path).map_err(|source| StoreError::Io {
                    path: names_path.clone(),
                    source,
                })?;
                for line in names.lines().filter(|line| !line.trim().is_empty()) {
                    let (group_id, name) = line.split_once('\t').ok_or(StoreError::InvalidEntry {
                        path: names_path.clone(),
                        reason: "expected group<TAB>name",
                    })?;
                    let group_id = group_id.trim().parse::<u32>().map_err(|_| StoreError::InvalidEntry {
                        path: names_path.clone(),
                        reason: "group id is not numeric",
                    })?;
                    store.set_group_name(index, group_id, name.trim());
                }
            }
            trace!("Loaded index {} from {}", index, index_path.display());
        }

        debug!(
            "Loaded cache {} (revision {}, {} bytes)",
            store.cache_info.name,
            store.cache_info.revision,
            store.byte_len()
        );
        Ok(store)
    }
}

/// Directory entries whose file stem is a number, e.g. `12` or `12.dat`. Everything else is skipped.
fn numeric_entries(dir: &Path) -> Result<Vec<(u32, PathBuf)>, StoreError> {
    let entries = fs::read_dir(dir).map_err(|source| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut result = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<u32>().ok());

        match id {
            Some(id) => result.push((id, path)),
            None => trace!("Skipping {}", path.display()),
        }
    }
    result.sort_by_key(|(id, _)| *id);
    Ok(result)
}

/// One index of a shared [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct IndexArchive {
    store: Arc<MemoryStore>,
    index: u8,
}

impl IndexArchive {
    pub fn new(store: Arc<MemoryStore>, index: u8) -> Self {
        Self { store, index }
    }

    pub fn cache_info(&self) -> &Arc<CacheInfo> {
        self.store.cache_info()
    }
}

impl ArchiveReader for IndexArchive {
    fn read_record(&self, group_id: u32, file_id: u32) -> Option<Vec<u8>> {
        self.store
            .read_file(self.index, group_id, file_id)
            .map(<[u8]>::to_vec)
    }
}
