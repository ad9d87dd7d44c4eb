use std::marker::PhantomData;
use std::sync::Arc;

use dashmap::DashMap;
use log::trace;
use mapviewer_files::ParserError;
use mapviewer_files::definition::Definition;
use thiserror::Error;

use crate::io::cache::cache_info::CacheInfo;
use crate::io::common::loader::ArchiveReader;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("No record for id {id} in group {group_id}")]
    MissingRecord { group_id: u32, id: u32 },

    #[error("Record {id} is malformed")]
    Malformed {
        id: u32,
        #[source]
        source: ParserError,
    },
}

pub trait DefinitionLoader<T> {
    fn load(&self, id: u32) -> Result<Arc<T>, DecodeError>;
}

/// Decodes every requested id from scratch. Wrap it into a [`CachedDefinitionLoader`] to share results.
pub struct ArchiveDefinitionLoader<T, A> {
    archive: A,
    group_id: u32,
    cache_info: Arc<CacheInfo>,
    _definition: PhantomData<fn() -> T>,
}

impl<T: Definition, A: ArchiveReader> ArchiveDefinitionLoader<T, A> {
    pub fn new(archive: A, group_id: u32, cache_info: Arc<CacheInfo>) -> Self {
        Self {
            archive,
            group_id,
            cache_info,
            _definition: PhantomData,
        }
    }

    pub fn cache_info(&self) -> &Arc<CacheInfo> {
        &self.cache_info
    }

    pub fn group_id(&self) -> u32 {
        self.group_id
    }
}

impl<T: Definition, A: ArchiveReader> DefinitionLoader<T> for ArchiveDefinitionLoader<T, A> {
    fn load(&self, id: u32) -> Result<Arc<T>, DecodeError> {
        let data = self
            .archive
            .read_record(self.group_id, id)
            .ok_or(DecodeError::MissingRecord {
                group_id: self.group_id,
                id,
            })?;

        T::decode(id, &data)
            .map(Arc::new)
            .map_err(|source| DecodeError::Malformed { id, source })
    }
}

/// Memoizes another loader: for one [`CacheInfo`] every id is decoded at most once and all callers observe the
/// very same `Arc`. The decode happens while holding the entry's shard lock, so racing threads wait for the
/// first decode instead of duplicating it. Failures are not remembered.
pub struct CachedDefinitionLoader<T, L> {
    inner: L,
    cache_info: Arc<CacheInfo>,
    cache: DashMap<u32, Arc<T>>,
}

pub type CachedArchiveDefinitionLoader<T, A> = CachedDefinitionLoader<T, ArchiveDefinitionLoader<T, A>>;

impl<T, L: DefinitionLoader<T>> CachedDefinitionLoader<T, L> {
    pub fn new(inner: L, cache_info: Arc<CacheInfo>) -> Self {
        Self {
            inner,
            cache_info,
            cache: DashMap::with_capacity(100),
        }
    }

    pub fn cache_info(&self) -> &Arc<CacheInfo> {
        &self.cache_info
    }

    /// Switches to another cache revision, dropping everything decoded so far if it differs.
    /// Returns whether the memo has been invalidated.
    pub fn rebind(&mut self, cache_info: Arc<CacheInfo>) -> bool {
        if *self.cache_info == *cache_info {
            return false;
        }

        trace!(
            "Cache changed from {} to {}, dropping {} definitions",
            self.cache_info.name,
            cache_info.name,
            self.cache.len()
        );
        self.cache.clear();
        self.cache_info = cache_info;
        true
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl<T: Definition, A: ArchiveReader> CachedArchiveDefinitionLoader<T, A> {
    pub fn from_archive(archive: A, group_id: u32, cache_info: Arc<CacheInfo>) -> Self {
        CachedDefinitionLoader::new(
            ArchiveDefinitionLoader::new(archive, group_id, cache_info.clone()),
            cache_info,
        )
    }
}

impl<T, L: DefinitionLoader<T>> DefinitionLoader<T> for CachedDefinitionLoader<T, L> {
    fn load(&self, id: u32) -> Result<Arc<T>, DecodeError> {
        // Easy path: only takes the shard's read lock
        if let Some(definition) = self.cache.get(&id) {
            return Ok(definition.clone());
        }

        // maybe we have been raced in between, then or_try_insert_with won't decode again.
        let entry = self
            .cache
            .entry(id)
            .or_try_insert_with(|| self.inner.load(id))?;
        Ok(entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use itertools::Itertools;
    use mapviewer_files::definition::varbit::VarbitDefinition;

    use crate::io::cache::cache_info::test_cache_info;
    use crate::io::cache::definition_loader::{
        ArchiveDefinitionLoader, CachedArchiveDefinitionLoader, CachedDefinitionLoader, DecodeError, DefinitionLoader,
    };
    use crate::io::cache::store::{CONFIG_INDEX, IndexArchive, MemoryStore};

    const GROUP: u32 = 14;

    fn varbit_archive() -> IndexArchive {
        let mut store = MemoryStore::new(test_cache_info(190));
        store.insert_file(CONFIG_INDEX, GROUP, 1, vec![1, 0, 7, 0, 3, 0]);
        store.insert_file(CONFIG_INDEX, GROUP, 2, vec![1, 0]);
        IndexArchive::new(Arc::new(store), CONFIG_INDEX)
    }

    struct CountingLoader<L> {
        inner: L,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl<L: DefinitionLoader<VarbitDefinition>> DefinitionLoader<VarbitDefinition> for CountingLoader<L> {
        fn load(&self, id: u32) -> Result<Arc<VarbitDefinition>, DecodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.inner.load(id)
        }
    }

    fn counting_loader(
        delay: Duration,
    ) -> CachedDefinitionLoader<VarbitDefinition, CountingLoader<ArchiveDefinitionLoader<VarbitDefinition, IndexArchive>>>
    {
        let archive = varbit_archive();
        let cache_info = archive.cache_info().clone();
        CachedDefinitionLoader::new(
            CountingLoader {
                inner: ArchiveDefinitionLoader::new(archive, GROUP, cache_info.clone()),
                calls: AtomicUsize::new(0),
                delay,
            },
            cache_info,
        )
    }

    #[test]
    fn base_loader_decodes_every_time() -> Result<(), anyhow::Error> {
        let archive = varbit_archive();
        let loader: ArchiveDefinitionLoader<VarbitDefinition, _> =
            ArchiveDefinitionLoader::new(archive.clone(), GROUP, archive.cache_info().clone());

        let first = loader.load(1)?;
        let second = loader.load(1)?;
        assert_eq!(first.index, 7);
        assert_eq!(first, second);
        assert!(!Arc::ptr_eq(&first, &second));
        Ok(())
    }

    #[test]
    fn cached_loader_returns_identical_definition() -> Result<(), anyhow::Error> {
        let loader = counting_loader(Duration::ZERO);

        let first = loader.load(1)?;
        let second = loader.load(1)?;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(loader.len(), 1);
        Ok(())
    }

    #[test]
    fn concurrent_loads_decode_once() {
        let loader = counting_loader(Duration::from_millis(20));

        let results = std::thread::scope(|scope| {
            (0..8)
                .map(|_| scope.spawn(|| loader.load(1).expect("record 1 decodes")))
                .collect_vec()
                .into_iter()
                .map(|handle| handle.join().expect("loader thread panicked"))
                .collect_vec()
        });

        assert_eq!(loader.inner.calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|def| Arc::ptr_eq(def, &results[0])));
    }

    #[test]
    fn errors_are_reported_and_not_memoized() {
        let loader = counting_loader(Duration::ZERO);

        assert!(matches!(
            loader.load(3),
            Err(DecodeError::MissingRecord { group_id: GROUP, id: 3 })
        ));
        assert!(matches!(loader.load(2), Err(DecodeError::Malformed { id: 2, .. })));
        assert!(loader.load(2).is_err());
        assert_eq!(loader.inner.calls.load(Ordering::SeqCst), 3);
        assert!(loader.is_empty());
    }

    #[test]
    fn rebind_drops_definitions_of_other_caches() -> Result<(), anyhow::Error> {
        let archive = varbit_archive();
        let mut loader: CachedArchiveDefinitionLoader<VarbitDefinition, _> =
            CachedArchiveDefinitionLoader::from_archive(archive.clone(), GROUP, archive.cache_info().clone());

        let first = loader.load(1)?;
        assert!(!loader.rebind(Arc::new(test_cache_info(190))));
        assert!(Arc::ptr_eq(&first, &loader.load(1)?));

        assert!(loader.rebind(Arc::new(test_cache_info(191))));
        assert!(loader.is_empty());
        assert!(!Arc::ptr_eq(&first, &loader.load(1)?));
        Ok(())
    }
}
