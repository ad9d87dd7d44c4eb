use std::future::Future;
use std::num::NonZeroUsize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::task::{Context, Poll};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, error, trace};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::chunk::chunk_data_loader::ChunkDataLoader;
use crate::chunk::{ChunkLoadError, ChunkLoadResult};
use crate::io::cache::store::MemoryStore;
use crate::io::cache::xteas::XteaKeyTable;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("The chunk loader pool has already been initialized")]
    AlreadyInitialized,

    #[error("The chunk loader pool has been shut down")]
    Closed,

    #[error("Failed to spawn chunk loader worker {index}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    Uninitialized = 0,
    Initialized = 1,
    Ready = 2,
    Busy = 3,
    Stopped = 4,
}

impl From<u8> for WorkerState {
    fn from(value: u8) -> Self {
        match value {
            0 => WorkerState::Uninitialized,
            1 => WorkerState::Initialized,
            2 => WorkerState::Ready,
            3 => WorkerState::Busy,
            _ => WorkerState::Stopped,
        }
    }
}

struct WorkerContext {
    store: Arc<MemoryStore>,
    xteas: XteaKeyTable,
}

struct LoadTask {
    region_x: u32,
    region_y: u32,
    minimize_draw_calls: bool,
    reply: oneshot::Sender<ChunkLoadResult>,
}

struct Worker {
    state: Arc<AtomicU8>,
    init: Option<Sender<WorkerContext>>,
    handle: Option<JoinHandle<()>>,
}

/// The result of a [`ChunkLoaderPool::load`] request. Poll it as a future or block on [`PendingChunk::wait`].
/// Dropping it discards the result, the request itself still runs.
pub struct PendingChunk {
    region_x: u32,
    region_y: u32,
    receiver: oneshot::Receiver<ChunkLoadResult>,
}

impl PendingChunk {
    pub fn region(&self) -> (u32, u32) {
        (self.region_x, self.region_y)
    }

    /// Blocks the current thread. Must not be called from within an async runtime, await the chunk instead.
    pub fn wait(self) -> ChunkLoadResult {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(ChunkLoadError::PoolClosed))
    }
}

impl Future for PendingChunk {
    type Output = ChunkLoadResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().receiver)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(ChunkLoadError::PoolClosed)))
    }
}

/// A fixed set of chunk loader threads sharing one task queue. Whichever worker is idle picks up the next
/// request, callers never address a worker directly.
pub struct ChunkLoaderPool {
    tasks: Option<Sender<LoadTask>>,
    workers: Vec<Worker>,
    initialized: AtomicBool,
}

impl ChunkLoaderPool {
    /// Spawns `size` workers (at least one). They idle until [`ChunkLoaderPool::init`] hands them the cache.
    pub fn new(size: usize) -> Result<Self, PoolError> {
        let size = size.max(1);
        let (task_sender, task_receiver) = unbounded::<LoadTask>();

        let mut workers = Vec::with_capacity(size);
        for index in 0..size {
            let (init_sender, init_receiver) = unbounded::<WorkerContext>();
            let state = Arc::new(AtomicU8::new(WorkerState::Uninitialized as u8));

            let worker_state = state.clone();
            let worker_tasks = task_receiver.clone();
            let handle = std::thread::Builder::new()
                .name(format!("Chunk Loader {}", index))
                .spawn(move || run_worker(index, init_receiver, worker_tasks, worker_state))
                .map_err(|source| PoolError::Spawn { index, source })?;

            workers.push(Worker {
                state,
                init: Some(init_sender),
                handle: Some(handle),
            });
        }

        debug!("Spawned {} chunk loader workers", size);
        Ok(Self {
            tasks: Some(task_sender),
            workers,
            initialized: AtomicBool::new(false),
        })
    }

    pub fn with_default_size() -> Result<Self, PoolError> {
        Self::new(default_pool_size())
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.workers
            .iter()
            .map(|worker| WorkerState::from(worker.state.load(Ordering::Acquire)))
            .collect()
    }

    /// Hands the cache to every worker. The store is moved in and shared read-only from then on, every worker
    /// gets its own copy of the key table. Requests queued before this call are served afterwards.
    pub fn init(&self, store: MemoryStore, xteas: XteaKeyTable) -> Result<(), PoolError> {
        if self.tasks.is_none() {
            return Err(PoolError::Closed);
        }

        if self.initialized.swap(true, Ordering::AcqRel) {
            return Err(PoolError::AlreadyInitialized);
        }

        let store = Arc::new(store);
        debug!(
            "Initializing {} chunk loaders with {} bytes of cache and {} xtea keys",
            self.workers.len(),
            store.byte_len(),
            xteas.len()
        );

        for worker in &self.workers {
            let Some(init) = &worker.init else {
                return Err(PoolError::Closed);
            };

            init.send(WorkerContext {
                store: store.clone(),
                xteas: xteas.clone(),
            })
            .map_err(|_| PoolError::Closed)?;
        }

        Ok(())
    }

    pub fn load(&self, region_x: u32, region_y: u32, minimize_draw_calls: bool) -> PendingChunk {
        let (reply, receiver) = oneshot::channel();
        let task = LoadTask {
            region_x,
            region_y,
            minimize_draw_calls,
            reply,
        };

        match &self.tasks {
            Some(tasks) => {
                if let Err(rejected) = tasks.send(task) {
                    let _ = rejected.into_inner().reply.send(Err(ChunkLoadError::PoolClosed));
                }
            }
            None => {
                let _ = task.reply.send(Err(ChunkLoadError::PoolClosed));
            }
        }

        PendingChunk {
            region_x,
            region_y,
            receiver,
        }
    }

    /// Closes the queue and joins every worker. Queued requests are still served when the pool has been
    /// initialized, otherwise they fail with [`ChunkLoadError::PoolClosed`].
    pub fn shutdown(&mut self) {
        if self.tasks.take().is_none() {
            return;
        }

        for worker in &mut self.workers {
            worker.init.take();
        }

        for (index, worker) in self.workers.iter_mut().enumerate() {
            let Some(handle) = worker.handle.take() else {
                continue;
            };

            if handle.join().is_err() {
                error!("Chunk loader {} terminated abnormally", index);
            }
        }

        debug!("Chunk loader pool shut down");
    }
}

impl Drop for ChunkLoaderPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}

fn set_state(state: &AtomicU8, value: WorkerState) {
    state.store(value as u8, Ordering::Release);
}

fn load_region(loader: &ChunkDataLoader, task: &LoadTask) -> ChunkLoadResult {
    #[cfg(test)]
    if (task.region_x, task.region_y) == tests::PANICKING_REGION {
        panic!("Region {}_{} panics on purpose", task.region_x, task.region_y);
    }

    loader.load(task.region_x, task.region_y, task.minimize_draw_calls)
}

fn run_worker(index: usize, init: Receiver<WorkerContext>, tasks: Receiver<LoadTask>, state: Arc<AtomicU8>) {
    let Ok(context) = init.recv() else {
        trace!("Chunk loader {} stopped before initialization", index);
        set_state(&state, WorkerState::Stopped);
        return;
    };

    set_state(&state, WorkerState::Initialized);
    let loader = ChunkDataLoader::new(context.store, context.xteas);
    set_state(&state, WorkerState::Ready);

    while let Ok(task) = tasks.recv() {
        set_state(&state, WorkerState::Busy);
        trace!(
            "Chunk loader {} loading region {}_{}",
            index, task.region_x, task.region_y
        );

        let result = catch_unwind(AssertUnwindSafe(|| load_region(&loader, &task)))
        .unwrap_or_else(|_| {
            Err(ChunkLoadError::WorkerPanicked {
                region_x: task.region_x,
                region_y: task.region_y,
            })
        });

        if let Err(err) = &result {
            error!("Chunk loader {}: {}", index, err);
        }

        // the caller may have lost interest
        let _ = task.reply.send(result);
        set_state(&state, WorkerState::Ready);
    }

    set_state(&state, WorkerState::Stopped);
}
