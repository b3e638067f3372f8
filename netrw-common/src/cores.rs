use std::{
    cell::Cell,
    io,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::CoreId;

thread_local! {
    static CURRENT_CORE: Cell<Option<CoreId>> = const { Cell::new(None) };
}

pub(crate) fn current() -> Option<CoreId> {
    CURRENT_CORE.with(Cell::get)
}

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Core {0} is offline")]
    Offline(CoreId),
    #[error("Unknown core: {0}")]
    Unknown(CoreId),
    #[error("Failed to spawn core worker: {0:?}")]
    Spawn(#[from] io::Error),
}

struct Worker {
    id: CoreId,
    online: AtomicBool,
    to_worker: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Worker {
    fn spawn(id: CoreId) -> Result<Self, CoreError> {
        let (to_worker, mut from_pool) = mpsc::unbounded_channel::<Job>();

        let handle = thread::Builder::new().name(format!("netrw-core-{id}")).spawn(move || {
            CURRENT_CORE.with(|core| core.set(Some(id)));

            // Queued jobs still run after the pool hangs up, so a drain that was
            // accepted before offlining is never lost.
            while let Some(job) = from_pool.blocking_recv() {
                job();
            }

            debug!(core = %id, "core worker exited");
        })?;

        Ok(Self {
            id,
            online: AtomicBool::new(true),
            to_worker: Mutex::new(Some(to_worker)),
            handle: Mutex::new(Some(handle)),
        })
    }

    fn send(&self, job: Job) -> Result<(), CoreError> {
        if !self.online.load(Ordering::Acquire) {
            return Err(CoreError::Offline(self.id));
        }

        let guard = self.to_worker.lock();
        let Some(tx) = guard.as_ref() else {
            return Err(CoreError::Offline(self.id));
        };

        tx.send(job).map_err(|_| CoreError::Offline(self.id))
    }

    fn stop(&self) {
        self.online.store(false, Ordering::Release);
        drop(self.to_worker.lock().take());

        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                error!(core = %self.id, "core worker panicked");
            }
        }
    }
}

/// A fixed set of execution cores. Each core is a dedicated OS thread with its own
/// job queue, so work submitted to core `i` runs to completion on core `i`, in
/// submission order, and never interleaves with other work on that core.
///
/// The set is sized once and never grows; cores can only go offline.
pub struct Cores {
    workers: Box<[Worker]>,
}

impl Cores {
    /// Spawns `count` core workers (at least one).
    pub fn new(count: usize) -> Result<Self, CoreError> {
        let mut workers = Vec::with_capacity(count.max(1));
        for index in 0..count.max(1) {
            match Worker::spawn(CoreId::new(index)) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    workers.iter().for_each(Worker::stop);
                    return Err(e);
                }
            }
        }

        debug!(cores = workers.len(), "core workers started");

        Ok(Self { workers: workers.into_boxed_slice() })
    }

    /// Returns the number of cores, online or not.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Iterates over every core ID this set was created with.
    pub fn ids(&self) -> impl Iterator<Item = CoreId> + '_ {
        self.workers.iter().map(|w| w.id)
    }

    pub fn is_online(&self, core: CoreId) -> bool {
        self.workers.get(core.index()).is_some_and(|w| w.online.load(Ordering::Acquire))
    }

    /// Queues `f` on the given core without waiting for it to run.
    pub fn execute<F>(&self, core: CoreId, f: F) -> Result<(), CoreError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.worker(core)?.send(Box::new(f))
    }

    /// Runs `f` on the given core and waits for its result.
    ///
    /// Returns [`CoreError::Offline`] if the core is offline, or goes offline
    /// before it gets to run `f`.
    pub async fn run_on<F, R>(&self, core: CoreId, f: F) -> Result<R, CoreError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        self.execute(core, move || {
            let _ = tx.send(f());
        })?;

        rx.await.map_err(|_| CoreError::Offline(core))
    }

    /// Takes a core offline. Jobs already queued on it still run; new jobs are
    /// rejected with [`CoreError::Offline`]. Blocks until the worker thread exits.
    pub fn take_offline(&self, core: CoreId) -> Result<(), CoreError> {
        let worker = self.worker(core)?;
        worker.stop();
        debug!(core = %core, "core taken offline");

        Ok(())
    }

    /// Takes every core offline and joins all worker threads.
    pub fn shutdown(&self) {
        self.workers.iter().for_each(Worker::stop);
    }

    fn worker(&self, core: CoreId) -> Result<&Worker, CoreError> {
        self.workers.get(core.index()).ok_or(CoreError::Unknown(core))
    }
}

impl Drop for Cores {
    fn drop(&mut self) {
        self.shutdown();
    }
}
