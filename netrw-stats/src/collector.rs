use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use netrw_common::Cores;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use crate::{Shared, Summary};

/// Counters describing the collector's own activity.
#[derive(Debug, Default)]
pub struct CollectorStats {
    passes: AtomicU64,
    skipped_cores: AtomicU64,
}

impl CollectorStats {
    /// Number of completed collection passes.
    #[inline]
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    /// Number of per-core drains skipped because the core was unavailable.
    #[inline]
    pub fn skipped_cores(&self) -> u64 {
        self.skipped_cores.load(Ordering::Relaxed)
    }
}

/// Drains every core's counters into the global summary.
///
/// Each drain runs on the core it drains, so it never interleaves with that
/// core's packet hooks. Passes are serialized: a periodic firing and an
/// on-demand [`run_pass`](Collector::run_pass) never overlap.
pub(crate) struct Collector {
    shared: Arc<Shared>,
    cores: Arc<Cores>,
    interval: Duration,
    pass_lock: Mutex<()>,
    pub(crate) stats: CollectorStats,
}

impl Collector {
    pub(crate) fn new(shared: Arc<Shared>, cores: Arc<Cores>, interval: Duration) -> Self {
        Self { shared, cores, interval, pass_lock: Mutex::new(()), stats: CollectorStats::default() }
    }

    /// Runs one collection pass and returns what it drained.
    pub(crate) async fn run_pass(&self) -> Summary {
        let _pass = self.pass_lock.lock().await;
        let mut drained = Summary::default();

        for core in self.cores.ids() {
            let shared = Arc::clone(&self.shared);
            match self.cores.run_on(core, move || shared.bank.drain_local()).await {
                Ok(Some((rx, tx))) => {
                    self.shared.summary.fold_rx(&rx);
                    self.shared.summary.fold_tx(&tx);
                    drained.rx.fold(&rx);
                    drained.tx.fold(&tx);
                }
                Ok(None) => {
                    error!(core = %core, "drain did not run on a core worker");
                }
                Err(e) => {
                    warn!(core = %core, err = %e, "skipping drain, core unavailable");
                    self.stats.skipped_cores.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        self.stats.passes.fetch_add(1, Ordering::Relaxed);
        trace!(rx = ?drained.rx, tx = ?drained.tx, "collection pass done");

        drained
    }

    /// Starts the periodic chain: wait one interval, run a pass, and go again only
    /// while the gate is still on.
    pub(crate) fn spawn(self: Arc<Self>) -> CollectorTask {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            debug!(interval = ?self.interval, "collector started");

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(self.interval) => {}
                }

                // A pass that has started always runs to completion.
                self.run_pass().await;

                if !self.shared.gate.read() {
                    break;
                }
            }

            debug!("collector stopped");
        });

        CollectorTask { cancel, handle }
    }
}

/// Handle to a running collection chain.
pub(crate) struct CollectorTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl CollectorTask {
    /// Cancels the pending firing, if any, and waits for an in-flight pass to
    /// finish. Once this returns no pass from this chain is running or scheduled.
    pub(crate) async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            error!(err = ?e, "collector task failed");
        }
    }

    /// Cancels without waiting. Used where awaiting is impossible.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }
}
