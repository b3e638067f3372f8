use std::sync::Arc;

use netrw_common::{CoreId, Cores};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    collector::{Collector, CollectorTask},
    control::{self, ControlSurface, Entry, Registration},
    ControlError, CollectorStats, Hooks, NetrwError, NetrwOptions, Report, Shared, StatSet, Summary,
};

/// A running statistics instance: the cores, their counter bank, the gate, the
/// global summary, the collector and the published control entries.
///
/// There is one of these per interface. Everything it owns lives until
/// [`shutdown`](Netrw::shutdown), which stops collection and joins any pass in
/// flight before anything is released.
pub struct Netrw {
    options: NetrwOptions,
    shared: Arc<Shared>,
    cores: Arc<Cores>,
    collector: Arc<Collector>,
    /// The running collection chain. The lock also serializes gate transitions.
    chain: Mutex<Option<CollectorTask>>,
    surface: Arc<dyn ControlSurface>,
    registration: parking_lot::Mutex<Option<Registration>>,
}

impl Netrw {
    /// Starts an instance with the given options and publishes its control entries
    /// on `surface`.
    ///
    /// Fails with [`NetrwError::ResourceUnavailable`] if a control node cannot be
    /// created; nothing stays published and every core is stopped in that case.
    pub async fn start<S>(options: NetrwOptions, surface: S) -> Result<Self, NetrwError>
    where
        S: ControlSurface,
    {
        let cores = Arc::new(Cores::new(options.cores)?);
        let surface: Arc<dyn ControlSurface> = Arc::new(surface);

        let registration = match Registration::create(surface.as_ref(), &options.control_root) {
            Ok(registration) => registration,
            Err((path, source)) => {
                let c = Arc::clone(&cores);
                let _ = tokio::task::spawn_blocking(move || c.shutdown()).await;
                return Err(NetrwError::ResourceUnavailable { path, source });
            }
        };

        let shared = Arc::new(Shared::new(cores.len()));
        let collector = Arc::new(Collector::new(
            Arc::clone(&shared),
            Arc::clone(&cores),
            options.collect_interval,
        ));

        let netrw = Self {
            shared,
            cores,
            collector,
            chain: Mutex::new(None),
            surface,
            registration: parking_lot::Mutex::new(Some(registration)),
            options,
        };

        info!(
            cores = netrw.cores.len(),
            interval = ?netrw.options.collect_interval,
            root = %netrw.options.control_root,
            "netrw started"
        );

        if netrw.options.start_enabled {
            netrw.set_enabled(true).await;
        }

        Ok(netrw)
    }

    /// Packet hooks bound to this instance.
    pub fn hooks(&self) -> Hooks {
        Hooks { shared: Arc::clone(&self.shared) }
    }

    /// The cores packet hooks run on.
    pub fn cores(&self) -> &Arc<Cores> {
        &self.cores
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.shared.gate.read()
    }

    /// Opens or closes the gate and returns its previous state.
    ///
    /// Opening starts the periodic collector. Closing cancels its pending firing and
    /// waits for an in-flight pass, so no pass runs after this returns. Setting
    /// the current state does nothing.
    pub async fn set_enabled(&self, enabled: bool) -> bool {
        let mut chain = self.chain.lock().await;

        let previous = self.shared.gate.write(enabled);
        if previous == enabled {
            return previous;
        }

        if enabled {
            *chain = Some(Arc::clone(&self.collector).spawn());
            debug!("gate opened");
        } else {
            if let Some(task) = chain.take() {
                task.stop().await;
            }
            debug!("gate closed");
        }

        previous
    }

    /// Runs one collection pass now and returns what it drained.
    ///
    /// This runs whatever the gate state. Counts recorded before the gate was
    /// closed and not yet collected are folded in, so a pass after disabling
    /// flushes them rather than leaving them behind.
    pub async fn collect_now(&self) -> Summary {
        self.collector.run_pass().await
    }

    /// A copy of the global totals.
    pub fn read_summary(&self) -> Summary {
        self.shared.summary.snapshot()
    }

    /// A core's (rx, tx) counters that have not been collected yet, read on that
    /// core. Returns `None` if the core is unknown or offline.
    pub async fn pending(&self, core: CoreId) -> Option<(StatSet, StatSet)> {
        let shared = Arc::clone(&self.shared);
        self.cores.run_on(core, move || shared.bank.peek_local()).await.ok().flatten()
    }

    pub fn collector_stats(&self) -> &CollectorStats {
        &self.collector.stats
    }

    /// Reads a control entry.
    pub fn read_entry(&self, entry: Entry) -> String {
        match entry {
            Entry::Enable => control::render_enable(self.is_enabled()),
            Entry::Stats => Report(self.read_summary()).to_string(),
        }
    }

    /// Writes a control entry and returns the number of bytes consumed.
    pub async fn write_entry(&self, entry: Entry, input: &[u8]) -> Result<usize, ControlError> {
        if !entry.is_writable() {
            return Err(ControlError::ReadOnly(entry));
        }

        let enabled = control::parse_enable(input, self.options.control_write_limit)?;
        self.set_enabled(enabled).await;

        Ok(input.len())
    }

    /// Closes the gate, joins the collector, removes the control entries and stops
    /// every core.
    pub async fn shutdown(self) {
        self.set_enabled(false).await;

        if let Some(mut registration) = self.registration.lock().take() {
            registration.remove(self.surface.as_ref());
        }

        let cores = Arc::clone(&self.cores);
        let _ = tokio::task::spawn_blocking(move || cores.shutdown()).await;

        info!("netrw stopped");
    }
}

impl Drop for Netrw {
    fn drop(&mut self) {
        // Without `shutdown` nothing can be awaited here: close the gate so the
        // chain ends after its current pass, and cancel any pending firing.
        self.shared.gate.write(false);
        if let Some(task) = self.chain.get_mut().take() {
            task.cancel();
        }
        if let Some(mut registration) = self.registration.get_mut().take() {
            registration.remove(self.surface.as_ref());
        }
    }
}

impl std::fmt::Debug for Netrw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Netrw")
            .field("options", &self.options)
            .field("enabled", &self.is_enabled())
            .field("cores", &self.cores.len())
            .finish()
    }
}
