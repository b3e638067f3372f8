#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use std::{io, time::Duration};

use netrw_common::{available_cores, CoreError};
use thiserror::Error;

mod bank;
mod classify;
mod collector;
mod context;
pub mod control;
mod gate;
mod hooks;
mod stats;
mod summary;

use bank::PerCoreBank;
pub use classify::{classify, Category};
pub use collector::CollectorStats;
pub use context::Netrw;
pub use control::{ControlError, ControlSurface, Entry, NodeKind, NoopSurface, Report};
pub use gate::EnableGate;
pub use hooks::{Direction, Hooks};
pub use stats::StatSet;
pub use summary::Summary;
use summary::GlobalSummary;

/// Interval between two collection passes.
const DEFAULT_COLLECT_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum NetrwError {
    #[error("Control node {path} unavailable: {source}")]
    ResourceUnavailable {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
    #[error("Control error: {0}")]
    Control(#[from] ControlError),
}

#[derive(Debug, Clone)]
pub struct NetrwOptions {
    /// Number of cores to run. Every core gets its own counter slot.
    cores: usize,
    /// Time between two collection passes.
    collect_interval: Duration,
    /// Whether the gate is opened (and collection started) right after startup.
    start_enabled: bool,
    /// Name of the control directory on the [`ControlSurface`].
    control_root: String,
    /// Largest accepted write to the `enable` entry, in bytes.
    control_write_limit: usize,
}

impl Default for NetrwOptions {
    fn default() -> Self {
        Self {
            cores: available_cores(),
            collect_interval: DEFAULT_COLLECT_INTERVAL,
            start_enabled: false,
            control_root: control::DEFAULT_CONTROL_ROOT.to_string(),
            control_write_limit: control::DEFAULT_WRITE_LIMIT,
        }
    }
}

impl NetrwOptions {
    /// Sets the number of cores. Defaults to the available parallelism.
    pub fn cores(mut self, cores: usize) -> Self {
        self.cores = cores;
        self
    }

    /// Sets the interval between collection passes. Defaults to 2 seconds.
    pub fn collect_interval(mut self, interval: Duration) -> Self {
        self.collect_interval = interval;
        self
    }

    /// Opens the gate as soon as startup completes.
    pub fn start_enabled(mut self, enabled: bool) -> Self {
        self.start_enabled = enabled;
        self
    }

    /// Sets the name of the control directory.
    pub fn control_root(mut self, root: impl Into<String>) -> Self {
        self.control_root = root.into();
        self
    }

    /// Sets the largest accepted write to the `enable` entry.
    pub fn control_write_limit(mut self, limit: usize) -> Self {
        self.control_write_limit = limit;
        self
    }
}

/// State shared between the packet hooks, the collector and the control path.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) gate: EnableGate,
    pub(crate) bank: PerCoreBank,
    pub(crate) summary: GlobalSummary,
}

impl Shared {
    pub(crate) fn new(cores: usize) -> Self {
        Self { gate: EnableGate::new(), bank: PerCoreBank::new(cores), summary: GlobalSummary::default() }
    }
}
