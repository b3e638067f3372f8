use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};
use tracing::{debug, info};

use crate::FlowRecord;

/// Tracing target flow lines are emitted under.
pub const TRACE_TARGET: &str = "netrw::trace";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("Log sink is full")]
    Full,
    #[error("Log sink is closed")]
    Closed,
}

/// Where traced lines go. Implementations must never block: a sink that cannot
/// take a line right away returns an error and the line is dropped.
pub trait LogSink: Send + Sync {
    fn try_log(&self, record: FlowRecord) -> Result<(), SinkError>;
}

/// Writes every line straight to `tracing` at `INFO`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn try_log(&self, record: FlowRecord) -> Result<(), SinkError> {
        info!(target: TRACE_TARGET, "{record}");
        Ok(())
    }
}

/// A bounded queue in front of a writer task. The packet path only ever does a
/// `try_send`; a full queue drops the line.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<FlowRecord>,
    dropped: AtomicU64,
}

impl ChannelSink {
    /// Creates a sink and hands back the receiving end of its queue.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<FlowRecord>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, dropped: AtomicU64::new(0) }, rx)
    }

    /// Creates a sink whose lines are written to `tracing` by a spawned task.
    /// The task ends once the sink is dropped, returning how many lines it wrote.
    pub fn spawn(capacity: usize) -> (Self, JoinHandle<u64>) {
        let (sink, mut rx) = Self::new(capacity);

        let writer = tokio::spawn(async move {
            let mut written = 0u64;
            while let Some(record) = rx.recv().await {
                info!(target: TRACE_TARGET, "{record}");
                written += 1;
            }

            debug!(written, "trace writer finished");
            written
        });

        (sink, writer)
    }

    /// Lines dropped because the queue was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl LogSink for ChannelSink {
    fn try_log(&self, record: FlowRecord) -> Result<(), SinkError> {
        self.tx.try_send(record).map_err(|e| {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            match e {
                TrySendError::Full(_) => SinkError::Full,
                TrySendError::Closed(_) => SinkError::Closed,
            }
        })
    }
}
