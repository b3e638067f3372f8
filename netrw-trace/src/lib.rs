#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! Per-packet flow tracing.
//!
//! A [`FlowTracer`] sits at two points of the packet path: right after ingress
//! ([`TracePoint::Rx`]) and right before egress ([`TracePoint::Tx`]). For every
//! IPv4 packet it hands one [`FlowRecord`] to a [`LogSink`]. It never drops,
//! alters or redirects traffic: every call returns [`Verdict::Accept`].
//!
//! Non-IPv4 frames are skipped and produce no line.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use netrw_wire::PacketView;
use tokio::task::JoinHandle;

mod record;
mod sink;

pub use record::{FlowRecord, Transport};
pub use sink::{ChannelSink, LogSink, SinkError, TracingSink, TRACE_TARGET};

const DEFAULT_SINK_CAPACITY: usize = 1024;

/// Where in the packet path a packet was traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TracePoint {
    /// Post-ingress, before any routing decision.
    Rx,
    /// Pre-egress, after every routing decision.
    Tx,
}

impl TracePoint {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Rx => "RX",
            Self::Tx => "TX",
        }
    }
}

impl fmt::Display for TracePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The decision handed back to the packet-filtering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
}

#[derive(Debug, Clone)]
pub struct TracerOptions {
    /// Number of lines the channel sink queues before it starts dropping.
    sink_capacity: usize,
}

impl Default for TracerOptions {
    fn default() -> Self {
        Self { sink_capacity: DEFAULT_SINK_CAPACITY }
    }
}

impl TracerOptions {
    pub fn sink_capacity(mut self, capacity: usize) -> Self {
        self.sink_capacity = capacity;
        self
    }
}

#[derive(Debug, Default)]
pub struct TracerStats {
    traced: AtomicU64,
    skipped: AtomicU64,
    dropped: AtomicU64,
}

impl TracerStats {
    /// Lines accepted by the sink.
    #[inline]
    pub fn traced(&self) -> u64 {
        self.traced.load(Ordering::Relaxed)
    }

    /// Frames that produced no line (non-IPv4).
    #[inline]
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Lines the sink refused.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

pub struct FlowTracer<S> {
    sink: S,
    stats: TracerStats,
}

impl FlowTracer<ChannelSink> {
    /// A tracer backed by a bounded queue and a writer task logging to `tracing`.
    pub fn spawn(options: TracerOptions) -> (Self, JoinHandle<u64>) {
        let (sink, writer) = ChannelSink::spawn(options.sink_capacity);
        (Self::new(sink), writer)
    }
}

impl<S: LogSink> FlowTracer<S> {
    pub fn new(sink: S) -> Self {
        Self { sink, stats: TracerStats::default() }
    }

    /// Traces one packet at `point`.
    #[inline]
    pub fn trace(&self, point: TracePoint, pkt: &PacketView<'_>) -> Verdict {
        let Some(record) = FlowRecord::from_packet(point, pkt) else {
            self.stats.skipped.fetch_add(1, Ordering::Relaxed);
            return Verdict::Accept;
        };

        match self.sink.try_log(record) {
            Ok(()) => self.stats.traced.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.stats.dropped.fetch_add(1, Ordering::Relaxed),
        };

        Verdict::Accept
    }

    /// Post-ingress interception point.
    #[inline]
    pub fn rx(&self, pkt: &PacketView<'_>) -> Verdict {
        self.trace(TracePoint::Rx, pkt)
    }

    /// Pre-egress interception point.
    #[inline]
    pub fn tx(&self, pkt: &PacketView<'_>) -> Verdict {
        self.trace(TracePoint::Tx, pkt)
    }

    pub fn stats(&self) -> &TracerStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S> fmt::Debug for FlowTracer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowTracer").field("stats", &self.stats).finish()
    }
}
