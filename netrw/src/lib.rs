#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! Live L2/L3 traffic statistics and flow tracing for a network interface.
//!
//! [`Netrw`] owns a fixed set of cores, each with its own RX/TX counters that the
//! packet [`Hooks`] bump without locking. A collector drains every core on the
//! core itself and folds the result into a global [`Summary`], every two seconds
//! by default, while the gate is open. [`FlowTracer`] logs a 5-tuple line per
//! IPv4 packet at the ingress and egress points.

pub use netrw_common::{available_cores, CoreError, CoreId, Cores};
pub use netrw_stats::*;
pub use netrw_trace::{
    ChannelSink, FlowRecord, FlowTracer, LogSink, SinkError, TracePoint, TracerOptions, TracerStats,
    TracingSink, Transport, Verdict,
};
pub use netrw_wire as wire;
