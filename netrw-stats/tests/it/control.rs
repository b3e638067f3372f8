use std::{io, sync::Arc, time::Duration};

use netrw_common::CoreId;
use netrw_stats::{ControlError, ControlSurface, Direction, Entry, Netrw, NetrwError, NetrwOptions, NodeKind};
use netrw_wire::FrameBuilder;
use parking_lot::Mutex;

use crate::{deliver, repeat};

/// An in-memory control surface that can be told to refuse one path.
#[derive(Clone, Default)]
struct MemorySurface {
    nodes: Arc<Mutex<Vec<(String, NodeKind)>>>,
    refuse: Option<&'static str>,
}

impl MemorySurface {
    fn paths(&self) -> Vec<String> {
        self.nodes.lock().iter().map(|(p, _)| p.clone()).collect()
    }
}

impl ControlSurface for MemorySurface {
    fn create(&self, path: &str, kind: NodeKind) -> io::Result<()> {
        if self.refuse == Some(path) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, "node exists"));
        }
        self.nodes.lock().push((path.to_string(), kind));
        Ok(())
    }

    fn remove(&self, path: &str) {
        self.nodes.lock().retain(|(p, _)| p != path);
    }
}

fn options() -> NetrwOptions {
    NetrwOptions::default().cores(2).collect_interval(Duration::from_secs(60))
}

#[tokio::test]
async fn publishes_and_removes_entries() {
    let _ = tracing_subscriber::fmt::try_init();

    let surface = MemorySurface::default();
    let netrw = Netrw::start(options(), surface.clone()).await.unwrap();

    assert_eq!(surface.paths(), ["smsc95xx", "smsc95xx/enable", "smsc95xx/stats"]);
    assert_eq!(
        surface.nodes.lock()[1].1,
        NodeKind::Entry { mode: 0o644 },
    );

    netrw.shutdown().await;
    assert!(surface.paths().is_empty());
}

#[tokio::test]
async fn custom_root_directory() {
    let surface = MemorySurface::default();
    let netrw = Netrw::start(options().control_root("eth1"), surface.clone()).await.unwrap();

    assert_eq!(surface.paths(), ["eth1", "eth1/enable", "eth1/stats"]);

    netrw.shutdown().await;
}

#[tokio::test]
async fn failed_entry_unwinds_startup() {
    let _ = tracing_subscriber::fmt::try_init();

    let surface = MemorySurface { refuse: Some("smsc95xx/enable"), ..Default::default() };
    let err = Netrw::start(options(), surface.clone()).await.unwrap_err();

    match err {
        NetrwError::ResourceUnavailable { path, source } => {
            assert_eq!(path, "smsc95xx/enable");
            assert_eq!(source.kind(), io::ErrorKind::AlreadyExists);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(surface.paths().is_empty());
}

#[tokio::test]
async fn enable_entry_round_trip() {
    let netrw = Netrw::start(options(), MemorySurface::default()).await.unwrap();

    assert_eq!(netrw.read_entry(Entry::Enable), "0\n");

    assert_eq!(netrw.write_entry(Entry::Enable, b"1\n").await.unwrap(), 2);
    assert!(netrw.is_enabled());
    assert_eq!(netrw.read_entry(Entry::Enable), "1\n");

    // Rewriting the current value is accepted and changes nothing.
    assert_eq!(netrw.write_entry(Entry::Enable, b"1").await.unwrap(), 1);
    assert!(netrw.is_enabled());

    assert_eq!(netrw.write_entry(Entry::Enable, b"0\n").await.unwrap(), 2);
    assert_eq!(netrw.read_entry(Entry::Enable), "0\n");

    netrw.shutdown().await;
}

#[tokio::test]
async fn invalid_writes_leave_state_untouched() {
    let netrw = Netrw::start(options(), MemorySurface::default()).await.unwrap();
    netrw.set_enabled(true).await;

    for input in [&b"on"[..], b"2\n", b"", b"01"] {
        let err = netrw.write_entry(Entry::Enable, input).await.unwrap_err();
        assert!(matches!(err, ControlError::InvalidInput(_)));
        assert!(netrw.is_enabled());
    }

    let oversized = [b'0'; 33];
    assert!(netrw.write_entry(Entry::Enable, &oversized).await.is_err());
    assert!(netrw.is_enabled());

    let err = netrw.write_entry(Entry::Stats, b"0").await.unwrap_err();
    assert!(matches!(err, ControlError::ReadOnly(Entry::Stats)));
    assert!(netrw.is_enabled());

    netrw.shutdown().await;
}

#[tokio::test]
async fn write_limit_is_configurable() {
    let netrw =
        Netrw::start(options().control_write_limit(2), MemorySurface::default()).await.unwrap();

    assert!(netrw.write_entry(Entry::Enable, b"1\n").await.is_ok());
    assert!(netrw.write_entry(Entry::Enable, b"0\n\n").await.is_err());
    assert!(netrw.is_enabled());

    netrw.shutdown().await;
}

#[tokio::test]
async fn stats_entry_reports_both_directions() {
    let netrw = Netrw::start(options(), MemorySurface::default()).await.unwrap();
    netrw.write_entry(Entry::Enable, b"1\n").await.unwrap();

    let multicast = FrameBuilder::ipv4([10, 0, 0, 1].into(), [224, 0, 0, 1].into()).build();
    deliver(&netrw, CoreId::new(0), Direction::Rx, repeat(FrameBuilder::arp().build(), 3)).await;
    deliver(&netrw, CoreId::new(1), Direction::Tx, repeat(multicast, 2)).await;
    netrw.collect_now().await;

    let report = netrw.read_entry(Entry::Stats);
    let (tx, rx) = report.split_once("\n\n").unwrap();

    assert!(tx.starts_with(".-* Transmit\n"));
    assert!(tx.contains("|  ARP packets  : (0)\n"));
    assert!(tx.contains("|  L3 Multicasts: (2)\n"));
    assert!(rx.starts_with(".-* Receive\n"));
    assert!(rx.contains("|  ARP packets  : (3)\n"));
    assert!(rx.ends_with(":\n'\n"));

    netrw.shutdown().await;
}
