use std::{
    net::Ipv4Addr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use futures::future::join_all;
use netrw_common::CoreId;
use netrw_stats::{Direction, Netrw, NetrwOptions, NoopSurface, StatSet, Summary};
use netrw_wire::{EtherTypes, FrameBuilder};
use rand::Rng;

use crate::{deliver, repeat};

fn unicast() -> bytes::Bytes {
    FrameBuilder::ipv4([10, 0, 0, 1].into(), [10, 0, 0, 2].into()).tcp(1234, 80).build()
}

async fn start(cores: usize, interval: Duration) -> Netrw {
    let _ = tracing_subscriber::fmt::try_init();

    Netrw::start(NetrwOptions::default().cores(cores).collect_interval(interval), NoopSurface)
        .await
        .unwrap()
}

#[tokio::test]
async fn disabled_hooks_count_nothing_then_enabled_hooks_count() {
    let netrw = start(2, Duration::from_secs(60)).await;
    let core = CoreId::new(0);

    assert!(!netrw.is_enabled());
    deliver(&netrw, core, Direction::Rx, repeat(FrameBuilder::arp().build(), 10)).await;
    deliver(&netrw, core, Direction::Rx, repeat(unicast(), 5)).await;
    netrw.collect_now().await;
    assert_eq!(netrw.read_summary().rx, StatSet::default());

    netrw.set_enabled(true).await;
    deliver(&netrw, core, Direction::Rx, repeat(FrameBuilder::arp().build(), 10)).await;
    deliver(&netrw, core, Direction::Rx, repeat(unicast(), 5)).await;
    netrw.collect_now().await;

    assert_eq!(
        netrw.read_summary().rx,
        StatSet { l2_arp: 10, l3_unicast: 5, l3_broadcast: 0, l3_multicast: 0 }
    );
    assert_eq!(netrw.read_summary().tx, StatSet::default());

    netrw.shutdown().await;
}

#[tokio::test]
async fn random_traffic_on_every_core_is_counted_exactly_once() {
    let netrw = start(4, Duration::from_secs(60)).await;
    netrw.set_enabled(true).await;

    let kinds = [
        FrameBuilder::arp().build(),
        unicast(),
        FrameBuilder::ipv4([10, 0, 0, 1].into(), Ipv4Addr::BROADCAST).udp(68, 67).build(),
        FrameBuilder::ipv4([10, 0, 0, 1].into(), [239, 1, 1, 1].into()).udp(9, 9).build(),
        FrameBuilder::ethertype(EtherTypes::Ipv6).build(),
    ];

    let mut rng = rand::thread_rng();
    let mut expected = Summary::default();

    for round in 0..5 {
        let mut batches = Vec::new();
        for core in netrw.cores().ids() {
            let direction = if rng.gen_bool(0.5) { Direction::Rx } else { Direction::Tx };
            let frames: Vec<_> =
                (0..rng.gen_range(0..200)).map(|_| kinds[rng.gen_range(0..kinds.len())].clone()).collect();

            let side = match direction {
                Direction::Rx => &mut expected.rx,
                Direction::Tx => &mut expected.tx,
            };
            for frame in &frames {
                match frame {
                    f if *f == kinds[0] => side.l2_arp += 1,
                    f if *f == kinds[1] => side.l3_unicast += 1,
                    f if *f == kinds[2] => side.l3_broadcast += 1,
                    f if *f == kinds[3] => side.l3_multicast += 1,
                    _ => {}
                }
            }

            batches.push((core, direction, frames));
        }

        join_all(batches.into_iter().map(|(core, dir, frames)| deliver(&netrw, core, dir, frames))).await;

        // Collect on some rounds only, so counts also accumulate across passes.
        if round % 2 == 0 {
            netrw.collect_now().await;
        }
    }

    netrw.collect_now().await;
    assert_eq!(netrw.read_summary(), expected);

    for core in netrw.cores().ids() {
        let (rx, tx) = netrw.pending(core).await.unwrap();
        assert!(rx.is_zero() && tx.is_zero());
    }

    netrw.shutdown().await;
}

#[tokio::test]
async fn periodic_collector_folds_without_manual_passes() {
    let netrw = start(2, Duration::from_millis(20)).await;
    netrw.set_enabled(true).await;

    deliver(&netrw, CoreId::new(1), Direction::Tx, repeat(unicast(), 7)).await;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while netrw.read_summary().tx.l3_unicast < 7 {
        assert!(tokio::time::Instant::now() < deadline, "collector never folded");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(netrw.read_summary().tx.l3_unicast, 7);
    assert!(netrw.collector_stats().passes() >= 1);

    netrw.shutdown().await;
}

#[tokio::test]
async fn enabling_twice_is_a_single_transition() {
    let netrw = start(1, Duration::from_millis(10)).await;

    assert!(!netrw.set_enabled(true).await);
    assert!(netrw.set_enabled(true).await);
    assert!(netrw.is_enabled());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(netrw.collector_stats().passes() >= 1);

    assert!(netrw.set_enabled(false).await);
    assert!(!netrw.set_enabled(false).await);
    assert!(!netrw.is_enabled());

    // A second chain left running would keep adding passes.
    let passes = netrw.collector_stats().passes();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(netrw.collector_stats().passes(), passes);

    netrw.shutdown().await;
}

#[tokio::test]
async fn disable_waits_for_in_flight_pass() {
    let netrw = start(2, Duration::from_millis(5)).await;
    netrw.set_enabled(true).await;
    deliver(&netrw, CoreId::new(0), Direction::Rx, repeat(unicast(), 4)).await;

    // Hold core 1 so the next pass stalls on its drain.
    let done = Arc::new(AtomicBool::new(false));
    let d = Arc::clone(&done);
    netrw
        .cores()
        .execute(CoreId::new(1), move || {
            std::thread::sleep(Duration::from_millis(300));
            d.store(true, Ordering::SeqCst);
        })
        .unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!done.load(Ordering::SeqCst));

    netrw.set_enabled(false).await;
    assert!(done.load(Ordering::SeqCst), "disable returned while a pass was still draining");

    let passes = netrw.collector_stats().passes();
    let summary = netrw.read_summary();
    assert_eq!(summary.rx.l3_unicast, 4);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(netrw.collector_stats().passes(), passes);
    assert_eq!(netrw.read_summary(), summary);

    netrw.shutdown().await;
}

#[tokio::test]
async fn collect_now_flushes_counts_left_by_disable() {
    let netrw = start(1, Duration::from_secs(60)).await;
    let core = CoreId::new(0);

    netrw.set_enabled(true).await;
    deliver(&netrw, core, Direction::Rx, repeat(FrameBuilder::arp().build(), 3)).await;
    netrw.set_enabled(false).await;

    assert_eq!(netrw.read_summary().rx, StatSet::default());
    assert_eq!(netrw.pending(core).await.unwrap().0.l2_arp, 3);

    let drained = netrw.collect_now().await;
    assert_eq!(drained.rx.l2_arp, 3);
    assert_eq!(netrw.read_summary().rx.l2_arp, 3);
    assert!(netrw.pending(core).await.unwrap().0.is_zero());

    netrw.shutdown().await;
}

#[tokio::test]
async fn nothing_is_folded_after_disable_returns() {
    let netrw = start(2, Duration::from_millis(5)).await;
    netrw.set_enabled(true).await;

    deliver(&netrw, CoreId::new(0), Direction::Rx, repeat(unicast(), 3)).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    netrw.set_enabled(false).await;

    let passes = netrw.collector_stats().passes();
    let before = netrw.read_summary();

    // Packets keep arriving, but the gate is closed: hooks are no-ops.
    deliver(&netrw, CoreId::new(0), Direction::Rx, repeat(unicast(), 100)).await;
    deliver(&netrw, CoreId::new(1), Direction::Tx, repeat(FrameBuilder::arp().build(), 100)).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(netrw.collector_stats().passes(), passes);
    assert_eq!(netrw.read_summary(), before);
    assert!(netrw.pending(CoreId::new(0)).await.unwrap().0.is_zero());
    assert!(netrw.pending(CoreId::new(1)).await.unwrap().1.is_zero());

    netrw.shutdown().await;
}

#[tokio::test]
async fn offline_core_contributes_nothing() {
    let netrw = start(3, Duration::from_secs(60)).await;
    netrw.set_enabled(true).await;

    deliver(&netrw, CoreId::new(0), Direction::Rx, repeat(unicast(), 2)).await;
    deliver(&netrw, CoreId::new(2), Direction::Rx, repeat(unicast(), 9)).await;
    netrw.cores().take_offline(CoreId::new(2)).unwrap();

    let drained = netrw.collect_now().await;
    assert_eq!(drained.rx.l3_unicast, 2);
    assert_eq!(netrw.read_summary().rx.l3_unicast, 2);
    assert_eq!(netrw.collector_stats().skipped_cores(), 1);

    netrw.shutdown().await;
}

#[tokio::test]
async fn start_enabled_runs_the_collector() {
    let _ = tracing_subscriber::fmt::try_init();

    let netrw = Netrw::start(
        NetrwOptions::default().cores(1).collect_interval(Duration::from_millis(10)).start_enabled(true),
        NoopSurface,
    )
    .await
    .unwrap();

    assert!(netrw.is_enabled());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(netrw.collector_stats().passes() >= 1);

    netrw.shutdown().await;
}
