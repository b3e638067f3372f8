use std::{net::Ipv4Addr, sync::Arc, time::Duration};

use bytes::Bytes;
use rand::Rng;

use netrw::{
    wire::{FrameBuilder, PacketView},
    Direction, Entry, FlowTracer, Netrw, NetrwOptions, NoopSurface, TracerOptions,
};

const ROUNDS: usize = 5;
const FRAMES_PER_CORE: usize = 64;

fn random_frame(rng: &mut impl Rng) -> Bytes {
    let source = Ipv4Addr::new(10, 0, 0, rng.gen_range(1..255));
    match rng.gen_range(0..5) {
        0 => FrameBuilder::arp().build(),
        1 => FrameBuilder::ipv4(source, Ipv4Addr::BROADCAST).udp(68, 67).build(),
        2 => FrameBuilder::ipv4(source, Ipv4Addr::new(224, 0, 0, 251)).udp(5353, 5353).build(),
        3 => FrameBuilder::ipv4(source, Ipv4Addr::new(10, 0, 1, 1)).tcp(rng.gen(), 443).build(),
        _ => FrameBuilder::ipv4(source, Ipv4Addr::new(1, 1, 1, 1)).udp(rng.gen(), 53).build(),
    }
}

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt::try_init();

    let netrw = Netrw::start(
        NetrwOptions::default().cores(4).collect_interval(Duration::from_millis(500)),
        NoopSurface,
    )
    .await
    .unwrap();

    let (tracer, writer) = FlowTracer::spawn(TracerOptions::default().sink_capacity(256));
    let tracer = Arc::new(tracer);

    netrw.write_entry(Entry::Enable, b"1\n").await.unwrap();

    let mut rng = rand::thread_rng();
    for _ in 0..ROUNDS {
        for core in netrw.cores().ids().collect::<Vec<_>>() {
            let frames: Vec<_> = (0..FRAMES_PER_CORE).map(|_| random_frame(&mut rng)).collect();
            let direction = if rng.gen_bool(0.5) { Direction::Rx } else { Direction::Tx };
            let hooks = netrw.hooks();
            let tracer = Arc::clone(&tracer);

            netrw
                .cores()
                .execute(core, move || {
                    for frame in &frames {
                        let Ok(pkt) = PacketView::parse(frame) else { continue };
                        match direction {
                            Direction::Rx => {
                                tracer.rx(&pkt);
                                hooks.on_rx(&pkt);
                            }
                            Direction::Tx => {
                                hooks.on_tx(&pkt);
                                tracer.tx(&pkt);
                            }
                        }
                    }
                })
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    netrw.collect_now().await;
    println!("{}", netrw.read_entry(Entry::Stats));
    println!(
        "traced {} lines, dropped {}",
        tracer.stats().traced(),
        tracer.stats().dropped()
    );

    netrw.shutdown().await;
    drop(tracer);
    let written = writer.await.unwrap();
    tracing::info!(written, "done");
}
