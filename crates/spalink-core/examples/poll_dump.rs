//! Poll a controller and dump property changes.
//!
//! Usage:
//!   cargo run --example poll_dump -- /dev/ttyUSB0
//!   cargo run --example poll_dump -- --demo

use std::time::{Duration, Instant};

use spalink_core::demo::DemoController;
use spalink_core::engine::{EngineConfig, SpaLink, TickOutcome};
use spalink_core::protocol::{configure_port, open_port, SerialTransport, Transport};
use spalink_core::registers::PropertyId;

fn run<T: Transport>(mut engine: SpaLink<T>) -> anyhow::Result<()> {
    for id in PropertyId::all() {
        engine.subscribe(
            id,
            Box::new(|id, value| {
                println!("{:>28} = {}", id.name(), value);
            }),
        );
    }

    for _ in 0..100 {
        if let TickOutcome::PollFailed(e) = engine.tick(Instant::now()) {
            eprintln!("poll failed: {e}");
        }
        std::thread::sleep(Duration::from_millis(200));
    }

    println!(
        "ready={} variant={:?} counters={:?}",
        engine.is_ready(),
        engine.variant(),
        engine.counters()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spalink_core=debug".into()),
        )
        .init();

    let arg = std::env::args().nth(1).unwrap_or_else(|| "--demo".into());
    let config = EngineConfig {
        steady_interval: Duration::from_secs(5),
    };

    if arg == "--demo" {
        run(SpaLink::new(DemoController::new(), config))
    } else {
        let mut port = open_port(&arg, None)?;
        configure_port(port.as_mut())?;
        run(SpaLink::new(SerialTransport::new(port), config))
    }
}
