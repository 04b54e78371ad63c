//! Potlink host simulator.
//!
//! Runs one node on the host with simulated knobs and LEDs:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  SimHardware (knobs, LEDs)      ConfigStore (JSON file)       │
//! │  QueuePort × 3 (Local, Upstream, Downstream)                  │
//! │                                                               │
//! │  ─────────────── Port Trait Boundary ───────────────          │
//! │                                                               │
//! │  Node ── Router ── DeviceCore ── Scheduler                    │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `potlink-sim [config.json] [run_ms]`.  A scripted host plays
//! notes into the Local port and a scripted neighbour sends traffic up
//! from Downstream; everything the node sends on Local is logged.

use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use potlink::adapters::sim::{SimHardware, Sweep};
use potlink::adapters::store::ConfigStore;
use potlink::adapters::time::MonotonicClock;
use potlink::app::device::DeviceCore;
use potlink::app::node::Node;
use potlink::chain::message::RoutedMessage;
use potlink::chain::router::Router;
use potlink::chain::transport::QueuePort;
use potlink::config::{CHANNEL_COUNT, DeviceConfig, NodeSettings};

/// Interval between scripted host events.
const SCRIPT_PERIOD_MS: u32 = 1_500;

type SimNode = Node<QueuePort<16>, QueuePort<16>, QueuePort<16>, SimHardware>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "potlink.json".into());
    let run_ms: Option<u32> = args
        .next()
        .map(|s| s.parse())
        .transpose()
        .context("run_ms must be a number of milliseconds")?;

    info!("Potlink simulator v{}", env!("CARGO_PKG_VERSION"));

    // ── Configuration ─────────────────────────────────────────
    let settings = NodeSettings::default();
    let mut store = ConfigStore::with_file(&config_path);
    let clock = MonotonicClock::new();

    let mut device: DeviceCore = DeviceCore::new(settings.clone(), DeviceConfig::default(), clock.now_ms());
    device.restore_config(&store);
    device
        .persist_config(&mut store)
        .map_err(potlink::Error::from)
        .context("saving configuration")?;

    let caps = device.capabilities().to_json().map_err(potlink::Error::from)?;
    info!("Capabilities: {}", caps);

    // ── Node ──────────────────────────────────────────────────
    let router = Router::new(
        QueuePort::new(),
        QueuePort::new(),
        QueuePort::new(),
        settings.router,
    );
    let sweeps = [
        Sweep {
            period_ms: 8_000,
            phase_ms: 0,
        },
        Sweep {
            period_ms: 13_000,
            phase_ms: 4_000,
        },
    ];
    let hw = SimHardware::new(sweeps, Duration::from_millis(1));
    let mut node: SimNode = Node::new(router, device, hw);

    // ── Main loop ─────────────────────────────────────────────
    let mut script_step = 0u32;
    let mut next_script = clock.now_ms();
    loop {
        let now = clock.now_ms();
        if run_ms.is_some_and(|limit| now >= limit) {
            break;
        }

        if now.wrapping_sub(next_script) < u32::MAX / 2 {
            play_script(&mut node, script_step)?;
            script_step = script_step.wrapping_add(1);
            next_script = now.wrapping_add(SCRIPT_PERIOD_MS);
        }

        node.hw_mut().advance(now);
        node.poll(now);

        while let Some(msg) = node.router_mut().local_mut().take_sent() {
            info!(
                "Local <- addr {} {:?} {:02x?}",
                msg.address,
                msg.kind,
                msg.payload.as_slice()
            );
        }
        // Upstream is unconnected in the simulator.
        node.router_mut().upstream_mut().drain_sent().for_each(drop);
        while let Some(msg) = node.router_mut().downstream_mut().take_sent() {
            info!("Downstream <- addr {} {:02x?}", msg.address, msg.payload.as_slice());
        }
    }

    info!("Router stats: {:?}", node.router().stats());
    Ok(())
}

/// One scripted event: note on, note off, neighbour traffic, message for
/// the next node down, all-notes-off.
fn play_script(node: &mut SimNode, step: u32) -> Result<()> {
    let note = 60 + (step / 5 % CHANNEL_COUNT as u32) as u8;
    let router = node.router_mut();
    match step % 5 {
        0 => {
            router
                .local_mut()
                .inject(RoutedMessage::midi_bytes(0, &[0x90, note, 100]).map_err(potlink::Error::from)?);
        }
        1 => {
            router
                .local_mut()
                .inject(RoutedMessage::midi_bytes(0, &[0x80, note, 0]).map_err(potlink::Error::from)?);
        }
        2 => {
            router
                .downstream_mut()
                .inject(RoutedMessage::midi_bytes(0, &[0xb0, 16, 64]).map_err(potlink::Error::from)?);
        }
        3 => {
            router
                .local_mut()
                .inject(RoutedMessage::midi_bytes(1, &[0x90, 60, 80]).map_err(potlink::Error::from)?);
        }
        _ => {
            router
                .local_mut()
                .inject(RoutedMessage::midi_bytes(0, &[0xb0, 123, 0]).map_err(potlink::Error::from)?);
        }
    }
    Ok(())
}
