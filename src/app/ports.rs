//! Port traits — the hexagonal boundary between the node core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DeviceCore / Router (domain)
//! ```
//!
//! Driven adapters (analog inputs, indicators, message sinks, config
//! storage) implement these traits.  The [`DeviceCore`](super::device::DeviceCore)
//! and [`Node`](super::node::Node) consume them via generics, so the domain
//! core never touches hardware directly.

use midi_msg::MidiMsg;

use crate::config::ConfigRecord;
use crate::drivers::indicators::IndicatorState;
use crate::error::ConfigError;

// ───────────────────────────────────────────────────────────────
// Analog input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the sampling task calls this once per channel per tick.
pub trait AnalogPort {
    /// Raw position of `channel` as a fraction of full scale.
    ///
    /// Values outside `[0, 1]` are tolerated; the sampler bank clamps them.
    fn read_fraction(&mut self, channel: usize) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Message ports (domain ↔ router)
// ───────────────────────────────────────────────────────────────

/// Where the device core's outgoing protocol messages go.
///
/// The [`Router`](crate::chain::router::Router) implements this by copying
/// every message to both Local and Upstream.
pub trait MessageSink {
    fn send(&mut self, msg: &MidiMsg);
}

/// Receives protocol messages addressed to this device.
pub trait MessageHandler {
    fn handle_message(&mut self, msg: &MidiMsg);
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → LEDs)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the visual indicators.
///
/// Called once per poll with the full indicator state; implementations
/// only push what changed to the hardware.
pub trait IndicatorPort {
    fn show(&mut self, state: &IndicatorState);
}

// ───────────────────────────────────────────────────────────────
// Low-power wait
// ───────────────────────────────────────────────────────────────

/// Entered when both the router and the device core report idle.
///
/// On hardware this is a wait-for-interrupt; the next timer or link
/// interrupt resumes the poll loop.
pub trait IdleWait {
    fn wait(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the device configuration record.
///
/// The storage format is owned by the implementation; the core only
/// sees [`ConfigRecord`]s and clamps whatever it is given.
pub trait ConfigPort {
    /// Returns [`ConfigError::NotFound`] on first boot.
    fn load(&self) -> Result<ConfigRecord, ConfigError>;

    fn save(&mut self, record: &ConfigRecord) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the device core)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a periodic task is due.
pub trait TaskDelegate {
    fn on_task_due(&mut self, task: TaskId, now_ms: u32);
}

/// The periodic tasks the node runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskId {
    /// Feed every sampler with a fresh raw reading.
    Sample,
    /// Run the emission pass.
    Emit,
}
