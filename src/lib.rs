//! Potlink node library.
//!
//! A chainable MIDI control node: analog knobs are sampled, smoothed and
//! quantized, changes are emitted as control changes, inbound notes drive
//! indicator LEDs, and routed messages hop along a chain of nodes.
//!
//! The pure-logic modules (`app`, `chain`, `scheduler`, `sensors`) are
//! hardware-agnostic; `drivers` targets `embedded-hal` and `adapters`
//! holds the host-side implementations used by the simulator and tests.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod chain;
pub mod config;
pub mod drivers;
pub mod scheduler;
pub mod sensors;

mod error;

pub use error::{ConfigError, Error, LinkError, Result};
