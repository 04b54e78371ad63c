//! Indicator drivers and the in-memory indicator state they render.

pub mod indicators;
pub mod status_led;
