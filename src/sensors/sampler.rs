//! Channel sampler: one smoothed analog reading and its quantized step.
//!
//! The step is derived from the smoothed fraction with a hysteresis band,
//! so a reading hovering on a step boundary does not flip the emitted
//! value back and forth.

use super::filter::{AnalogFilter, ResponsiveFilter};
use crate::config::STEP_MAX;

/// Extra distance (in steps) past the rounding midpoint before the step moves.
const HYSTERESIS_STEPS: f32 = 0.25;

#[derive(Debug, Clone, Default)]
pub struct ChannelSampler<F = ResponsiveFilter> {
    filter: F,
    step: u8,
}

impl<F: AnalogFilter + Default> ChannelSampler<F> {
    pub fn new() -> Self {
        Self {
            filter: F::default(),
            step: 0,
        }
    }

    /// Feed one raw reading.  Callers clamp to `[0, 1]` first.
    pub fn feed(&mut self, raw: f32) {
        self.filter.update(raw);
        self.requantize();
    }

    /// Quantized position, `0..=STEP_MAX`.
    pub fn current_step(&self) -> u8 {
        self.step
    }

    /// Smoothed position in `[0, 1]`.
    pub fn current_fraction(&self) -> f32 {
        self.filter.value()
    }

    pub fn reset(&mut self) {
        self.filter.reset();
        self.step = 0;
    }

    fn requantize(&mut self) {
        let scaled = self.filter.value().clamp(0.0, 1.0) * f32::from(STEP_MAX);
        let distance = (scaled - f32::from(self.step)).abs();
        if distance >= 0.5 + HYSTERESIS_STEPS {
            self.step = (scaled.round() as u8).min(STEP_MAX);
        }
    }
}
