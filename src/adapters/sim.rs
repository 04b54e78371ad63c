//! Simulated hardware for the host binary and tests.
//!
//! [`SimHardware`] stands in for the ADC, the indicator LEDs and the
//! wait-for-interrupt instruction:
//!
//! - analog inputs follow a slow triangle sweep per channel, with a small
//!   amount of deterministic noise so the smoothing filter has work to do;
//! - indicator updates are logged when they change;
//! - the idle wait sleeps the thread for a fixed interval.

use std::time::Duration;

use log::{debug, info};

use crate::app::ports::{AnalogPort, IdleWait, IndicatorPort};
use crate::config::CHANNEL_COUNT;
use crate::drivers::indicators::IndicatorState;

/// Peak-to-peak noise added to every reading, as a fraction of full scale.
const NOISE_FRACTION: f32 = 0.004;

/// Triangle sweep for one knob.
#[derive(Debug, Clone, Copy)]
pub struct Sweep {
    /// Full up-and-down period in milliseconds; 0 holds the knob still.
    pub period_ms: u32,
    /// Phase offset in milliseconds.
    pub phase_ms: u32,
}

impl Sweep {
    pub const STILL: Self = Self {
        period_ms: 0,
        phase_ms: 0,
    };

    fn position(&self, now_ms: u32) -> Option<f32> {
        if self.period_ms == 0 {
            return None;
        }
        let t = now_ms.wrapping_add(self.phase_ms) % self.period_ms;
        let x = t as f32 / self.period_ms as f32;
        Some(if x < 0.5 { x * 2.0 } else { 2.0 - x * 2.0 })
    }
}

pub struct SimHardware {
    knobs: [f32; CHANNEL_COUNT],
    sweeps: [Sweep; CHANNEL_COUNT],
    noise: bool,
    rng: u32,
    shown: IndicatorState,
    idle_sleep: Duration,
    waits: u64,
}

impl SimHardware {
    pub fn new(sweeps: [Sweep; CHANNEL_COUNT], idle_sleep: Duration) -> Self {
        Self {
            knobs: [0.0; CHANNEL_COUNT],
            sweeps,
            noise: true,
            rng: 0x2545_f491,
            shown: IndicatorState::default(),
            idle_sleep,
            waits: 0,
        }
    }

    /// Knobs held at zero, no noise, no sleeping.
    pub fn still() -> Self {
        let mut hw = Self::new([Sweep::STILL; CHANNEL_COUNT], Duration::ZERO);
        hw.noise = false;
        hw
    }

    /// Move swept knobs to their position at `now_ms`.
    pub fn advance(&mut self, now_ms: u32) {
        for (knob, sweep) in self.knobs.iter_mut().zip(self.sweeps.iter()) {
            if let Some(pos) = sweep.position(now_ms) {
                *knob = pos;
            }
        }
    }

    /// Hold `channel` at `fraction` (its sweep stops).
    pub fn set_knob(&mut self, channel: usize, fraction: f32) {
        if let (Some(knob), Some(sweep)) = (self.knobs.get_mut(channel), self.sweeps.get_mut(channel)) {
            *knob = fraction;
            *sweep = Sweep::STILL;
        }
    }

    pub fn knob(&self, channel: usize) -> Option<f32> {
        self.knobs.get(channel).copied()
    }

    /// Last indicator state rendered.
    pub fn shown(&self) -> &IndicatorState {
        &self.shown
    }

    pub fn wait_count(&self) -> u64 {
        self.waits
    }

    // xorshift32
    fn next_noise(&mut self) -> f32 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        (x as f32 / u32::MAX as f32 - 0.5) * NOISE_FRACTION
    }
}

impl AnalogPort for SimHardware {
    fn read_fraction(&mut self, channel: usize) -> f32 {
        let base = self.knobs.get(channel).copied().unwrap_or(0.0);
        if self.noise {
            base + self.next_noise()
        } else {
            base
        }
    }
}

impl IndicatorPort for SimHardware {
    fn show(&mut self, state: &IndicatorState) {
        if *state == self.shown {
            return;
        }
        for (i, (new, old)) in state.channels.iter().zip(self.shown.channels.iter()).enumerate() {
            if new.lit != old.lit {
                info!("LED {}: {} ({:.2})", i, if new.lit { "on" } else { "off" }, new.intensity);
            } else if new.lit && (new.intensity - old.intensity).abs() > 0.05 {
                debug!("LED {}: intensity {:.2}", i, new.intensity);
            }
        }
        if state.status != self.shown.status {
            info!("Status LED: {}", if state.status { "on" } else { "off" });
        }
        self.shown = *state;
    }
}

impl IdleWait for SimHardware {
    fn wait(&mut self) {
        self.waits += 1;
        if !self.idle_sleep.is_zero() {
            std::thread::sleep(self.idle_sleep);
        }
    }
}
