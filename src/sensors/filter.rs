//! Analog smoothing filters.
//!
//! The sampler treats the filter as a black box: it feeds raw fractions in
//! and reads a smoothed fraction back.  [`ResponsiveFilter`] is the default:
//! an exponential smoother whose coefficient "snaps" towards 1 on large
//! moves and relaxes towards 0 on small ones, so a turned knob tracks
//! quickly while a resting knob stops twitching.
//!
//! ```text
//!   raw ──▶ |raw − smooth| ──▶ snap_curve ──▶ smooth += (raw − smooth)·snap
//! ```

/// Contract between the sampler and a smoothing algorithm.
pub trait AnalogFilter {
    /// Feed one raw reading in `[0, 1]`.
    fn update(&mut self, raw: f32);

    /// Current smoothed reading in `[0, 1]`.
    fn value(&self) -> f32;

    /// Forget all history.
    fn reset(&mut self);
}

/// Resolution the snap curve is evaluated at (10-bit ADC counts).
const COUNTS: f32 = 1023.0;

/// Scales the error (in counts) before it enters the snap curve.
const SNAP_MULTIPLIER: f32 = 0.01;

/// Errors smaller than this (in counts) are treated as noise while resting.
const ACTIVITY_THRESHOLD: f32 = 4.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponsiveFilter {
    smooth: f32,
    primed: bool,
    sleeping: bool,
}

impl ResponsiveFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the last update was swallowed as resting noise.
    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    /// Maps a non-negative error onto a smoothing coefficient in `[0, 1]`.
    fn snap_curve(x: f32) -> f32 {
        let y = 1.0 / (x + 1.0);
        ((1.0 - y) * 2.0).min(1.0)
    }
}

impl AnalogFilter for ResponsiveFilter {
    fn update(&mut self, raw: f32) {
        let raw = raw.clamp(0.0, 1.0);
        if !self.primed {
            self.smooth = raw;
            self.primed = true;
            return;
        }

        let diff_counts = (raw - self.smooth).abs() * COUNTS;
        self.sleeping = diff_counts < ACTIVITY_THRESHOLD;
        if self.sleeping {
            return;
        }

        let snap = Self::snap_curve(diff_counts * SNAP_MULTIPLIER);
        self.smooth += (raw - self.smooth) * snap;
        self.smooth = self.smooth.clamp(0.0, 1.0);
    }

    fn value(&self) -> f32 {
        self.smooth
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// No smoothing: the last raw reading is the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough {
    value: f32,
}

impl AnalogFilter for PassThrough {
    fn update(&mut self, raw: f32) {
        self.value = raw.clamp(0.0, 1.0);
    }

    fn value(&self) -> f32 {
        self.value
    }

    fn reset(&mut self) {
        self.value = 0.0;
    }
}
