//! Sensor subsystem — the analog channel samplers and the [`SamplerBank`]
//! that feeds them.
//!
//! The bank owns one [`ChannelSampler`] per channel.  Each sampling tick
//! it pulls a raw fraction from the [`AnalogPort`], clamps it and feeds
//! the matching sampler.

pub mod filter;
pub mod sampler;

use crate::app::ports::AnalogPort;
use crate::config::CHANNEL_COUNT;
use filter::{AnalogFilter, ResponsiveFilter};
use sampler::ChannelSampler;

/// Aggregates every channel sampler.
#[derive(Debug, Clone)]
pub struct SamplerBank<F = ResponsiveFilter> {
    samplers: [ChannelSampler<F>; CHANNEL_COUNT],
}

impl<F: AnalogFilter + Default> SamplerBank<F> {
    pub fn new() -> Self {
        Self {
            samplers: core::array::from_fn(|_| ChannelSampler::new()),
        }
    }

    /// Read every channel from `port` and feed its sampler.
    ///
    /// Raw readings are clamped to `[0, 1]`; a NaN reading counts as 0.
    pub fn sample_all(&mut self, port: &mut impl AnalogPort) {
        for (channel, sampler) in self.samplers.iter_mut().enumerate() {
            let raw = port.read_fraction(channel);
            let raw = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };
            sampler.feed(raw);
        }
    }

    pub fn get(&self, channel: usize) -> Option<&ChannelSampler<F>> {
        self.samplers.get(channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelSampler<F>> {
        self.samplers.iter()
    }

    pub fn reset_all(&mut self) {
        for sampler in &mut self.samplers {
            sampler.reset();
        }
    }
}

impl<F: AnalogFilter + Default> Default for SamplerBank<F> {
    fn default() -> Self {
        Self::new()
    }
}
