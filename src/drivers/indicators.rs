//! Indicator state and the PWM indicator driver.
//!
//! [`IndicatorState`] is the device core's view of the LEDs: one dimmable
//! indicator per channel plus a discrete status indicator.  It is plain
//! data, mutated by the emission pass and by inbound notes.
//!
//! [`PwmIndicators`] renders that state onto `embedded-hal` PWM channels
//! and a status GPIO.  Duty cycles are cached so unchanged channels are
//! not rewritten on every poll.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use super::status_led::StatusLed;
use crate::app::ports::IndicatorPort;
use crate::config::CHANNEL_COUNT;

// ═══════════════════════════════════════════════════════════════
//  State
// ═══════════════════════════════════════════════════════════════

/// One dimmable channel indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelIndicator {
    pub lit: bool,
    /// Brightness while lit, `[0, 1]`.
    pub intensity: f32,
}

impl ChannelIndicator {
    /// Effective output level: the intensity while lit, otherwise 0.
    pub fn level(&self) -> f32 {
        if self.lit { self.intensity } else { 0.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorState {
    pub channels: [ChannelIndicator; CHANNEL_COUNT],
    pub status: bool,
}

impl IndicatorState {
    /// Turn `channel` on at `intensity`.
    pub fn light(&mut self, channel: usize, intensity: f32) {
        if let Some(ind) = self.channels.get_mut(channel) {
            ind.lit = true;
            ind.intensity = intensity.clamp(0.0, 1.0);
        }
    }

    /// Turn `channel` off, keeping its intensity for the next time it lights.
    pub fn extinguish(&mut self, channel: usize) {
        if let Some(ind) = self.channels.get_mut(channel) {
            ind.lit = false;
        }
    }

    /// Update the brightness of `channel` without changing whether it is lit.
    pub fn set_intensity(&mut self, channel: usize, intensity: f32) {
        if let Some(ind) = self.channels.get_mut(channel) {
            ind.intensity = intensity.clamp(0.0, 1.0);
        }
    }

    pub fn channel(&self, channel: usize) -> Option<&ChannelIndicator> {
        self.channels.get(channel)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// ═══════════════════════════════════════════════════════════════
//  PWM driver
// ═══════════════════════════════════════════════════════════════

pub struct PwmIndicators<P, S> {
    channels: [P; CHANNEL_COUNT],
    duty: [Option<u16>; CHANNEL_COUNT],
    status: StatusLed<S>,
}

impl<P: SetDutyCycle, S: OutputPin> PwmIndicators<P, S> {
    pub fn new(channels: [P; CHANNEL_COUNT], status_pin: S) -> Self {
        Self {
            channels,
            duty: [None; CHANNEL_COUNT],
            status: StatusLed::new(status_pin),
        }
    }

    /// Last duty written to `channel`, if any.
    pub fn duty(&self, channel: usize) -> Option<u16> {
        self.duty.get(channel).copied().flatten()
    }

    pub fn status_on(&self) -> bool {
        self.status.is_on()
    }

    fn level_to_duty(pwm: &P, level: f32) -> u16 {
        let max = pwm.max_duty_cycle();
        (level.clamp(0.0, 1.0) * f32::from(max)).round() as u16
    }
}

impl<P: SetDutyCycle, S: OutputPin> IndicatorPort for PwmIndicators<P, S> {
    fn show(&mut self, state: &IndicatorState) {
        for (i, (pwm, ind)) in self.channels.iter_mut().zip(state.channels.iter()).enumerate() {
            let duty = Self::level_to_duty(pwm, ind.level());
            if self.duty[i] == Some(duty) {
                continue;
            }
            match pwm.set_duty_cycle(duty) {
                Ok(()) => self.duty[i] = Some(duty),
                Err(e) => warn!("Indicator {}: PWM write failed: {:?}", i, e),
            }
        }
        self.status.set(state.status);
    }
}
