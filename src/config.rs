//! Node configuration parameters.
//!
//! Two layers:
//!
//! - [`NodeSettings`] — build-time tunables (timing, note/controller map,
//!   indicator range, address width).  Not persisted.
//! - [`DeviceConfig`] — the single persisted field, the outgoing MIDI
//!   channel.  Imported and exported through [`ConfigRecord`], whose channel
//!   is 1-based like every MIDI front panel.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Number of analog channels on the node.
pub const CHANNEL_COUNT: usize = 2;

/// Highest quantized step (7-bit controller value).
pub const STEP_MAX: u8 = 127;

/// Highest internal MIDI channel number.
pub const MIDI_CHANNEL_MAX: u8 = 15;

// ═══════════════════════════════════════════════════════════════
//  Node settings
// ═══════════════════════════════════════════════════════════════

/// Core node settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSettings {
    // --- Timing ---
    /// Sampling task period (milliseconds)
    pub sample_period_ms: u32,
    /// Emission task period (milliseconds)
    pub emit_period_ms: u32,

    // --- Message map ---
    /// Note number mapped to channel 0
    pub base_note: u8,
    /// Controller number emitted by channel 0
    pub base_controller: u8,

    // --- Indicators ---
    /// Lowest intensity a lit indicator is driven at
    pub indicator_min: f32,
    /// Highest intensity a lit indicator is driven at
    pub indicator_max: f32,

    // --- Chain ---
    pub router: RouterSettings,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            // Timing
            sample_period_ms: 10, // 100 Hz
            emit_period_ms: 50,   // 20 Hz

            // Message map
            base_note: 60,       // C4
            base_controller: 16, // General Purpose Controller 1

            // Indicators
            indicator_min: 0.05,
            indicator_max: 1.0,

            router: RouterSettings::default(),
        }
    }
}

impl NodeSettings {
    /// Map a note number onto a channel index, if it falls in the window.
    pub fn channel_for_note(&self, note: u8) -> Option<usize> {
        let offset = note.checked_sub(self.base_note)? as usize;
        (offset < CHANNEL_COUNT).then_some(offset)
    }

    /// Controller number emitted by `channel`.
    pub fn controller_for(&self, channel: usize) -> u8 {
        self.base_controller.saturating_add(channel as u8)
    }

    /// Scale a 7-bit velocity into the indicator display range.
    pub fn velocity_intensity(&self, velocity: u8) -> f32 {
        let v = f32::from(velocity.min(STEP_MAX)) / f32::from(STEP_MAX);
        self.indicator_min + v * (self.indicator_max - self.indicator_min)
    }
}

/// Chain addressing settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RouterSettings {
    /// Width of the envelope address field in bits (1–4).
    pub address_bits: u8,
    /// Upper bound on messages taken from one port per poll.
    pub max_per_poll: usize,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            address_bits: 4,
            max_per_poll: 8,
        }
    }
}

impl RouterSettings {
    /// The maximum representable address, reserved as "idle / broadcast".
    pub fn idle_address(&self) -> u8 {
        let bits = self.address_bits.clamp(1, 4);
        (1u8 << bits) - 1
    }
}

// ═══════════════════════════════════════════════════════════════
//  Persisted configuration
// ═══════════════════════════════════════════════════════════════

/// Device configuration as held by the core (0-based channel).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Outgoing MIDI channel, 0–15.
    pub midi_channel: u8,
}

/// Configuration record as seen by the outside world (1-based channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    /// Outgoing MIDI channel, 1–16.
    pub channel: u8,
}

impl DeviceConfig {
    /// Import an external record, clamping the channel to 1–16 first.
    pub fn from_record(record: &ConfigRecord) -> Self {
        Self {
            midi_channel: record.channel.clamp(1, MIDI_CHANNEL_MAX + 1) - 1,
        }
    }

    /// Export as an external record.
    pub fn to_record(self) -> ConfigRecord {
        ConfigRecord {
            channel: self.midi_channel.min(MIDI_CHANNEL_MAX) + 1,
        }
    }
}

impl ConfigRecord {
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(bytes).map_err(|_| ConfigError::Malformed)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(self).map_err(|_| ConfigError::Encode)
    }

    /// Compact blob for the persistence collaborator.
    pub fn from_blob(bytes: &[u8]) -> Result<Self, ConfigError> {
        postcard::from_bytes(bytes).map_err(|_| ConfigError::Malformed)
    }

    pub fn to_blob(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(|_| ConfigError::Encode)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Capability descriptor
// ═══════════════════════════════════════════════════════════════

/// Static, export-only description of what the node accepts and emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// First accepted note number.
    pub note_base: u8,
    /// Number of accepted notes (one per channel).
    pub note_count: u8,
    /// Controller number emitted by each channel, in channel order.
    pub controllers: [u8; CHANNEL_COUNT],
}

impl Capabilities {
    pub fn from_settings(settings: &NodeSettings) -> Self {
        let mut controllers = [0u8; CHANNEL_COUNT];
        for (i, cc) in controllers.iter_mut().enumerate() {
            *cc = settings.controller_for(i);
        }
        Self {
            note_base: settings.base_note,
            note_count: CHANNEL_COUNT as u8,
            controllers,
        }
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(self).map_err(|_| ConfigError::Encode)
    }
}
