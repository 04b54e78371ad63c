//! Device core — change-coalesced emission and inbound message handling.
//!
//! [`DeviceCore`] owns the sampler bank, the per-channel last-emitted step,
//! the indicator state and the two periodic tasks.  It is driven from two
//! directions:
//!
//! ```text
//!  Scheduler ──▶ run_tasks() ──▶ sample pass / emission pass ──▶ MessageSink
//!  Router    ──▶ handle_message() ──▶ indicators / forced flush / reset
//! ```
//!
//! The emission pass sends at most one control change per channel per
//! tick, and only for channels whose quantized step moved, so analog
//! noise never turns into bus traffic faster than the emission rate.

use log::{debug, info, warn};
use midi_msg::{
    Channel, ChannelModeMsg, ChannelVoiceMsg, ControlChange, MidiMsg, SystemRealTimeMsg,
};

use super::ports::{
    AnalogPort, ConfigPort, MessageHandler, MessageSink, TaskDelegate, TaskId,
};
use crate::config::{
    CHANNEL_COUNT, Capabilities, ConfigRecord, DeviceConfig, NodeSettings,
};
use crate::drivers::indicators::IndicatorState;
use crate::error::ConfigError;
use crate::scheduler::{PeriodicTask, Scheduler};
use crate::sensors::SamplerBank;
use crate::sensors::filter::{AnalogFilter, ResponsiveFilter};

/// Controller numbers that request a forced flush (All Sound Off, All Notes Off).
const CC_ALL_SOUND_OFF: u8 = 120;
const CC_ALL_NOTES_OFF: u8 = 123;

// ───────────────────────────────────────────────────────────────
// State
// ───────────────────────────────────────────────────────────────

/// Everything the tasks and the message handler mutate.
struct DeviceState<F> {
    settings: NodeSettings,
    config: DeviceConfig,
    samplers: SamplerBank<F>,
    /// Only written when an emission actually happens.
    last_emitted: [u8; CHANNEL_COUNT],
    indicators: IndicatorState,
    force_flush: bool,
    last_received: Option<MidiMsg>,
}

impl<F: AnalogFilter + Default> DeviceState<F> {
    fn emission_pass(&mut self, out: &mut dyn MessageSink) -> usize {
        let force = core::mem::take(&mut self.force_flush);
        let channel = Channel::from_u8(self.config.midi_channel);
        let mut emitted = 0;

        for (i, sampler) in self.samplers.iter().enumerate() {
            let step = sampler.current_step();
            if !force && step == self.last_emitted[i] {
                continue;
            }
            out.send(&MidiMsg::ChannelVoice {
                channel,
                msg: ChannelVoiceMsg::ControlChange {
                    control: ControlChange::CC {
                        control: self.settings.controller_for(i),
                        value: step,
                    },
                },
            });
            self.indicators.set_intensity(i, sampler.current_fraction());
            self.last_emitted[i] = step;
            emitted += 1;
        }

        if force {
            debug!("Device: forced flush emitted {} messages", emitted);
        }
        emitted
    }

    fn note_on(&mut self, note: u8, velocity: u8) {
        let Some(channel) = self.settings.channel_for_note(note) else {
            return;
        };
        let intensity = self.settings.velocity_intensity(velocity);
        self.indicators.light(channel, intensity);
        self.indicators.status = true;
    }

    fn note_off(&mut self, note: u8) {
        let Some(channel) = self.settings.channel_for_note(note) else {
            return;
        };
        self.indicators.extinguish(channel);
        self.indicators.status = false;
    }

    fn reset(&mut self) {
        self.samplers.reset_all();
        self.last_emitted = [0; CHANNEL_COUNT];
        self.indicators.clear();
        self.force_flush = false;
        self.last_received = None;
    }
}

/// Runs the scheduled passes against borrowed state and ports.
struct Passes<'a, F, A, O> {
    state: &'a mut DeviceState<F>,
    analog: &'a mut A,
    out: &'a mut O,
    emitted: usize,
}

impl<F, A, O> TaskDelegate for Passes<'_, F, A, O>
where
    F: AnalogFilter + Default,
    A: AnalogPort,
    O: MessageSink,
{
    fn on_task_due(&mut self, task: TaskId, _now_ms: u32) {
        match task {
            TaskId::Sample => self.state.samplers.sample_all(self.analog),
            TaskId::Emit => self.emitted += self.state.emission_pass(self.out),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// DeviceCore
// ───────────────────────────────────────────────────────────────

pub struct DeviceCore<F = ResponsiveFilter> {
    scheduler: Scheduler,
    state: DeviceState<F>,
    now_ms: u32,
}

impl<F: AnalogFilter + Default> DeviceCore<F> {
    /// Construct the core; the node starts as if reset at `now_ms`.
    pub fn new(settings: NodeSettings, config: DeviceConfig, now_ms: u32) -> Self {
        let mut scheduler = Scheduler::new();
        scheduler.add(PeriodicTask::new(TaskId::Sample, settings.sample_period_ms, now_ms));
        scheduler.add(PeriodicTask::new(TaskId::Emit, settings.emit_period_ms, now_ms));

        info!(
            "Device: {} channels, MIDI channel {}, notes {}..{}, CC {}..",
            CHANNEL_COUNT,
            config.midi_channel + 1,
            settings.base_note,
            settings.base_note as usize + CHANNEL_COUNT,
            settings.base_controller
        );

        let mut core = Self {
            scheduler,
            state: DeviceState {
                settings,
                config,
                samplers: SamplerBank::new(),
                last_emitted: [0; CHANNEL_COUNT],
                indicators: IndicatorState::default(),
                force_flush: false,
                last_received: None,
            },
            now_ms,
        };
        core.reset();
        core
    }

    // ── Per-poll orchestration ────────────────────────────────

    /// Run whichever periodic tasks are due at `now_ms`.
    ///
    /// Returns the number of messages the emission pass sent.
    pub fn run_tasks(
        &mut self,
        now_ms: u32,
        analog: &mut impl AnalogPort,
        out: &mut impl MessageSink,
    ) -> usize {
        self.set_now(now_ms);
        let mut passes = Passes {
            state: &mut self.state,
            analog,
            out,
            emitted: 0,
        };
        self.scheduler.tick(now_ms, &mut passes);
        passes.emitted
    }

    /// Record the current time without running any task.  Messages handled
    /// before the next `run_tasks` see this as "now".
    pub fn set_now(&mut self, now_ms: u32) {
        self.now_ms = now_ms;
    }

    /// Run the emission pass immediately, outside the schedule.
    pub fn emit_now(&mut self, out: &mut impl MessageSink) -> usize {
        self.state.emission_pass(out)
    }

    /// Ask the next emission pass to re-send every channel.
    pub fn request_flush(&mut self) {
        self.state.force_flush = true;
    }

    /// Restore power-on state.  The sample task is re-armed one period in
    /// the past so it is due at once; the emit task at the current time.
    pub fn reset(&mut self) {
        self.state.reset();
        let sample_ref = self.now_ms.wrapping_sub(self.state.settings.sample_period_ms);
        self.scheduler.rearm(TaskId::Sample, sample_ref);
        self.scheduler.rearm(TaskId::Emit, self.now_ms);
    }

    // ── Configuration ─────────────────────────────────────────

    pub fn import_config(&mut self, record: &ConfigRecord) {
        let config = DeviceConfig::from_record(record);
        if config != self.state.config {
            info!(
                "Device: MIDI channel {} -> {}",
                self.state.config.midi_channel + 1,
                config.midi_channel + 1
            );
        }
        self.state.config = config;
    }

    pub fn export_config(&self) -> ConfigRecord {
        self.state.config.to_record()
    }

    /// Import whatever the store holds.  A missing or unreadable record
    /// leaves the current configuration in place.
    pub fn restore_config(&mut self, store: &impl ConfigPort) {
        match store.load() {
            Ok(record) => self.import_config(&record),
            Err(ConfigError::NotFound) => debug!("Device: no stored config, keeping defaults"),
            Err(e) => warn!("Device: config load failed ({}), keeping defaults", e),
        }
    }

    pub fn persist_config(&self, store: &mut impl ConfigPort) -> Result<(), ConfigError> {
        store.save(&self.export_config())
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::from_settings(&self.state.settings)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> DeviceConfig {
        self.state.config
    }

    pub fn indicators(&self) -> &IndicatorState {
        &self.state.indicators
    }

    pub fn last_emitted(&self, channel: usize) -> Option<u8> {
        self.state.last_emitted.get(channel).copied()
    }

    pub fn current_step(&self, channel: usize) -> Option<u8> {
        self.state.samplers.get(channel).map(|s| s.current_step())
    }

    pub fn last_received(&self) -> Option<&MidiMsg> {
        self.state.last_received.as_ref()
    }

    pub fn flush_pending(&self) -> bool {
        self.state.force_flush
    }

    /// Last-fire reference of `task`, for diagnostics.
    pub fn timer_reference(&self, task: TaskId) -> Option<u32> {
        self.scheduler.get(task).map(PeriodicTask::last_fire_ms)
    }

    /// Nothing pending beyond the regular schedule.
    pub fn is_idle(&self) -> bool {
        !self.state.force_flush
    }
}

impl<F: AnalogFilter + Default> MessageHandler for DeviceCore<F> {
    fn handle_message(&mut self, msg: &MidiMsg) {
        self.state.last_received = Some(msg.clone());

        match msg {
            MidiMsg::ChannelVoice {
                msg: ChannelVoiceMsg::NoteOn { note, velocity },
                ..
            } if *velocity > 0 => self.state.note_on(*note, *velocity),

            MidiMsg::ChannelVoice {
                msg:
                    ChannelVoiceMsg::NoteOn { note, .. } | ChannelVoiceMsg::NoteOff { note, .. },
                ..
            } => self.state.note_off(*note),

            MidiMsg::ChannelMode {
                msg: ChannelModeMsg::AllSoundOff | ChannelModeMsg::AllNotesOff,
                ..
            }
            | MidiMsg::ChannelVoice {
                msg:
                    ChannelVoiceMsg::ControlChange {
                        control: ControlChange::CC {
                            control: CC_ALL_SOUND_OFF | CC_ALL_NOTES_OFF,
                            ..
                        },
                    },
                ..
            } => self.request_flush(),

            MidiMsg::SystemRealTime {
                msg: SystemRealTimeMsg::SystemReset,
            } => {
                info!("Device: system reset");
                self.reset();
            }

            _ => {}
        }
    }
}
