//! Integration tests for the sampling → emission pipeline and inbound
//! message handling of the device core.

use midi_msg::{
    Channel, ChannelModeMsg, ChannelVoiceMsg, ControlChange, MidiMsg, SystemRealTimeMsg,
};
use potlink::app::device::DeviceCore;
use potlink::app::ports::{MessageHandler, TaskId};
use potlink::config::{CHANNEL_COUNT, ConfigRecord, DeviceConfig, NodeSettings};
use potlink::sensors::filter::PassThrough;
use potlink::ConfigError;

use crate::mock_hw::{MockHardware, MockStore, SentLog};

fn device() -> DeviceCore<PassThrough> {
    DeviceCore::new(NodeSettings::default(), DeviceConfig::default(), 0)
}

/// Run every millisecond in `from..=to`.
fn run(dev: &mut DeviceCore<PassThrough>, hw: &mut MockHardware, out: &mut SentLog, from: u32, to: u32) {
    for now in from..=to {
        dev.run_tasks(now, hw, out);
    }
}

fn controller_values(out: &SentLog) -> Vec<(u8, u8)> {
    out.msgs
        .iter()
        .filter_map(|m| match m {
            MidiMsg::ChannelVoice {
                msg:
                    ChannelVoiceMsg::ControlChange {
                        control: ControlChange::CC { control, value },
                    },
                ..
            } => Some((*control, *value)),
            _ => None,
        })
        .collect()
}

fn note_on(note: u8, velocity: u8) -> MidiMsg {
    MidiMsg::ChannelVoice {
        channel: Channel::Ch1,
        msg: ChannelVoiceMsg::NoteOn { note, velocity },
    }
}

// ── Emission ──────────────────────────────────────────────────

#[test]
fn sampling_runs_every_ten_ms() {
    let mut dev = device();
    let mut hw = MockHardware::new();
    let mut out = SentLog::default();
    run(&mut dev, &mut hw, &mut out, 1, 100);
    assert_eq!(hw.reads, 10 * CHANNEL_COUNT);
}

#[test]
fn one_message_per_changed_channel_per_tick() {
    let mut dev = device();
    let mut hw = MockHardware::new();
    let mut out = SentLog::default();

    hw.knobs = [0.5, 1.0];
    run(&mut dev, &mut hw, &mut out, 1, 50);
    assert_eq!(controller_values(&out), vec![(16, 64), (17, 127)]);

    // Only channel 0 moves.
    hw.knobs = [0.25, 1.0];
    run(&mut dev, &mut hw, &mut out, 51, 100);
    assert_eq!(controller_values(&out)[2..], [(16, 32)]);

    // Nothing moves.
    run(&mut dev, &mut hw, &mut out, 101, 150);
    assert_eq!(out.msgs.len(), 3);
}

#[test]
fn emission_rate_is_bounded_by_emit_period() {
    let mut dev = device();
    let mut hw = MockHardware::new();
    let mut out = SentLog::default();

    // Knob flips every sample; only the emission ticks produce traffic.
    for now in 1..=500 {
        hw.knobs[0] = if (now / 10) % 2 == 0 { 0.0 } else { 1.0 };
        dev.run_tasks(now, &mut hw, &mut out);
    }
    assert!(out.msgs.len() <= 10);
}

#[test]
fn small_jitter_does_not_emit() {
    let mut dev = device();
    let mut hw = MockHardware::new();
    let mut out = SentLog::default();

    hw.knobs = [0.5, 0.0];
    run(&mut dev, &mut hw, &mut out, 1, 50);
    let settled = out.msgs.len();

    for now in 51..=300 {
        hw.knobs[0] = 0.5 + if now % 2 == 0 { 0.001 } else { -0.001 };
        dev.run_tasks(now, &mut hw, &mut out);
    }
    assert_eq!(out.msgs.len(), settled);
}

#[test]
fn messages_go_out_on_configured_channel() {
    let mut dev = device();
    dev.import_config(&ConfigRecord { channel: 16 });
    let mut hw = MockHardware::new();
    let mut out = SentLog::default();
    hw.knobs = [1.0, 0.0];
    run(&mut dev, &mut hw, &mut out, 1, 50);

    assert!(matches!(
        out.msgs[0],
        MidiMsg::ChannelVoice {
            channel: Channel::Ch16,
            ..
        }
    ));
}

#[test]
fn all_notes_off_flushes_every_channel() {
    let mut dev = device();
    let mut hw = MockHardware::new();
    let mut out = SentLog::default();
    hw.knobs = [0.5, 0.5];
    run(&mut dev, &mut hw, &mut out, 1, 50);
    out.msgs.clear();

    dev.handle_message(&MidiMsg::ChannelMode {
        channel: Channel::Ch5,
        msg: ChannelModeMsg::AllSoundOff,
    });
    run(&mut dev, &mut hw, &mut out, 51, 100);
    assert_eq!(controller_values(&out), vec![(16, 64), (17, 64)]);

    // The flush is one-shot.
    run(&mut dev, &mut hw, &mut out, 101, 150);
    assert_eq!(out.msgs.len(), CHANNEL_COUNT);
}

// ── Indicators ────────────────────────────────────────────────

#[test]
fn note_velocity_scales_into_display_range() {
    let mut dev = device();
    let settings = NodeSettings::default();
    dev.handle_message(&note_on(60, 64));

    let ind = dev.indicators().channel(0).unwrap();
    let expected =
        settings.indicator_min + (64.0 / 127.0) * (settings.indicator_max - settings.indicator_min);
    assert!(ind.lit);
    assert!((ind.intensity - expected).abs() < 1e-6);
}

#[test]
fn zero_velocity_turns_channel_off() {
    let mut dev = device();
    dev.handle_message(&note_on(61, 90));
    assert!(dev.indicators().channel(1).unwrap().lit);
    dev.handle_message(&note_on(61, 0));
    assert!(!dev.indicators().channel(1).unwrap().lit);
}

#[test]
fn out_of_range_note_changes_nothing() {
    let mut dev = device();
    let before = *dev.indicators();
    dev.handle_message(&note_on(60 + CHANNEL_COUNT as u8, 100));
    assert_eq!(*dev.indicators(), before);
}

#[test]
fn unrelated_messages_are_only_recorded() {
    let mut dev = device();
    let before = *dev.indicators();
    let msg = MidiMsg::ChannelVoice {
        channel: Channel::Ch1,
        msg: ChannelVoiceMsg::ProgramChange { program: 5 },
    };
    dev.handle_message(&msg);
    assert_eq!(*dev.indicators(), before);
    assert!(!dev.flush_pending());
    assert_eq!(dev.last_received(), Some(&msg));
}

// ── Reset ─────────────────────────────────────────────────────

#[test]
fn system_reset_clears_state_and_timers() {
    let mut dev = device();
    let mut hw = MockHardware::new();
    let mut out = SentLog::default();
    hw.knobs = [1.0, 1.0];
    run(&mut dev, &mut hw, &mut out, 1, 120);
    dev.handle_message(&note_on(60, 127));

    dev.handle_message(&MidiMsg::SystemRealTime {
        msg: SystemRealTimeMsg::SystemReset,
    });

    for ch in 0..CHANNEL_COUNT {
        assert_eq!(dev.last_emitted(ch), Some(0));
        assert!(!dev.indicators().channel(ch).unwrap().lit);
    }
    assert!(!dev.indicators().status);
    assert_eq!(dev.last_received(), None);
    assert_eq!(dev.timer_reference(TaskId::Sample), Some(110));
    assert_eq!(dev.timer_reference(TaskId::Emit), Some(120));

    // Knobs are still up, so the next emission re-sends them.
    out.msgs.clear();
    run(&mut dev, &mut hw, &mut out, 121, 170);
    assert_eq!(controller_values(&out), vec![(16, 127), (17, 127)]);
}

#[test]
fn sample_fires_immediately_after_reset() {
    let mut dev = device();
    let mut hw = MockHardware::new();
    let mut out = SentLog::default();
    run(&mut dev, &mut hw, &mut out, 1, 1_000);
    let reads = hw.reads;

    dev.reset();
    dev.run_tasks(1_001, &mut hw, &mut out);
    assert_eq!(hw.reads, reads + CHANNEL_COUNT);
}

// ── Configuration ─────────────────────────────────────────────

#[test]
fn import_clamps_channel() {
    let mut dev = device();
    dev.import_config(&ConfigRecord { channel: 0 });
    assert_eq!(dev.config().midi_channel, 0);
    dev.import_config(&ConfigRecord { channel: 20 });
    assert_eq!(dev.config().midi_channel, 15);
}

#[test]
fn restore_and_persist_through_store() {
    let mut dev = device();
    let mut store = MockStore {
        record: Some(ConfigRecord { channel: 3 }),
        ..Default::default()
    };
    dev.restore_config(&store);
    assert_eq!(dev.config().midi_channel, 2);

    dev.import_config(&ConfigRecord { channel: 12 });
    dev.persist_config(&mut store).unwrap();
    assert_eq!(store.record, Some(ConfigRecord { channel: 12 }));
    assert_eq!(store.saves, 1);
}

#[test]
fn failed_load_keeps_current_config() {
    let mut dev = device();
    dev.import_config(&ConfigRecord { channel: 7 });
    let store = MockStore {
        fail_load: Some(ConfigError::Malformed),
        ..Default::default()
    };
    dev.restore_config(&store);
    assert_eq!(dev.config().midi_channel, 6);
    dev.restore_config(&MockStore::default());
    assert_eq!(dev.config().midi_channel, 6);
}

#[test]
fn capabilities_describe_note_and_controller_map() {
    let caps = device().capabilities();
    assert_eq!(caps.note_base, 60);
    assert_eq!(caps.note_count as usize, CHANNEL_COUNT);
    assert_eq!(caps.controllers, [16, 17]);
}
