//! Mock hardware adapters for integration tests.
//!
//! Records every port call so tests can assert on the full history
//! without real ADCs, LEDs or serial links.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use midi_msg::MidiMsg;
use potlink::app::ports::{AnalogPort, ConfigPort, IdleWait, IndicatorPort, MessageSink};
use potlink::chain::transport::Transport;
use potlink::config::{CHANNEL_COUNT, ConfigRecord};
use potlink::drivers::indicators::IndicatorState;
use potlink::ConfigError;

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub knobs: [f32; CHANNEL_COUNT],
    pub reads: usize,
    pub shown: Vec<IndicatorState>,
    pub waits: usize,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            knobs: [0.0; CHANNEL_COUNT],
            reads: 0,
            shown: Vec::new(),
            waits: 0,
        }
    }

    pub fn last_shown(&self) -> Option<&IndicatorState> {
        self.shown.last()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalogPort for MockHardware {
    fn read_fraction(&mut self, channel: usize) -> f32 {
        self.reads += 1;
        self.knobs[channel]
    }
}

impl IndicatorPort for MockHardware {
    fn show(&mut self, state: &IndicatorState) {
        self.shown.push(*state);
    }
}

impl IdleWait for MockHardware {
    fn wait(&mut self) {
        self.waits += 1;
    }
}

// ── SentLog ───────────────────────────────────────────────────

/// `MessageSink` that keeps everything the device core emits.
#[derive(Default)]
pub struct SentLog {
    pub msgs: Vec<MidiMsg>,
}

impl MessageSink for SentLog {
    fn send(&mut self, msg: &MidiMsg) {
        self.msgs.push(msg.clone());
    }
}

// ── MockStore ─────────────────────────────────────────────────

/// Config store with an injectable load failure.
#[derive(Default)]
pub struct MockStore {
    pub record: Option<ConfigRecord>,
    pub fail_load: Option<ConfigError>,
    pub saves: usize,
}

impl ConfigPort for MockStore {
    fn load(&self) -> Result<ConfigRecord, ConfigError> {
        if let Some(e) = self.fail_load {
            return Err(e);
        }
        self.record.ok_or(ConfigError::NotFound)
    }

    fn save(&mut self, record: &ConfigRecord) -> Result<(), ConfigError> {
        self.record = Some(*record);
        self.saves += 1;
        Ok(())
    }
}

// ── Byte pipe ─────────────────────────────────────────────────

type Buffer = Rc<RefCell<VecDeque<u8>>>;

/// One end of an in-memory serial link.
pub struct PipeEnd {
    rx: Buffer,
    tx: Buffer,
    /// Largest read returned, to exercise partial-packet reassembly.
    pub max_read: usize,
}

/// Two connected ends: bytes written on one are read on the other.
pub fn pipe() -> (PipeEnd, PipeEnd) {
    let a: Buffer = Rc::default();
    let b: Buffer = Rc::default();
    (
        PipeEnd {
            rx: a.clone(),
            tx: b.clone(),
            max_read: usize::MAX,
        },
        PipeEnd {
            rx: b,
            tx: a,
            max_read: usize::MAX,
        },
    )
}

impl Transport for PipeEnd {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let mut rx = self.rx.borrow_mut();
        let n = buf.len().min(rx.len()).min(self.max_read);
        for (slot, byte) in buf.iter_mut().zip(rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        self.tx.borrow_mut().extend(data);
        Ok(data.len())
    }

    fn available(&self) -> bool {
        !self.rx.borrow().is_empty()
    }
}
