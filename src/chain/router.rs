//! Message router.
//!
//! Multiplexes the three transports against the device core:
//!
//! | Arrives on  | Address           | Action                                   |
//! |-------------|-------------------|------------------------------------------|
//! | Local       | 0                 | dispatch to the device core              |
//! | Local       | a > 0             | forward to Downstream with a − 1         |
//! | Upstream    | any (MIDI kind)   | dispatch to the device core              |
//! | Downstream  | idle address      | drop                                     |
//! | Downstream  | a                 | forward to Local with a + 1, if ready    |
//!
//! Device output goes to Local and Upstream at address 0.  Every drop is
//! silent: it is counted in [`RouterStats`] and logged at `trace`.

use log::{debug, trace};
use midi_msg::MidiMsg;

use super::message::{MessageKind, RoutedMessage};
use super::transport::MessagePort;
use crate::app::ports::{MessageHandler, MessageSink};
use crate::config::RouterSettings;

/// Which transport a message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Local,
    Upstream,
    Downstream,
}

/// Running counters, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    /// Messages handed to the device core.
    pub dispatched: u32,
    /// Messages forwarded to another transport.
    pub forwarded: u32,
    /// Downstream messages carrying the idle address.
    pub dropped_idle: u32,
    /// Downstream messages dropped because Local was not connected.
    pub dropped_unready: u32,
    /// Messages that could not be parsed, sent, or have no route.
    pub dropped_other: u32,
}

/// Counters roll over instead of saturating or panicking.
fn bump(counter: &mut u32) {
    *counter = counter.wrapping_add(1);
}

pub struct Router<L, U, D> {
    local: L,
    upstream: U,
    downstream: D,
    settings: RouterSettings,
    stats: RouterStats,
}

impl<L, U, D> Router<L, U, D>
where
    L: MessagePort,
    U: MessagePort,
    D: MessagePort,
{
    pub fn new(local: L, upstream: U, downstream: D, settings: RouterSettings) -> Self {
        debug!(
            "Router: idle address 0x{:02x}, {} msgs/port/poll",
            settings.idle_address(),
            settings.max_per_poll
        );
        Self {
            local,
            upstream,
            downstream,
            settings,
            stats: RouterStats::default(),
        }
    }

    /// Service every transport once.
    ///
    /// Takes at most `max_per_poll` messages from each port so a flooded
    /// link cannot starve the rest of the loop.
    pub fn poll(&mut self, handler: &mut impl MessageHandler) {
        let budget = self.settings.max_per_poll;

        for _ in 0..budget {
            let Some(msg) = self.local.receive() else { break };
            self.route(Source::Local, &msg, handler);
        }
        for _ in 0..budget {
            let Some(msg) = self.upstream.receive() else { break };
            self.route(Source::Upstream, &msg, handler);
        }
        for _ in 0..budget {
            let Some(msg) = self.downstream.receive() else { break };
            self.route(Source::Downstream, &msg, handler);
        }
    }

    /// Apply the routing rules to one inbound message.
    pub fn route(&mut self, source: Source, msg: &RoutedMessage, handler: &mut impl MessageHandler) {
        match source {
            Source::Local if msg.address == 0 => self.dispatch(msg, handler),
            Source::Local => {
                let fwd = msg.with_address(msg.address - 1);
                match self.downstream.send(&fwd) {
                    Ok(()) => {
                        bump(&mut self.stats.forwarded);
                        trace!("Router: local addr {} -> downstream", msg.address);
                    }
                    Err(e) => {
                        bump(&mut self.stats.dropped_other);
                        trace!("Router: downstream send failed: {:?}", e);
                    }
                }
            }
            Source::Upstream if msg.kind == MessageKind::Midi => self.dispatch(msg, handler),
            Source::Upstream => {
                bump(&mut self.stats.dropped_other);
                trace!("Router: upstream {:?} ignored", msg.kind);
            }
            Source::Downstream => self.forward_up(msg),
        }
    }

    fn dispatch(&mut self, msg: &RoutedMessage, handler: &mut impl MessageHandler) {
        match msg.to_midi() {
            Some(midi) => {
                bump(&mut self.stats.dispatched);
                handler.handle_message(&midi);
            }
            None => {
                bump(&mut self.stats.dropped_other);
                trace!("Router: unparseable payload {:02x?}", msg.payload.as_slice());
            }
        }
    }

    fn forward_up(&mut self, msg: &RoutedMessage) {
        let idle = self.settings.idle_address();
        if msg.address >= idle {
            bump(&mut self.stats.dropped_idle);
            trace!("Router: downstream idle address dropped");
            return;
        }
        if !self.local.is_ready() {
            bump(&mut self.stats.dropped_unready);
            trace!("Router: local not ready, downstream message dropped");
            return;
        }
        let fwd = msg.with_address(msg.address + 1);
        match self.local.send(&fwd) {
            Ok(()) => bump(&mut self.stats.forwarded),
            Err(e) => {
                bump(&mut self.stats.dropped_other);
                trace!("Router: local send failed: {:?}", e);
            }
        }
    }

    /// True when no transport has inbound traffic pending.
    pub fn is_idle(&self) -> bool {
        self.local.is_idle() && self.upstream.is_idle() && self.downstream.is_idle()
    }

    pub fn stats(&self) -> RouterStats {
        self.stats
    }

    pub fn local_mut(&mut self) -> &mut L {
        &mut self.local
    }

    pub fn upstream_mut(&mut self) -> &mut U {
        &mut self.upstream
    }

    pub fn downstream_mut(&mut self) -> &mut D {
        &mut self.downstream
    }
}

impl<L, U, D> MessageSink for Router<L, U, D>
where
    L: MessagePort,
    U: MessagePort,
    D: MessagePort,
{
    /// Device output: address 0, to Local and Upstream.
    fn send(&mut self, msg: &MidiMsg) {
        let routed = match RoutedMessage::from_midi(0, msg) {
            Ok(r) => r,
            Err(e) => {
                bump(&mut self.stats.dropped_other);
                debug!("Router: cannot wrap outgoing message: {}", e);
                return;
            }
        };
        if let Err(e) = self.local.send(&routed) {
            trace!("Router: local send failed: {:?}", e);
        }
        if let Err(e) = self.upstream.send(&routed) {
            trace!("Router: upstream send failed: {:?}", e);
        }
    }
}
