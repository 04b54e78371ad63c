//! Transport abstractions.
//!
//! Two layers:
//!
//! - [`Transport`] — any byte-oriented channel (UART link, USB endpoint).
//! - [`MessagePort`] — a source/sink of whole [`RoutedMessage`]s.  The
//!   router is generic over this, so Local, Upstream and Downstream can be
//!   backed by anything.
//!
//! [`LinkPort`] adapts a byte [`Transport`] into a [`MessagePort`] using
//! the packet codec; [`QueuePort`] is an in-memory port for simulation and
//! tests; [`NullPort`] discards everything.

use heapless::Deque;
use log::trace;

use super::codec::{PACKET_SIZE, PacketDecoder, encode_packet};
use super::message::RoutedMessage;
use crate::error::LinkError;

// ───────────────────────────────────────────────────────────────
// Byte transport
// ───────────────────────────────────────────────────────────────

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written; `Ok(0)` means the
    /// transport cannot take more right now.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Message port
// ───────────────────────────────────────────────────────────────

/// Source and sink of routed messages.
pub trait MessagePort {
    type Error: core::fmt::Debug;

    /// Take the next inbound message, if any.  Never blocks.
    fn receive(&mut self) -> Option<RoutedMessage>;

    fn send(&mut self, msg: &RoutedMessage) -> Result<(), Self::Error>;

    /// Whether a consumer is attached on the far side.
    fn is_ready(&self) -> bool {
        true
    }

    /// Whether no inbound traffic is pending.
    fn is_idle(&self) -> bool;
}

/// A null port that discards all sends and never receives.
pub struct NullPort;

impl MessagePort for NullPort {
    type Error = ();

    fn receive(&mut self) -> Option<RoutedMessage> {
        None
    }

    fn send(&mut self, _msg: &RoutedMessage) -> Result<(), ()> {
        Ok(())
    }

    fn is_ready(&self) -> bool {
        false
    }

    fn is_idle(&self) -> bool {
        true
    }
}

// ───────────────────────────────────────────────────────────────
// In-memory queue port
// ───────────────────────────────────────────────────────────────

/// Bounded in-memory port: `inbound` is what the node will receive,
/// `outbound` is what the node sent.
pub struct QueuePort<const N: usize> {
    inbound: Deque<RoutedMessage, N>,
    outbound: Deque<RoutedMessage, N>,
    connected: bool,
}

impl<const N: usize> QueuePort<N> {
    pub fn new() -> Self {
        Self {
            inbound: Deque::new(),
            outbound: Deque::new(),
            connected: true,
        }
    }

    /// Queue a message for the node to receive.  Returns `false` if full.
    pub fn inject(&mut self, msg: RoutedMessage) -> bool {
        self.inbound.push_back(msg).is_ok()
    }

    /// Take the oldest message the node sent.
    pub fn take_sent(&mut self) -> Option<RoutedMessage> {
        self.outbound.pop_front()
    }

    pub fn drain_sent(&mut self) -> impl Iterator<Item = RoutedMessage> + '_ {
        core::iter::from_fn(move || self.outbound.pop_front())
    }

    pub fn sent_len(&self) -> usize {
        self.outbound.len()
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl<const N: usize> Default for QueuePort<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MessagePort for QueuePort<N> {
    type Error = LinkError;

    fn receive(&mut self) -> Option<RoutedMessage> {
        self.inbound.pop_front()
    }

    fn send(&mut self, msg: &RoutedMessage) -> Result<(), LinkError> {
        self.outbound
            .push_back(msg.clone())
            .map_err(|_| LinkError::SendFailed)
    }

    fn is_ready(&self) -> bool {
        self.connected
    }

    fn is_idle(&self) -> bool {
        self.inbound.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Byte-link port
// ───────────────────────────────────────────────────────────────

/// Inbound messages buffered between decoding and routing.
const LINK_RX_DEPTH: usize = 8;

/// A [`MessagePort`] over a byte [`Transport`], framed with the packet codec.
pub struct LinkPort<T> {
    transport: T,
    decoder: PacketDecoder,
    rx: Deque<RoutedMessage, LINK_RX_DEPTH>,
}

impl<T: Transport> LinkPort<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            decoder: PacketDecoder::new(),
            rx: Deque::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn pump(&mut self) {
        let mut buf = [0u8; LINK_RX_DEPTH * PACKET_SIZE];
        while !self.rx.is_full() && self.transport.available() {
            // Read no more than the free queue slots can take once decoded,
            // so anything beyond stays in the transport.
            let room = (LINK_RX_DEPTH - self.rx.len()) * PACKET_SIZE - self.decoder.pending();
            let n = match self.transport.read(&mut buf[..room]) {
                Ok(0) => break,
                Ok(n) => n.min(room),
                Err(e) => {
                    trace!("LinkPort: read failed: {:?}", e);
                    break;
                }
            };
            let rx = &mut self.rx;
            self.decoder.feed(&buf[..n], |msg| {
                if rx.push_back(msg).is_err() {
                    trace!("LinkPort: rx queue full, packet dropped");
                }
            });
        }
    }
}

impl<T: Transport> MessagePort for LinkPort<T> {
    type Error = LinkError;

    fn receive(&mut self) -> Option<RoutedMessage> {
        if self.rx.is_empty() {
            self.pump();
        }
        self.rx.pop_front()
    }

    /// Writes the whole packet, retrying short writes.  A transport that
    /// stalls part-way leaves the peer's decoder misaligned; this is
    /// reported as `SendFailed`.
    fn send(&mut self, msg: &RoutedMessage) -> Result<(), LinkError> {
        let packet = encode_packet(msg)?;
        let mut written = 0;
        while written < packet.len() {
            match self.transport.write(&packet[written..]) {
                Ok(0) => {
                    trace!("LinkPort: write stalled after {} of {} bytes", written, PACKET_SIZE);
                    return Err(LinkError::SendFailed);
                }
                Ok(n) => written += n,
                Err(e) => {
                    trace!("LinkPort: write failed: {:?}", e);
                    return Err(LinkError::SendFailed);
                }
            }
        }
        Ok(())
    }

    fn is_idle(&self) -> bool {
        self.rx.is_empty() && !self.transport.available()
    }
}
