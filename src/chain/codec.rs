//! Link packet codec.
//!
//! Wire format (one packet per message, fixed size):
//! ```text
//! ┌───────────────────┬────────┬────────┬────────┐
//! │ addr(4) │ tag(4)  │ data 0 │ data 1 │ data 2 │
//! └───────────────────┴────────┴────────┴────────┘
//! ```
//!
//! Unused data bytes are zero.  For MIDI packets the payload length is
//! implied by the status byte; other kinds always carry all three bytes.
//!
//! [`PacketDecoder`] accumulates incoming bytes and yields complete
//! packets.  A single `Transport::read` may return part of a packet or
//! several packets concatenated.

use super::message::{MessageKind, RoutedMessage};
use crate::error::LinkError;

/// Size of one link packet on the wire.
pub const PACKET_SIZE: usize = 4;

/// Largest address the header can hold.
pub const MAX_WIRE_ADDRESS: u8 = 0x0f;

/// Number of payload bytes that follow a MIDI status byte, plus the status itself.
pub fn midi_message_len(status: u8) -> usize {
    match status {
        0x80..=0xbf | 0xe0..=0xef => 3,
        0xc0..=0xdf => 2,
        0xf1 | 0xf3 => 2,
        0xf2 => 3,
        _ => 1,
    }
}

/// Encode `msg` into a single packet.
pub fn encode_packet(msg: &RoutedMessage) -> Result<[u8; PACKET_SIZE], LinkError> {
    if msg.address > MAX_WIRE_ADDRESS {
        return Err(LinkError::AddressOutOfRange(msg.address));
    }
    let mut out = [0u8; PACKET_SIZE];
    out[0] = (msg.address << 4) | msg.kind.tag();
    out[1..=msg.payload.len()].copy_from_slice(&msg.payload);
    Ok(out)
}

/// Decode a single packet.
pub fn decode_packet(packet: &[u8; PACKET_SIZE]) -> Result<RoutedMessage, LinkError> {
    let address = packet[0] >> 4;
    let kind = MessageKind::from_tag(packet[0]);
    let data = &packet[1..];
    match kind {
        MessageKind::Midi => {
            let len = midi_message_len(data[0]);
            RoutedMessage::midi_bytes(address, &data[..len])
        }
        MessageKind::Other(tag) => RoutedMessage::other(tag, address, data),
    }
}

/// Streaming packet decoder.
pub struct PacketDecoder {
    buf: [u8; PACKET_SIZE],
    collected: usize,
    rejected: u32,
}

impl PacketDecoder {
    pub fn new() -> Self {
        Self {
            buf: [0; PACKET_SIZE],
            collected: 0,
            rejected: 0,
        }
    }

    /// Push one byte.  Returns a message when it completes a valid packet.
    pub fn push(&mut self, byte: u8) -> Option<RoutedMessage> {
        self.buf[self.collected] = byte;
        self.collected += 1;
        if self.collected < PACKET_SIZE {
            return None;
        }
        self.collected = 0;
        match decode_packet(&self.buf) {
            Ok(msg) => Some(msg),
            Err(_) => {
                self.rejected = self.rejected.wrapping_add(1);
                None
            }
        }
    }

    /// Feed a chunk of bytes, calling `on_message` for every complete packet.
    pub fn feed(&mut self, data: &[u8], mut on_message: impl FnMut(RoutedMessage)) {
        for &byte in data {
            if let Some(msg) = self.push(byte) {
                on_message(msg);
            }
        }
    }

    /// Discard a partial packet (e.g. after a link reconnect).
    pub fn reset(&mut self) {
        self.collected = 0;
    }

    /// Bytes of the current partial packet held so far.
    pub fn pending(&self) -> usize {
        self.collected
    }

    /// Packets dropped because they failed to decode.
    pub fn rejected(&self) -> u32 {
        self.rejected
    }
}

impl Default for PacketDecoder {
    fn default() -> Self {
        Self::new()
    }
}
