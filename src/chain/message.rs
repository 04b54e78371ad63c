//! Routed message envelope.
//!
//! A [`RoutedMessage`] is one short MIDI message (or other link traffic)
//! tagged with a kind and a chain address.  The MIDI payload is kept as
//! raw bytes so forwarding never re-encodes it; [`RoutedMessage::to_midi`]
//! parses on demand when the message is for this node.

use heapless::Vec;
use midi_msg::MidiMsg;

use crate::error::LinkError;

/// Largest payload an envelope carries (a three-byte channel message).
pub const MAX_PAYLOAD: usize = 3;

/// Message-type tag carried in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// A short MIDI message.  The only kind dispatched to the device core.
    Midi,
    /// Any other link traffic, identified by its 4-bit tag (1–15).
    Other(u8),
}

impl MessageKind {
    pub fn from_tag(tag: u8) -> Self {
        match tag & 0x0f {
            0 => Self::Midi,
            t => Self::Other(t),
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            Self::Midi => 0,
            Self::Other(t) => t & 0x0f,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedMessage {
    pub kind: MessageKind,
    pub address: u8,
    pub payload: Vec<u8, MAX_PAYLOAD>,
}

impl RoutedMessage {
    /// Wrap a protocol message for `address`.
    pub fn from_midi(address: u8, msg: &MidiMsg) -> Result<Self, LinkError> {
        let bytes = msg.to_midi();
        Self::midi_bytes(address, &bytes)
    }

    /// Wrap raw MIDI bytes for `address`.
    pub fn midi_bytes(address: u8, bytes: &[u8]) -> Result<Self, LinkError> {
        match bytes.first() {
            Some(status) if status & 0x80 != 0 => {}
            _ => return Err(LinkError::MissingStatus),
        }
        let payload = Vec::from_slice(bytes).map_err(|_| LinkError::PayloadTooLong)?;
        Ok(Self {
            kind: MessageKind::Midi,
            address,
            payload,
        })
    }

    /// Non-MIDI link traffic.
    pub fn other(tag: u8, address: u8, bytes: &[u8]) -> Result<Self, LinkError> {
        let payload = Vec::from_slice(bytes).map_err(|_| LinkError::PayloadTooLong)?;
        Ok(Self {
            kind: MessageKind::from_tag(tag),
            address,
            payload,
        })
    }

    /// Parse the payload as a protocol message.  `None` for non-MIDI kinds
    /// or payloads the parser rejects.
    pub fn to_midi(&self) -> Option<MidiMsg> {
        if self.kind != MessageKind::Midi {
            return None;
        }
        MidiMsg::from_midi(&self.payload).ok().map(|(msg, _len)| msg)
    }

    /// Same message, different address.
    pub fn with_address(&self, address: u8) -> Self {
        Self {
            address,
            ..self.clone()
        }
    }
}
