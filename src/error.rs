//! Unified error types for the PotLink node.
//!
//! The message loop itself never fails: out-of-range notes, unready
//! transports and idle-address traffic are dropped silently (see
//! [`Router`](crate::chain::router::Router)).  Errors only exist at the
//! outer surfaces: decoding link packets and importing configuration
//! blobs.  All variants are `Copy`.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A link packet or envelope could not be built or decoded.
    Link(LinkError),
    /// A configuration record could not be imported or exported.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Payload does not start with a MIDI status byte.
    MissingStatus,
    /// Payload is longer than a single short MIDI message.
    PayloadTooLong,
    /// Address does not fit in the envelope's address field.
    AddressOutOfRange(u8),
    /// Transport refused the write.
    SendFailed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStatus => write!(f, "payload has no status byte"),
            Self::PayloadTooLong => write!(f, "payload exceeds 3 bytes"),
            Self::AddressOutOfRange(a) => write!(f, "address {a} out of range"),
            Self::SendFailed => write!(f, "transport send failed"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No stored configuration exists (first boot).
    NotFound,
    /// Serialized record could not be parsed.
    Malformed,
    /// Record could not be serialized.
    Encode,
    /// Persistence backend failed.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Malformed => write!(f, "config malformed"),
            Self::Encode => write!(f, "config encode failed"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
