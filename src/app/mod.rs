//! Application core — pure domain logic, zero I/O.
//!
//! The [`device`] module holds the node's state machine: sampling,
//! change-coalesced emission and inbound note/control handling.  [`node`]
//! wires it to the router and hardware ports in a single poll loop.  All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod device;
pub mod node;
pub mod ports;
