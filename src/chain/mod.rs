//! Daisy-chain messaging.
//!
//! Every node sits between one upstream link (towards the host) and one
//! downstream link (towards further nodes), and also has its own Local
//! endpoint.  Messages carry a small address: 0 is "this node", each hop
//! down the chain peels one off, each hop back up adds one.
//!
//! ```text
//!   host ══ Local ══╗
//!                   ║ addr 0 ─▶ DeviceCore
//!   parent ═ Upstream ─▶ DeviceCore
//!                   ║ addr n>0 ─▶ Downstream (addr n−1)
//!   child  ═ Downstream ─▶ Local (addr n+1)
//! ```

pub mod codec;
pub mod message;
pub mod router;
pub mod transport;
