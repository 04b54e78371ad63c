//! Node — the single owned context and its poll loop.
//!
//! One [`Node`] owns the router, the device core and the hardware
//! adapter.  Each call to [`Node::poll`] is one pass of the main loop:
//!
//! ```text
//!  poll(now)
//!   ├─ 0. device.set_now(now)
//!   ├─ 1. indicators ◀── device.indicators()
//!   ├─ 2. router.poll() ──▶ device.handle_message()
//!   ├─ 3. device.run_tasks() ──▶ sample / emit ──▶ router (Local + Upstream)
//!   └─ 4. idle? ──▶ hw.wait()
//! ```

use log::trace;

use super::device::DeviceCore;
use super::ports::{AnalogPort, IdleWait, IndicatorPort};
use crate::chain::router::Router;
use crate::chain::transport::MessagePort;
use crate::sensors::filter::{AnalogFilter, ResponsiveFilter};

/// Outcome of one poll pass, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Control changes sent by the emission pass.
    pub emitted: usize,
    /// Whether the idle wait was entered.
    pub waited: bool,
}

pub struct Node<L, U, D, H, F = ResponsiveFilter> {
    router: Router<L, U, D>,
    device: DeviceCore<F>,
    hw: H,
}

impl<L, U, D, H, F> Node<L, U, D, H, F>
where
    L: MessagePort,
    U: MessagePort,
    D: MessagePort,
    H: AnalogPort + IndicatorPort + IdleWait,
    F: AnalogFilter + Default,
{
    pub fn new(router: Router<L, U, D>, device: DeviceCore<F>, hw: H) -> Self {
        Self { router, device, hw }
    }

    /// One pass of the main loop.
    pub fn poll(&mut self, now_ms: u32) -> PollReport {
        self.device.set_now(now_ms);
        self.hw.show(self.device.indicators());

        self.router.poll(&mut self.device);

        let emitted = self
            .device
            .run_tasks(now_ms, &mut self.hw, &mut self.router);

        let waited = self.router.is_idle() && self.device.is_idle();
        if waited {
            trace!("Node: idle at {}ms", now_ms);
            self.hw.wait();
        }

        PollReport { emitted, waited }
    }

    pub fn router(&self) -> &Router<L, U, D> {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router<L, U, D> {
        &mut self.router
    }

    pub fn device(&self) -> &DeviceCore<F> {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut DeviceCore<F> {
        &mut self.device
    }

    pub fn hw(&self) -> &H {
        &self.hw
    }

    pub fn hw_mut(&mut self) -> &mut H {
        &mut self.hw
    }
}
