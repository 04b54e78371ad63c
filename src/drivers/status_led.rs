//! Discrete status LED driver.
//!
//! One GPIO, active high.  Tracks the last written level so the poll
//! loop can call [`StatusLed::set`] every pass without touching the pin
//! unless the level actually changes.

use embedded_hal::digital::OutputPin;
use log::warn;

pub struct StatusLed<P> {
    pin: P,
    current: Option<bool>,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, current: None }
    }

    pub fn set(&mut self, on: bool) {
        if self.current == Some(on) {
            return;
        }
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => self.current = Some(on),
            Err(e) => warn!("StatusLed: GPIO write failed: {:?}", e),
        }
    }

    pub fn is_on(&self) -> bool {
        self.current == Some(true)
    }
}
