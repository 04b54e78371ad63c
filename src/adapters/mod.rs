//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter  | Implements                         | Connects to               |
//! |----------|------------------------------------|---------------------------|
//! | `sim`    | AnalogPort, IndicatorPort, IdleWait | Simulated knobs and LEDs |
//! | `store`  | ConfigPort                         | In-memory blob / JSON file |
//! | `time`   | —                                  | Host monotonic clock      |

pub mod sim;
pub mod store;
pub mod time;
