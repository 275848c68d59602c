//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter    | Implements             | Connects to                    |
//! |------------|------------------------|--------------------------------|
//! | `gpio`     | EnablePin, DeviceReady | ESP32 GPIO / in-memory pin     |
//! | `time`     | MonotonicTimer         | ESP32 system timer / std clock |
//! | `sim`      | MonotonicTimer         | Virtual clock (tests, demos)   |
//! | `critical` | critical_section::Impl | ESP-IDF process-wide mutex     |

#[cfg(target_os = "espidf")]
mod critical;
pub mod gpio;
pub mod sim;
pub mod time;
