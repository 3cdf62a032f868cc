//! # aroma-app
//!
//! Control layer: the background loops and the **port definitions** (traits)
//! they drive.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `OutputDriver`: drive and release the fan output pins
//!   - `AudioEngine`: load, play and stop a single audio track
//!   - `EventPublisher`: hand a status snapshot to whoever is listening
//! - Run one countdown loop per fan (`FanController`, grouped in `FanBank`)
//! - Run the music loop (`PlaybackController`)
//! - Provide the in-process `EventDispatcher` that forwards snapshots to
//!   subscribers
//!
//! ## Dependency rule
//! Depends on `aroma-domain` only (plus `tokio` for tasks, timers and
//! channels). Never imports adapter crates. Adapters depend on *this* crate,
//! not the reverse.

pub mod control_loop;
pub mod event_bus;
pub mod fan_bank;
pub mod fan_controller;
pub mod playback_controller;
pub mod ports;

#[cfg(test)]
mod testing;

pub use control_loop::LoopTiming;
pub use event_bus::EventDispatcher;
pub use fan_bank::{DEFAULT_FAN_PINS, FanBank};
pub use fan_controller::FanController;
pub use playback_controller::PlaybackController;
