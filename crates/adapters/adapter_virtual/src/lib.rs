//! # aroma-adapter-virtual
//!
//! Simulated drivers standing in for the board's output pins and audio
//! mixer, so the controller runs unchanged on a development machine.
//!
//! ## Provided drivers
//!
//! | Driver | Port | Behaviour |
//! |--------|------|-----------|
//! | [`VirtualOutputDriver`] | `OutputDriver` | Remembers the level of every claimed pin |
//! | [`VirtualAudioEngine`] | `AudioEngine` | Reports busy for a fixed track length after `play` |
//!
//! ## Dependency rule
//!
//! Depends on `aroma-app` (port traits) and `aroma-domain` only.

mod devices;

pub use devices::{VirtualAudioEngine, VirtualOutputDriver};
