//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the control core and the outside world.
//! They are defined here (in `app`) so that both the controllers and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod event_bus;
pub mod hardware;

pub use event_bus::EventPublisher;
pub use hardware::{AudioEngine, OutputDriver};
