//! Shared application state for axum handlers.

use std::path::PathBuf;
use std::sync::Arc;

use aroma_app::event_bus::EventDispatcher;
use aroma_app::fan_bank::FanBank;
use aroma_app::playback_controller::PlaybackController;
use aroma_app::ports::{AudioEngine, OutputDriver};

/// Application state shared across all axum handlers.
///
/// Generic over the output driver and audio engine to avoid dynamic
/// dispatch. `Clone` is implemented manually so the drivers themselves do
/// not need to be `Clone`.
pub struct AppState<D, E> {
    /// The four fan controllers.
    pub fans: Arc<FanBank<D, EventDispatcher>>,
    /// The music channel.
    pub music: Arc<PlaybackController<E, EventDispatcher>>,
    /// Source of the live status stream.
    pub dispatcher: EventDispatcher,
    /// Directory holding `aroma.html` and the other static assets.
    pub static_dir: PathBuf,
}

impl<D, E> Clone for AppState<D, E> {
    fn clone(&self) -> Self {
        Self {
            fans: Arc::clone(&self.fans),
            music: Arc::clone(&self.music),
            dispatcher: self.dispatcher.clone(),
            static_dir: self.static_dir.clone(),
        }
    }
}

impl<D, E> AppState<D, E>
where
    D: OutputDriver + 'static,
    E: AudioEngine + 'static,
{
    /// Create the state from controllers already shared with the daemon's
    /// shutdown path.
    pub fn new(
        fans: Arc<FanBank<D, EventDispatcher>>,
        music: Arc<PlaybackController<E, EventDispatcher>>,
        dispatcher: EventDispatcher,
        static_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fans,
            music,
            dispatcher,
            static_dir: static_dir.into(),
        }
    }
}
