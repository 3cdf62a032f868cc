//! State builder shared by the handler tests.

use std::path::PathBuf;
use std::sync::Arc;

use aroma_adapter_virtual::{VirtualAudioEngine, VirtualOutputDriver};
use aroma_app::control_loop::LoopTiming;
use aroma_app::event_bus::EventDispatcher;
use aroma_app::fan_bank::{DEFAULT_FAN_PINS, FanBank};
use aroma_app::playback_controller::PlaybackController;
use aroma_domain::playback::TrackCatalog;

use crate::state::AppState;

pub(crate) type TestState = AppState<VirtualOutputDriver, VirtualAudioEngine>;

/// Controllers wired to virtual drivers. Nothing is started.
pub(crate) fn test_state(static_dir: impl Into<PathBuf>) -> TestState {
    let dispatcher = EventDispatcher::new();
    let fans = FanBank::new(
        &DEFAULT_FAN_PINS,
        VirtualOutputDriver::default(),
        &dispatcher,
        LoopTiming::default(),
    )
    .unwrap();
    let music = PlaybackController::new(
        VirtualAudioEngine::default(),
        TrackCatalog::default(),
        dispatcher.clone(),
        LoopTiming::default(),
    );
    AppState::new(Arc::new(fans), Arc::new(music), dispatcher, static_dir)
}
