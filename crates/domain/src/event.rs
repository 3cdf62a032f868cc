//! Event: an immutable status snapshot fanned out to observers.
//!
//! Controllers publish one event per tick. Events are plain values: a
//! subscriber owns its copy and never sees later mutations of live state.

use serde::{Deserialize, Serialize};

use crate::fan::FanStatus;
use crate::playback::PlaybackStatus;

/// Status snapshot published by a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    FanStatus(FanStatus),
    PlaybackStatus(PlaybackStatus),
}

impl From<FanStatus> for Event {
    fn from(status: FanStatus) -> Self {
        Self::FanStatus(status)
    }
}

impl From<PlaybackStatus> for Event {
    fn from(status: PlaybackStatus) -> Self {
        Self::PlaybackStatus(status)
    }
}
