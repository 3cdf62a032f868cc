//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod fans;
#[allow(clippy::missing_errors_doc)]
pub mod music;
pub mod sse;

use axum::Router;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};

use aroma_app::ports::{AudioEngine, OutputDriver};

use crate::state::AppState;

/// Body returned by every command endpoint.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResponse {
    pub success: bool,
    pub message: String,
}

impl CommandResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Build the `/api` sub-router.
pub fn routes<D, E>() -> Router<AppState<D, E>>
where
    D: OutputDriver + 'static,
    E: AudioEngine + 'static,
{
    Router::new()
        // Fans
        .route("/fan/{fan_id}/on", post(fans::turn_on::<D, E>))
        .route("/fan/{fan_id}/off", post(fans::turn_off::<D, E>))
        .route("/fan/status", get(fans::status::<D, E>))
        // Music
        .route("/music/{track_id}/start", post(music::start::<D, E>))
        .route("/music/stop", post(music::stop::<D, E>))
        .route("/music/status", get(music::status::<D, E>))
        // Live updates
        .route("/events/stream", get(sse::stream::<D, E>))
}
