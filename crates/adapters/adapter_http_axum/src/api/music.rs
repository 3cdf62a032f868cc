//! JSON handlers for the music channel.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use aroma_app::ports::{AudioEngine, OutputDriver};
use aroma_domain::id::TrackId;

use crate::api::CommandResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Body of `GET /api/music/status`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MusicStatusBody {
    pub currently_playing: Option<TrackId>,
}

/// `POST /api/music/{track_id}/start`
pub async fn start<D, E>(
    State(state): State<AppState<D, E>>,
    Path(track_id): Path<String>,
) -> Result<Json<CommandResponse>, ApiError>
where
    D: OutputDriver + 'static,
    E: AudioEngine + 'static,
{
    state.music.start_track(&track_id)?;
    Ok(Json(CommandResponse::ok(format!("Playing track {track_id}"))))
}

/// `POST /api/music/stop`
pub async fn stop<D, E>(State(state): State<AppState<D, E>>) -> Json<CommandResponse>
where
    D: OutputDriver + 'static,
    E: AudioEngine + 'static,
{
    state.music.stop_playback();
    Json(CommandResponse::ok("Music stopped"))
}

/// `GET /api/music/status`
pub async fn status<D, E>(State(state): State<AppState<D, E>>) -> Json<MusicStatusBody>
where
    D: OutputDriver + 'static,
    E: AudioEngine + 'static,
{
    Json(MusicStatusBody {
        currently_playing: state.music.status().current_track,
    })
}
