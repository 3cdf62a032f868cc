//! JSON handlers for the fans.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use aroma_app::ports::{AudioEngine, OutputDriver};

use crate::api::CommandResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Query string of the activation endpoint.
#[derive(Debug, Deserialize)]
pub struct ActivateQuery {
    pub duration_seconds: i64,
}

/// Countdown of one fan as reported by the status endpoint.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FanStatusBody {
    pub remaining_seconds: u32,
    pub total_seconds: u32,
}

/// `POST /api/fan/{fan_id}/on?duration_seconds=N`
pub async fn turn_on<D, E>(
    State(state): State<AppState<D, E>>,
    Path(fan_id): Path<i64>,
    Query(query): Query<ActivateQuery>,
) -> Result<Json<CommandResponse>, ApiError>
where
    D: OutputDriver + 'static,
    E: AudioEngine + 'static,
{
    state.fans.activate(fan_id, query.duration_seconds)?;
    Ok(Json(CommandResponse::ok(format!(
        "Fan {fan_id} turned on for {} seconds",
        query.duration_seconds
    ))))
}

/// `POST /api/fan/{fan_id}/off`
pub async fn turn_off<D, E>(
    State(state): State<AppState<D, E>>,
    Path(fan_id): Path<i64>,
) -> Result<Json<CommandResponse>, ApiError>
where
    D: OutputDriver + 'static,
    E: AudioEngine + 'static,
{
    state.fans.deactivate(fan_id)?;
    Ok(Json(CommandResponse::ok(format!("Fan {fan_id} turned off"))))
}

/// `GET /api/fan/status`, keyed `fan_0` to `fan_3`.
pub async fn status<D, E>(
    State(state): State<AppState<D, E>>,
) -> Json<BTreeMap<String, FanStatusBody>>
where
    D: OutputDriver + 'static,
    E: AudioEngine + 'static,
{
    let statuses = state
        .fans
        .statuses()
        .into_iter()
        .map(|status| {
            (
                format!("fan_{}", status.fan_id),
                FanStatusBody {
                    remaining_seconds: status.remaining_seconds,
                    total_seconds: status.total_seconds,
                },
            )
        })
        .collect();
    Json(statuses)
}
