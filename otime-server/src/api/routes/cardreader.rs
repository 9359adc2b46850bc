use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::api::ws::process_message;
use crate::model::cardreader;

#[derive(Deserialize)]
pub struct LogQuery {
    pub key: String,
}

/// Replay a recorded card-reader log: one raw JSON document per array
/// element, processed in order. Each element yields its own response;
/// failures are reported per element, not for the batch.
pub async fn replay_log(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
    Json(batch): Json<Vec<Value>>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let mut responses = Vec::with_capacity(batch.len());
    for item in batch {
        let raw = item.to_string();
        responses.push(process_message(&state, &query.key, &raw).await);
    }
    Ok(Json(responses))
}

#[derive(Deserialize)]
pub struct AssignNameRequest {
    pub key: String,
    pub chip: String,
    pub first_name: String,
    pub last_name: String,
}

/// Tie an unassigned light-mode result to a competitor by name.
pub async fn assign_name(
    State(state): State<AppState>,
    Json(body): Json<AssignNameRequest>,
) -> Result<Json<Value>, ApiError> {
    let (event, response) = cardreader::assign_name(
        &state.db,
        &state.cache,
        &body.key,
        &body.chip,
        &body.first_name,
        &body.last_name,
    )
    .await?;
    state.notifier.update_event(&event);
    serde_json::to_value(&response)
        .map(Json)
        .map_err(|_| ApiError::Internal)
}
