use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use otime_types::entry::ClassResults;
use otime_types::event::EventType;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::model::{events, results};

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<EventType>>, ApiError> {
    Ok(Json(events::get_events(&state.db).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EventType>, ApiError> {
    Ok(Json(events::get_event(&state.db, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(mut body): Json<events::EventUpsert>,
) -> Result<(StatusCode, Json<EventType>), ApiError> {
    body.id = None;
    let event = events::add_or_update_event(&state.db, &state.cache, body).await?;
    state.notifier.update_event(&event);
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut body): Json<events::EventUpsert>,
) -> Result<Json<EventType>, ApiError> {
    body.id = Some(id);
    let event = events::add_or_update_event(&state.db, &state.cache, body).await?;
    state.notifier.update_event(&event);
    Ok(Json(event))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    events::delete_event(&state.db, &state.cache, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct EventResults {
    pub event: EventType,
    pub results: Vec<ClassResults>,
}

pub async fn class_results(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EventResults>, ApiError> {
    let (event, results) = results::event_class_results(&state.db, &state.cache, id).await?;
    Ok(Json(EventResults {
        event,
        results: results.as_ref().clone(),
    }))
}
