use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use otime_types::event::CourseType;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::model::registry;

#[derive(Deserialize)]
pub struct CourseRequest {
    pub name: String,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub climb: Option<f64>,
    #[serde(default)]
    pub controls: Vec<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<CourseType>>, ApiError> {
    Ok(Json(registry::get_courses(&state.db, event_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(body): Json<CourseRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id = registry::add_course(
        &state.db,
        &state.cache,
        event_id,
        &body.name,
        body.length,
        body.climb,
        body.controls,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn update(
    State(state): State<AppState>,
    Path((event_id, id)): Path<(i64, i64)>,
    Json(body): Json<CourseRequest>,
) -> Result<StatusCode, ApiError> {
    registry::update_course(
        &state.db,
        &state.cache,
        event_id,
        id,
        &body.name,
        body.length,
        body.climb,
        body.controls,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(state): State<AppState>,
    Path((event_id, id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    registry::delete_course(&state.db, &state.cache, event_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
