use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use otime_types::class_params::ClassParams;
use otime_types::event::ClassType;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::model::registry;

#[derive(Deserialize)]
pub struct ClassRequest {
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub course_id: Option<i64>,
    #[serde(default)]
    pub params: ClassParams,
}

pub async fn list(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<ClassType>>, ApiError> {
    Ok(Json(registry::get_classes(&state.db, event_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(body): Json<ClassRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id = registry::add_class(
        &state.db,
        &state.cache,
        event_id,
        &body.name,
        body.short_name.as_deref(),
        body.course_id,
        body.params,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn update(
    State(state): State<AppState>,
    Path((event_id, id)): Path<(i64, i64)>,
    Json(body): Json<ClassRequest>,
) -> Result<StatusCode, ApiError> {
    registry::update_class(
        &state.db,
        &state.cache,
        event_id,
        id,
        &body.name,
        body.short_name.as_deref(),
        body.course_id,
        body.params,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(state): State<AppState>,
    Path((event_id, id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    registry::delete_class(&state.db, &state.cache, event_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
