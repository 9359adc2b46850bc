use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use otime_types::competitor::ClubType;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::model::registry;

#[derive(Deserialize)]
pub struct ClubRequest {
    pub name: String,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ClubType>>, ApiError> {
    Ok(Json(registry::get_clubs(&state.db).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<ClubRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id = registry::add_club(&state.db, &body.name).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ClubRequest>,
) -> Result<StatusCode, ApiError> {
    registry::update_club(&state.db, &state.cache, id, &body.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    registry::delete_club(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
