use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use otime_types::competitor::{CompetitorType, Gender};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::model::registry;

#[derive(Deserialize)]
pub struct CompetitorRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub club_id: Option<i64>,
    #[serde(default)]
    pub chip: String,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<CompetitorType>>, ApiError> {
    Ok(Json(registry::get_competitors(&state.db).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CompetitorRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id = registry::add_competitor(
        &state.db,
        &body.first_name,
        &body.last_name,
        body.club_id,
        body.gender,
        body.year,
        &body.chip,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CompetitorRequest>,
) -> Result<StatusCode, ApiError> {
    registry::update_competitor(
        &state.db,
        &state.cache,
        id,
        &body.first_name,
        &body.last_name,
        body.gender,
        body.year,
        body.club_id,
        &body.chip,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    registry::delete_competitor(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
