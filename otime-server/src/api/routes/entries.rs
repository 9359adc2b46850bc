use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveTime;
use otime_types::entry::EntryType;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::formats::text;
use crate::model::{entries, events};

pub async fn list(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<EntryType>>, ApiError> {
    Ok(Json(entries::get_entries(&state.db, event_id).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EntryType>, ApiError> {
    Ok(Json(entries::get_entry(&state.db, id).await?))
}

pub async fn upsert(
    State(state): State<AppState>,
    Json(body): Json<entries::EntryUpsert>,
) -> Result<Json<Value>, ApiError> {
    let event = events::get_event(&state.db, body.event_id).await?;
    let (id, not_competing_promoted) =
        entries::add_or_update_entry(&state.db, &state.cache, body).await?;
    state.notifier.update_event(&event);
    Ok(Json(json!({ "id": id, "notCompetingPromoted": not_competing_promoted })))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    entries::delete_entry(&state.db, &state.cache, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ResultEditRequest {
    pub event_id: i64,
    pub command: entries::EditCommand,
    #[serde(default)]
    pub control: String,
    pub row: entries::SplitSelector,
    #[serde(default)]
    pub punch_time: Option<NaiveTime>,
}

pub async fn edit_result(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ResultEditRequest>,
) -> Result<Json<EntryType>, ApiError> {
    let entry = entries::edit_entry_result(
        &state.db,
        &state.cache,
        id,
        body.event_id,
        body.command,
        &body.control,
        body.row,
        body.punch_time,
    )
    .await?;
    Ok(Json(entry))
}

#[derive(Deserialize)]
pub struct ImportQuery {
    #[serde(default)]
    pub delta: bool,
}

/// Import a text-format entry list posted as the request body.
pub async fn import(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Query(query): Query<ImportQuery>,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let records = text::parse(&body)?;
    let count = records.len();
    if !query.delta {
        entries::delete_entries(&state.db, &state.cache, event_id).await?;
    }
    entries::import_entries(&state.db, &state.cache, event_id, records).await?;
    let event = events::get_event(&state.db, event_id).await?;
    state.notifier.update_event(&event);
    Ok(Json(json!({ "imported": count })))
}

pub async fn export(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<String, ApiError> {
    let entries = entries::get_entries(&state.db, event_id).await?;
    Ok(text::create(&entries))
}
