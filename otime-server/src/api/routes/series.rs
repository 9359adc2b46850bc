use axum::{Json, extract::State, http::StatusCode};
use otime_types::event::EventType;
use otime_types::series::{PersonSeriesResult, SeriesSettings};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::model::results;

#[derive(Serialize)]
pub struct SeriesStanding {
    pub settings: SeriesSettings,
    pub events: Vec<EventType>,
    pub classes: Vec<(String, Vec<PersonSeriesResult>)>,
}

pub async fn standing(State(state): State<AppState>) -> Result<Json<SeriesStanding>, ApiError> {
    let (settings, events, classes) = results::build_series_result(&state.db).await?;
    Ok(Json(SeriesStanding {
        settings,
        events,
        classes,
    }))
}

pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<SeriesSettings>, ApiError> {
    Ok(Json(results::get_series_settings(&state.db).await?))
}

pub async fn put_settings(
    State(state): State<AppState>,
    Json(settings): Json<SeriesSettings>,
) -> Result<StatusCode, ApiError> {
    results::update_series_settings(&state.db, &settings).await?;
    Ok(StatusCode::NO_CONTENT)
}
