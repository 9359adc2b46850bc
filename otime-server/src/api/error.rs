use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::Error;

#[derive(Debug)]
pub enum ApiError {
    Conflict(String),
    NotFound(String),
    BadRequest(String),
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::EventNotFound(msg) => ApiError::Conflict(msg),
            Error::Constraint(msg) => ApiError::Conflict(msg),
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::ClubNotFound(_)
            | Error::CompetitorNotFound(_)
            | Error::CourseNotFound(_)
            | Error::ClassNotFound(_)
            | Error::EntryNotFound(_) => ApiError::NotFound(err.to_string()),
            err => {
                tracing::error!(error = %err, "internal error");
                ApiError::Internal
            }
        }
    }
}
