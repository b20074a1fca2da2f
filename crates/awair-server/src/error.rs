//! Application error types and Axum response conversion.

use awair_core::PredictError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const PREDICTION_FAILED: &str = "An error occurred during prediction";

/// Application-level errors with HTTP status code mapping.
#[derive(Debug)]
pub enum AppError {
    Predict(PredictError),
    Internal(String),
}

impl AppError {
    /// Creates an Internal error from any error type.
    pub fn internal(e: impl std::fmt::Display) -> Self {
        AppError::Internal(e.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Predict(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PredictError> for AppError {
    fn from(e: PredictError) -> Self {
        match e {
            PredictError::Unexpected(details) => AppError::Internal(details),
            other => AppError::Predict(other),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Predict(e) => ErrorResponse { error: e.to_string(), details: None },
            AppError::Internal(details) => ErrorResponse {
                error: PREDICTION_FAILED.into(),
                details: Some(details),
            },
        };
        (status, Json(body)).into_response()
    }
}
