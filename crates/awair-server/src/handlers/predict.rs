//! Prediction HTTP handler.

use std::sync::Arc;

use awair_core::PredictionPayload;
use axum::body::Bytes;
use axum::{extract::State, Json};
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::predict as predict_service;
use crate::state::AppState;

/// POST /predict-rf - Predict the dominant pollutant for one reading.
///
/// The body is taken raw so that non-JSON bodies map to the same 400 as a
/// missing `input` field instead of the extractor's rejection.
pub async fn predict_rf(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictionPayload>, AppError> {
    let request_id = Uuid::new_v4();

    let payload = predict_service::predict(&state, request_id, &body).map_err(|e| {
        if e.is_client_error() {
            warn!(%request_id, "Rejected prediction request: {}", e);
        } else {
            error!(%request_id, "Prediction failed: {}", e);
        }
        AppError::from(e)
    })?;

    Ok(Json(payload))
}
