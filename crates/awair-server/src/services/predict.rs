//! Dominant-pollutant prediction service.

use awair_core::{FeatureVector, Prediction, PredictionPayload, PredictError};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::dto::PredictRequest;
use crate::state::AppState;

/// Validates the raw body into a feature vector.
///
/// Bodies that are not a JSON object, or whose `input` is absent or null,
/// are malformed. The classifier is never reached from here.
pub fn parse_request(body: &[u8]) -> Result<FeatureVector, PredictError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| PredictError::MalformedRequest)?;
    if !value.is_object() {
        return Err(PredictError::MalformedRequest);
    }
    let req: PredictRequest =
        serde_json::from_value(value).map_err(|_| PredictError::MalformedRequest)?;

    let input = req
        .input
        .filter(|v| !v.is_null())
        .ok_or(PredictError::MalformedRequest)?;

    let items = input.as_array().ok_or_else(|| {
        PredictError::InvalidValue(format!("input must be an array of numbers, got {input}"))
    })?;

    FeatureVector::from_json(items)
}

/// Runs one request end to end: validate, classify, enrich.
pub fn predict(state: &AppState, request_id: Uuid, body: &[u8]) -> Result<PredictionPayload, PredictError> {
    let features = parse_request(body)?;

    let pollutant = state.predictor.dominant_pollutant(&features)?;
    let enrichment = state.dataset.enrich(&features, pollutant)?;

    info!(
        %request_id,
        pollutant,
        matched = enrichment.matched,
        "Prediction served"
    );
    debug!(%request_id, health_advice = %enrichment.health_advice, "Matched row advice");

    Ok(PredictionPayload {
        prediction: Prediction {
            dominant_pollutant: enrichment.dominant_pollutant(pollutant),
            health_advices: enrichment.health_general_population,
            city: enrichment.city,
        },
    })
}
