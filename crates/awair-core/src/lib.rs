//! Core domain types and error definitions for awair.
//!
//! This crate provides the types shared by the classifier, the reference
//! dataset and the HTTP server:
//!
//! - [`FEATURES`] — Fixed feature order the classifier was trained on
//! - [`FeatureVector`] — A validated, immutable 9-value reading
//! - [`PredictError`] — Error taxonomy for one prediction request
//! - [`PredictionPayload`] — The JSON response body of `/predict-rf`
//!
//! # Example
//!
//! ```rust
//! use awair_core::{FeatureVector, FEATURES};
//!
//! let features = FeatureVector::new(vec![50.0, 0.5, 0.02, 0.03, 20.0, 15.0, 0.01, -6.2, 106.8]).unwrap();
//! assert_eq!(features.values().len(), FEATURES.len());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Feature columns in the order the classifier consumes them.
pub const FEATURES: [&str; 9] = [
    "universal_aqi",
    "co",
    "no2",
    "o3",
    "pm10",
    "pm25",
    "so2",
    "latitude",
    "longitude",
];

/// Number of values every request must carry.
pub const FEATURE_COUNT: usize = FEATURES.len();

/// Errors that can occur while serving one prediction request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    /// Body is not a JSON object or carries no `input` field.
    #[error("Invalid input format, missing \"input\" field")]
    MalformedRequest,

    /// `input` does not hold exactly [`FEATURE_COUNT`] values.
    #[error("Input length must be {expected} values")]
    InputLengthMismatch { expected: usize },

    /// A field required during processing is absent.
    #[error("Missing key: '{0}'")]
    MissingKey(String),

    /// A value could not be coerced or compared.
    #[error("{0}")]
    InvalidValue(String),

    /// Anything else: model failure, I/O, internal inconsistency.
    #[error("{0}")]
    Unexpected(String),
}

impl PredictError {
    /// True for errors caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PredictError::Unexpected(_))
    }
}

/// A validated air-quality reading in [`FEATURES`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Builds a vector, rejecting any length other than [`FEATURE_COUNT`].
    pub fn new(values: Vec<f64>) -> Result<Self, PredictError> {
        let values: [f64; FEATURE_COUNT] = values
            .try_into()
            .map_err(|_| PredictError::InputLengthMismatch { expected: FEATURE_COUNT })?;
        Ok(Self(values))
    }

    /// Builds a vector from the raw JSON `input` array.
    ///
    /// Length is checked before element types so that a short array of
    /// strings still reports the length mismatch.
    pub fn from_json(items: &[Value]) -> Result<Self, PredictError> {
        if items.len() != FEATURE_COUNT {
            return Err(PredictError::InputLengthMismatch { expected: FEATURE_COUNT });
        }

        let values = items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                item.as_f64().ok_or_else(|| {
                    PredictError::InvalidValue(format!("input[{idx}] is not a number: {item}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Pairs each value with its feature column name.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURES.iter().copied().zip(self.0.iter().copied())
    }
}

/// Enriched prediction returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// `"<pollutant>: <concentration>"`.
    #[serde(rename = "Dom. Pollutant")]
    pub dominant_pollutant: String,
    /// The matched row's general-population health text.
    #[serde(rename = "Health Advices")]
    pub health_advices: String,
    #[serde(rename = "City")]
    pub city: String,
}

/// Response body of `POST /predict-rf`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPayload {
    pub prediction: Prediction,
}
