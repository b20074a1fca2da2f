use serde::Deserialize;
use serde_json::Value;

// === HTTP DTOs ===

/// Body of `POST /predict-rf`. `input` is kept raw so that length and
/// element types can be reported separately.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub input: Option<Value>,
}
