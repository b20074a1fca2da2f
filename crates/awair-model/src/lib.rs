//! Dominant-pollutant classification for awair.
//!
//! - [`Classifier`] — Trait for any model mapping a reading to a class index
//! - [`RandomForest`] — Decision-tree ensemble loaded from a JSON artifact
//! - [`LabelDecoder`] — Maps class indices back to pollutant names
//! - [`Predictor`] — A classifier paired with its decoder, checked at load

mod decoder;
mod forest;

pub use decoder::LabelDecoder;
pub use forest::{Node, RandomForest, Tree};

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use awair_core::{FeatureVector, PredictError, FEATURE_COUNT};
use thiserror::Error;
use tracing::info;

/// Errors from loading or running a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid model artifact: {0}")]
    Invalid(String),
    #[error("Model expects {expected} features, got {found}")]
    FeatureCount { expected: usize, found: usize },
    #[error("Label decoder has {labels} classes but model predicts {classes}")]
    VocabularyMismatch { classes: usize, labels: usize },
    #[error("Encoded class {0} is outside the label vocabulary")]
    UnknownClass(usize),
}

impl From<ModelError> for PredictError {
    fn from(e: ModelError) -> Self {
        PredictError::Unexpected(e.to_string())
    }
}

/// A pre-trained model producing one encoded class per reading.
pub trait Classifier: Send + Sync {
    /// Number of input features the model was trained on.
    fn n_features(&self) -> usize;
    /// Size of the model's output space.
    fn n_classes(&self) -> usize;
    /// Predicts the encoded class for a single row.
    fn predict(&self, features: &FeatureVector) -> Result<usize, ModelError>;
}

/// A classifier and the label decoder fitted alongside it.
#[derive(Clone)]
pub struct Predictor {
    classifier: Arc<dyn Classifier>,
    decoder: LabelDecoder,
}

impl fmt::Debug for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predictor")
            .field("n_features", &self.classifier.n_features())
            .field("n_classes", &self.classifier.n_classes())
            .field("labels", &self.decoder.classes())
            .finish()
    }
}

impl Predictor {
    /// Pairs a classifier with its decoder.
    ///
    /// Fails when the classifier does not take [`FEATURE_COUNT`] inputs or
    /// when the decoder vocabulary does not cover exactly its output space.
    pub fn new(classifier: Arc<dyn Classifier>, decoder: LabelDecoder) -> Result<Self, ModelError> {
        if classifier.n_features() != FEATURE_COUNT {
            return Err(ModelError::FeatureCount {
                expected: FEATURE_COUNT,
                found: classifier.n_features(),
            });
        }
        if classifier.n_classes() != decoder.len() {
            return Err(ModelError::VocabularyMismatch {
                classes: classifier.n_classes(),
                labels: decoder.len(),
            });
        }
        Ok(Self { classifier, decoder })
    }

    /// Loads a random-forest artifact and its label decoder from disk.
    pub fn load(model_path: impl AsRef<Path>, decoder_path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let forest = RandomForest::from_path(model_path.as_ref())?;
        let decoder = LabelDecoder::from_path(decoder_path.as_ref())?;
        info!(
            trees = forest.trees.len(),
            classes = forest.n_classes,
            "Loaded random forest from {}",
            model_path.as_ref().display()
        );
        Self::new(Arc::new(forest), decoder)
    }

    /// Predicts and decodes the dominant pollutant name.
    pub fn dominant_pollutant(&self, features: &FeatureVector) -> Result<&str, ModelError> {
        let class = self.classifier.predict(features)?;
        self.decoder.decode(class)
    }

    pub fn labels(&self) -> &[String] {
        self.decoder.classes()
    }
}
