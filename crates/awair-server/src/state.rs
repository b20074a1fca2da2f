use awair_config::ServerConfig;
use awair_dataset::{Dataset, DatasetSource};
use awair_model::Predictor;
use tracing::{info, warn};

/// Read-only context shared by every request.
pub struct AppState {
    pub predictor: Predictor,
    pub dataset: Dataset,
}

impl AppState {
    pub fn new(predictor: Predictor, dataset: Dataset) -> Self {
        Self { predictor, dataset }
    }

    /// Loads the model artifacts and the reference dataset.
    ///
    /// Any failure here aborts startup.
    pub async fn load(config: &ServerConfig) -> anyhow::Result<Self> {
        let predictor = Predictor::load(&config.model_path, &config.label_encoder_path)?;
        info!("Pollutant labels: {}", predictor.labels().join(", "));

        let source = DatasetSource::from(config.dataset.as_str());
        let dataset = Dataset::load(&source).await?;

        let missing = dataset.check_labels(predictor.labels());
        if !missing.is_empty() {
            warn!(
                "{} of {} labels will report unknown concentration",
                missing.len(),
                predictor.labels().len()
            );
        }

        Ok(Self::new(predictor, dataset))
    }
}
