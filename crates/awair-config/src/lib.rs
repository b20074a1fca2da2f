use std::env;

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Invalid PORT value: {0}")]
    InvalidPort(String),

    #[error("Empty value for {0}")]
    Empty(&'static str),
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_MODEL_PATH: &str = "FixModel-rf.json";
pub const DEFAULT_LABEL_ENCODER_PATH: &str = "label_encoder.json";
pub const DEFAULT_DATASET: &str =
    "https://storage.googleapis.com/bungkit-awairs/air_quality_data_fix.csv";

// ─────────────────────────────────────────────────────────────────────────────
// Server Config
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_path: String,
    pub label_encoder_path: String,
    /// Local path or `http(s)://` URL of the reference CSV.
    pub dataset: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            model_path: DEFAULT_MODEL_PATH.into(),
            label_encoder_path: DEFAULT_LABEL_ENCODER_PATH.into(),
            dataset: DEFAULT_DATASET.into(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => defaults.port,
        };

        Ok(Self {
            host: non_empty(&lookup, "HOST")?.unwrap_or(defaults.host),
            port,
            model_path: non_empty(&lookup, "MODEL_PATH")?.unwrap_or(defaults.model_path),
            label_encoder_path: non_empty(&lookup, "LABEL_ENCODER_PATH")?
                .unwrap_or(defaults.label_encoder_path),
            dataset: non_empty(&lookup, "DATASET_PATH")?.unwrap_or(defaults.dataset),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty<F>(lookup: &F, key: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) if v.trim().is_empty() => Err(ConfigError::Empty(key)),
        other => Ok(other),
    }
}
