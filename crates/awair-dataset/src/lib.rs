//! Reference air-quality dataset with exact-match lookup.
//!
//! The dataset is loaded once at startup from a CSV file or URL and never
//! mutated afterwards. A request's [`FeatureVector`] is matched against the
//! nine feature columns with exact floating-point equality; the first
//! matching row supplies health text, city and the concentration of the
//! predicted pollutant.

mod enrich;
mod source;

pub use enrich::{Concentration, Enrichment};
pub use source::DatasetSource;

use std::collections::HashMap;
use std::io::Read;

use awair_core::{FeatureVector, FEATURES, FEATURE_COUNT};
use csv::StringRecord;
use thiserror::Error;
use tracing::{info, warn};

pub const HEALTH_GENERAL_POPULATION: &str = "health_general_population";
pub const HEALTH_ADVICE: &str = "health_advice";
pub const CITY: &str = "City";

/// Errors from loading the reference dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to fetch dataset: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse dataset CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Dataset is missing required column: {0}")]
    MissingColumn(String),
}

/// In-memory historical rows, read-only after load.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: HashMap<String, usize>,
    rows: Vec<StringRecord>,
    features: Vec<[f64; FEATURE_COUNT]>,
    health_general_population: Option<usize>,
    health_advice: Option<usize>,
    city: Option<usize>,
}

/// A borrowed view of one dataset row.
#[derive(Debug, Clone, Copy)]
pub struct DatasetRow<'a> {
    dataset: &'a Dataset,
    index: usize,
}

impl<'a> DatasetRow<'a> {
    /// Position of the row in file order, header excluded.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell value of `column`, or `None` when the dataset has no such column.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let col = *self.dataset.columns.get(column)?;
        self.dataset.rows[self.index].get(col)
    }

    fn at(&self, col: usize) -> &'a str {
        self.dataset.rows[self.index].get(col).unwrap_or_default()
    }
}

impl Dataset {
    /// Loads from a local path or URL.
    pub async fn load(source: &DatasetSource) -> Result<Self, DatasetError> {
        let dataset = match source {
            DatasetSource::Path(path) => {
                let file = std::fs::File::open(path).map_err(|source| DatasetError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_reader(file)?
            }
            DatasetSource::Url(url) => {
                let body = reqwest::get(url).await?.error_for_status()?.bytes().await?;
                Self::from_reader(body.as_ref())?
            }
        };

        info!(
            rows = dataset.len(),
            health_advice = dataset.has_health_advice(),
            city = dataset.has_city(),
            "Loaded reference dataset from {}",
            source
        );
        if dataset.is_empty() {
            warn!("Reference dataset has no rows; every lookup will fall back");
        }
        Ok(dataset)
    }

    /// Parses CSV with a header line.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

        let mut columns = HashMap::new();
        for (idx, name) in csv.headers()?.iter().enumerate() {
            columns.entry(name.to_string()).or_insert(idx);
        }

        let mut feature_cols = [0usize; FEATURE_COUNT];
        for (slot, name) in feature_cols.iter_mut().zip(FEATURES) {
            *slot = *columns
                .get(name)
                .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))?;
        }

        let rows = csv.records().collect::<Result<Vec<_>, _>>()?;

        // Unparsable cells become NaN so the row can never match.
        let features = rows
            .iter()
            .map(|record| {
                feature_cols.map(|col| {
                    record
                        .get(col)
                        .and_then(|cell| cell.trim().parse::<f64>().ok())
                        .unwrap_or(f64::NAN)
                })
            })
            .collect();

        Ok(Self {
            health_general_population: columns.get(HEALTH_GENERAL_POPULATION).copied(),
            health_advice: columns.get(HEALTH_ADVICE).copied(),
            city: columns.get(CITY).copied(),
            columns,
            rows,
            features,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_health_advice(&self) -> bool {
        self.health_advice.is_some()
    }

    pub fn has_city(&self) -> bool {
        self.city.is_some()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// First row whose feature columns all equal `features` exactly.
    pub fn lookup(&self, features: &FeatureVector) -> Option<DatasetRow<'_>> {
        self.features
            .iter()
            .position(|row| row.iter().zip(features.values()).all(|(a, b)| a == b))
            .map(|index| DatasetRow { dataset: self, index })
    }

    /// Returns the labels that have no concentration column, logging each.
    ///
    /// Missing columns are not fatal: such predictions report
    /// "Unknown concentration".
    pub fn check_labels<'l>(&self, labels: &'l [String]) -> Vec<&'l str> {
        let missing: Vec<&str> = labels
            .iter()
            .map(String::as_str)
            .filter(|label| !self.has_column(label))
            .collect();
        for label in &missing {
            warn!("No concentration column for pollutant label '{}'", label);
        }
        missing
    }
}
