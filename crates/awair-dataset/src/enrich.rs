//! Enrichment of a prediction with fields from the matched dataset row.

use std::fmt;

use awair_core::{FeatureVector, PredictError};

use crate::{Dataset, DatasetRow, HEALTH_GENERAL_POPULATION};

pub const NO_MATCH_HEALTH: &str = "Unknown (no match found in dataset)";
pub const NO_MATCH_ADVICE: &str = "No specific health advice available for the provided data.";
pub const NO_ADVICE_COLUMN: &str = "No health advice available.";
pub const UNKNOWN_CITY: &str = "Unknown city";
pub const UNKNOWN_CONCENTRATION: &str = "Unknown concentration";

/// Cell spellings read as a missing number, as pandas' `read_csv` does.
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Concentration of the predicted pollutant in the matched row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Concentration {
    Value(f64),
    Unknown,
}

impl fmt::Display for Concentration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concentration::Value(v) if v.is_nan() => f.write_str("nan"),
            Concentration::Value(v) => write!(f, "{v:.2}"),
            Concentration::Unknown => f.write_str(UNKNOWN_CONCENTRATION),
        }
    }
}

/// Contextual fields attached to one prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub matched: bool,
    pub health_general_population: String,
    pub health_advice: String,
    pub concentration: Concentration,
    pub city: String,
}

impl Enrichment {
    /// Fixed fallbacks used when no row matches.
    pub fn no_match() -> Self {
        Self {
            matched: false,
            health_general_population: NO_MATCH_HEALTH.into(),
            health_advice: NO_MATCH_ADVICE.into(),
            concentration: Concentration::Unknown,
            city: UNKNOWN_CITY.into(),
        }
    }

    /// `"<pollutant>: <concentration>"` as shown to clients.
    pub fn dominant_pollutant(&self, pollutant: &str) -> String {
        format!("{pollutant}: {}", self.concentration)
    }
}

impl Dataset {
    /// Looks up `features` and collects the fields for `pollutant`.
    ///
    /// A missing match is not an error. A dataset without a
    /// `health_general_population` column fails with `MissingKey` once a
    /// row matches. Blank or NA concentration cells read as NaN; any other
    /// text that is not a number fails with `InvalidValue`.
    pub fn enrich(&self, features: &FeatureVector, pollutant: &str) -> Result<Enrichment, PredictError> {
        match self.lookup(features) {
            Some(row) => self.enrich_row(row, pollutant),
            None => Ok(Enrichment::no_match()),
        }
    }

    fn enrich_row(&self, row: DatasetRow<'_>, pollutant: &str) -> Result<Enrichment, PredictError> {
        let health_general_population = self
            .health_general_population
            .map(|col| row.at(col).to_string())
            .ok_or_else(|| PredictError::MissingKey(HEALTH_GENERAL_POPULATION.into()))?;

        let health_advice = self
            .health_advice
            .map_or_else(|| NO_ADVICE_COLUMN.to_string(), |col| row.at(col).to_string());

        let city = self
            .city
            .map_or_else(|| UNKNOWN_CITY.to_string(), |col| row.at(col).to_string());

        // No column for the label is a soft-fail, not an error.
        let concentration = match row.get(pollutant) {
            Some(cell) => Concentration::Value(parse_concentration(pollutant, cell)?),
            None => Concentration::Unknown,
        };

        Ok(Enrichment {
            matched: true,
            health_general_population,
            health_advice,
            concentration,
            city,
        })
    }
}

/// Blank or NA cells are a gap in the data, not a bad request.
fn parse_concentration(pollutant: &str, cell: &str) -> Result<f64, PredictError> {
    let cell = cell.trim();
    if NA_VALUES.contains(&cell) {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>().map_err(|_| {
        PredictError::InvalidValue(format!(
            "could not convert {pollutant} concentration to float: '{cell}'"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    fn dataset(csv: &str) -> Dataset {
        Dataset::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_enrich_match() {
        let enrichment = dataset(&jakarta_csv()).enrich(&jakarta(), "pm25").unwrap();
        assert!(enrichment.matched);
        assert_eq!(enrichment.health_general_population, "Sensitive groups should reduce exertion");
        assert_eq!(enrichment.health_advice, "Stay indoors");
        assert_eq!(enrichment.city, "Jakarta");
        assert_eq!(enrichment.dominant_pollutant("pm25"), "pm25: 15.00");
    }

    #[test]
    fn test_concentration_rounds_to_two_decimals() {
        let surabaya = reading([80.0, 0.7, 0.04, 0.05, 40.0, 30.456, 0.02, -7.25, 112.75]);
        let enrichment = dataset(&jakarta_csv()).enrich(&surabaya, "pm25").unwrap();
        assert_eq!(enrichment.dominant_pollutant("pm25"), "pm25: 30.46");
        assert_eq!(enrichment.city, "Surabaya");
    }

    #[test]
    fn test_unknown_pollutant_column() {
        let enrichment = dataset(&jakarta_csv()).enrich(&jakarta(), "nh3").unwrap();
        assert!(enrichment.matched);
        assert_eq!(enrichment.concentration, Concentration::Unknown);
        assert_eq!(enrichment.dominant_pollutant("nh3"), "nh3: Unknown concentration");
    }

    #[test]
    fn test_no_match_fallbacks() {
        let other = reading([1.0; 9]);
        let enrichment = dataset(&jakarta_csv()).enrich(&other, "pm25").unwrap();
        assert_eq!(enrichment, Enrichment::no_match());
        assert_eq!(enrichment.health_general_population, NO_MATCH_HEALTH);
        assert_eq!(enrichment.city, UNKNOWN_CITY);
        assert_eq!(enrichment.dominant_pollutant("pm25"), "pm25: Unknown concentration");
    }

    #[test]
    fn test_optional_columns_fall_back() {
        let csv = "universal_aqi,co,no2,o3,pm10,pm25,so2,latitude,longitude,health_general_population\n\
                   50,0.5,0.02,0.03,20,15,0.01,-6.2,106.8,Moderate\n";
        let enrichment = dataset(csv).enrich(&jakarta(), "pm25").unwrap();
        assert_eq!(enrichment.health_general_population, "Moderate");
        assert_eq!(enrichment.health_advice, NO_ADVICE_COLUMN);
        assert_eq!(enrichment.city, UNKNOWN_CITY);
    }

    #[test]
    fn test_missing_health_column_is_missing_key() {
        let csv = "universal_aqi,co,no2,o3,pm10,pm25,so2,latitude,longitude,City\n\
                   50,0.5,0.02,0.03,20,15,0.01,-6.2,106.8,Jakarta\n";
        let err = dataset(csv).enrich(&jakarta(), "pm25").unwrap_err();
        assert_eq!(err, PredictError::MissingKey("health_general_population".into()));
    }

    #[test]
    fn test_missing_health_column_without_match_is_fallback() {
        let csv = "universal_aqi,co,no2,o3,pm10,pm25,so2,latitude,longitude\n1,1,1,1,1,1,1,1,1\n";
        let enrichment = dataset(csv).enrich(&jakarta(), "pm25").unwrap();
        assert!(!enrichment.matched);
    }

    #[test]
    fn test_empty_concentration_renders_nan() {
        let csv = "universal_aqi,co,no2,o3,pm10,pm25,so2,latitude,longitude,health_general_population,nh3\n\
                   50,0.5,0.02,0.03,20,15,0.01,-6.2,106.8,Good,\n";
        let enrichment = dataset(csv).enrich(&jakarta(), "nh3").unwrap();
        assert!(enrichment.matched);
        assert_eq!(enrichment.dominant_pollutant("nh3"), "nh3: nan");
    }

    #[test]
    fn test_na_concentration_renders_nan() {
        let csv = "universal_aqi,co,no2,o3,pm10,pm25,so2,latitude,longitude,health_general_population,nh3\n\
                   50,0.5,0.02,0.03,20,15,0.01,-6.2,106.8,Good,N/A\n";
        let enrichment = dataset(csv).enrich(&jakarta(), "nh3").unwrap();
        assert_eq!(enrichment.dominant_pollutant("nh3"), "nh3: nan");
    }

    #[test]
    fn test_non_numeric_concentration_is_invalid_value() {
        let csv = "universal_aqi,co,no2,o3,pm10,pm25,so2,latitude,longitude,health_general_population,o3_level\n\
                   50,0.5,0.02,0.03,20,15,0.01,-6.2,106.8,Good,high\n";
        let err = dataset(csv).enrich(&jakarta(), "o3_level").unwrap_err();
        assert!(matches!(err, PredictError::InvalidValue(ref m) if m.contains("'high'")));
    }
}
