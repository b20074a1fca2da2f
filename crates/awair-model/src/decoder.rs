//! Label decoder mapping encoded classes back to pollutant names.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Fitted label vocabulary, indexed by encoded class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDecoder {
    classes: Vec<String>,
}

impl LabelDecoder {
    pub fn new(classes: Vec<String>) -> Result<Self, ModelError> {
        if classes.is_empty() {
            return Err(ModelError::Invalid("label decoder has no classes".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = classes.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(ModelError::Invalid(format!("duplicate label: {dup}")));
        }
        Ok(Self { classes })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ModelError> {
        let raw: Self = serde_json::from_str(content)?;
        Self::new(raw.classes)
    }

    pub fn decode(&self, class: usize) -> Result<&str, ModelError> {
        self.classes
            .get(class)
            .map(String::as_str)
            .ok_or(ModelError::UnknownClass(class))
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
