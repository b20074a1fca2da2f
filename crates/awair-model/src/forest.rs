//! Random-forest classifier deserialized from a JSON artifact.

use std::fs;
use std::path::Path;

use awair_core::FeatureVector;
use serde::{Deserialize, Serialize};

use crate::{Classifier, ModelError};

/// One node of a binary decision tree.
///
/// Trees are stored flat: children are referenced by index into
/// [`Tree::nodes`], and every child index is greater than its parent's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// `x[feature] <= threshold` descends left, otherwise right, with
    /// `x[feature]` rounded to `f32` first.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class weights (sample counts or fractions).
    Leaf { value: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn leaf(&self, x: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split { feature, threshold, left, right } => {
                    // Thresholds were fitted on float32 inputs.
                    let value = x[*feature] as f32 as f64;
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn validate(&self, tree_idx: usize, n_features: usize, n_classes: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::Invalid(format!("tree {tree_idx} has no nodes")));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split { feature, left, right, .. } => {
                    if *feature >= n_features {
                        return Err(ModelError::Invalid(format!(
                            "tree {tree_idx} node {idx} splits on feature {feature}, model has {n_features}"
                        )));
                    }
                    for child in [left, right] {
                        if *child <= idx || *child >= self.nodes.len() {
                            return Err(ModelError::Invalid(format!(
                                "tree {tree_idx} node {idx} has invalid child {child}"
                            )));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(ModelError::Invalid(format!(
                            "tree {tree_idx} leaf {idx} has {} weights, model has {n_classes} classes",
                            value.len()
                        )));
                    }
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0) || value.iter().sum::<f64>() <= 0.0 {
                        return Err(ModelError::Invalid(format!(
                            "tree {tree_idx} leaf {idx} has invalid weights"
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Ensemble of decision trees voting by averaged class probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<Tree>,
}

impl RandomForest {
    /// Reads and validates a forest artifact from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ModelError> {
        let forest: Self = serde_json::from_str(content)?;
        forest.validate()?;
        Ok(forest)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::Invalid("forest has no trees".into()));
        }
        if self.n_classes == 0 {
            return Err(ModelError::Invalid("forest has no classes".into()));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(idx, self.n_features, self.n_classes)?;
        }
        Ok(())
    }

    /// Mean of the per-tree normalised leaf distributions.
    pub fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        if x.len() != self.n_features {
            return Err(ModelError::FeatureCount {
                expected: self.n_features,
                found: x.len(),
            });
        }

        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let leaf = tree.leaf(x);
            let total: f64 = leaf.iter().sum();
            for (p, w) in proba.iter_mut().zip(leaf) {
                *p += w / total;
            }
        }

        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        Ok(proba)
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, features: &FeatureVector) -> Result<usize, ModelError> {
        let proba = self.predict_proba(features.values())?;

        // First maximum wins ties.
        let (class, _) = proba
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (idx, &p)| if p > best.1 { (idx, p) } else { best });
        Ok(class)
    }
}
