//! The predictor: a serialized regression model with a small capability
//! surface.
//!
//! Every variant exposes `predict`; per-instance explanation and global
//! feature importances are optional capabilities. Callers fall back from
//! `explain` to `feature_importances` to zeros, so a model may carry
//! either, both, or neither.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A trained regression model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Model {
    /// Ensemble of regression trees, averaged.
    Forest(Forest),
    /// Linear model: dot product plus intercept.
    Linear(Linear),
}

impl Model {
    /// Predict a first-day change percentage from an encoded feature vector.
    pub fn predict(&self, features: &[f64]) -> EngineResult<f64> {
        match self {
            Model::Forest(forest) => forest.predict(features),
            Model::Linear(linear) => linear.predict(features),
        }
    }

    /// Per-instance attribution scores, one per feature, if the model
    /// supports them.
    pub fn explain(&self, features: &[f64]) -> Option<Vec<f64>> {
        match self {
            Model::Forest(forest) => forest.explain(features),
            Model::Linear(_) => None,
        }
    }

    /// Model-level feature importances, if available. These are the same for
    /// every input.
    pub fn feature_importances(&self) -> Option<Vec<f64>> {
        match self {
            Model::Forest(forest) => forest.feature_importances.clone(),
            Model::Linear(linear) => linear.feature_importances(),
        }
    }
}

/// A single node in a flattened regression tree.
///
/// Split nodes carry the mean target value of the samples that reached
/// them, which is what decision-path attribution is computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        value: f64,
        left: usize,
        right: usize,
    },
}

impl Node {
    /// Mean target value at this node.
    pub fn value(&self) -> f64 {
        match self {
            Node::Leaf { value } => *value,
            Node::Split { value, .. } => *value,
        }
    }
}

/// A regression tree stored as a flat node array; index 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk the tree to a leaf value.
    fn predict(&self, features: &[f64]) -> EngineResult<f64> {
        let mut index = 0;
        loop {
            match self.node(index)? {
                Node::Leaf { value } => return Ok(*value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let x = *features.get(*feature).ok_or_else(|| {
                        EngineError::prediction(format!(
                            "feature index {feature} out of range for vector of length {}",
                            features.len()
                        ))
                    })?;
                    index = if x <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Accumulate decision-path contributions into `contributions`.
    ///
    /// Each step down the tree moves the running estimate from the parent
    /// node's mean to the child's mean; that delta is credited to the split
    /// feature.
    fn accumulate_contributions(
        &self,
        features: &[f64],
        contributions: &mut [f64],
    ) -> EngineResult<()> {
        let mut index = 0;
        loop {
            match self.node(index)? {
                Node::Leaf { .. } => return Ok(()),
                Node::Split {
                    feature,
                    threshold,
                    value,
                    left,
                    right,
                } => {
                    let x = *features.get(*feature).ok_or_else(|| {
                        EngineError::prediction(format!("feature index {feature} out of range"))
                    })?;
                    let child = if x <= *threshold { *left } else { *right };
                    contributions[*feature] += self.node(child)?.value() - *value;
                    index = child;
                }
            }
        }
    }

    fn node(&self, index: usize) -> EngineResult<&Node> {
        self.nodes
            .get(index)
            .ok_or_else(|| EngineError::prediction(format!("node index {index} out of range")))
    }
}

/// Ensemble of regression trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forest {
    pub trees: Vec<Tree>,

    /// Impurity-decrease importances computed at fit time, normalized to
    /// sum to 1. Optional; older artifacts may not carry them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_importances: Option<Vec<f64>>,
}

impl Forest {
    fn predict(&self, features: &[f64]) -> EngineResult<f64> {
        if self.trees.is_empty() {
            return Err(EngineError::prediction("empty ensemble"));
        }
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict(features)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    /// Per-instance decision-path (Saabas) attributions, averaged over the
    /// ensemble. None when the ensemble is empty or the vector does not fit.
    fn explain(&self, features: &[f64]) -> Option<Vec<f64>> {
        if self.trees.is_empty() {
            return None;
        }
        let mut contributions = vec![0.0; features.len()];
        for tree in &self.trees {
            if tree
                .accumulate_contributions(features, &mut contributions)
                .is_err()
            {
                return None;
            }
        }
        let n = self.trees.len() as f64;
        for c in &mut contributions {
            *c /= n;
        }
        Some(contributions)
    }

    /// Mean of the root node values; the baseline the attributions move
    /// the estimate away from.
    pub fn bias(&self) -> Option<f64> {
        if self.trees.is_empty() {
            return None;
        }
        let sum: f64 = self
            .trees
            .iter()
            .filter_map(|t| t.nodes.first().map(Node::value))
            .sum();
        Some(sum / self.trees.len() as f64)
    }
}

/// Linear regression model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Linear {
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl Linear {
    fn predict(&self, features: &[f64]) -> EngineResult<f64> {
        if features.len() != self.weights.len() {
            return Err(EngineError::prediction(format!(
                "expected {} features, got {}",
                self.weights.len(),
                features.len()
            )));
        }
        let dot: f64 = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum();
        Ok(dot + self.intercept)
    }

    /// Normalized absolute weights, or None for a degenerate model.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        let total: f64 = self.weights.iter().map(|w| w.abs()).sum();
        if total == 0.0 {
            return None;
        }
        Some(self.weights.iter().map(|w| w.abs() / total).collect())
    }
}
