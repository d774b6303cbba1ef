//! JSON model documents
//!
//! Pure-Rust evaluation of classifiers exported as JSON: tree ensembles
//! (scikit-learn `tree_` layout: go left when `x[feature] <= threshold`)
//! and linear models.

use super::features::{FeatureRecord, FEATURE_COUNT};
use super::{Classifier, ModelError, ProbabilityEstimator};
use crate::models::RawLabel;
use serde::{Deserialize, Serialize};

/// A classifier document, tagged by model family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelDocument {
    RandomForest(RandomForest),
    LogisticRegression(LinearModel),
    LinearSvm(LinearModel),
}

impl ModelDocument {
    pub fn kind(&self) -> &'static str {
        match self {
            ModelDocument::RandomForest(_) => "random_forest",
            ModelDocument::LogisticRegression(_) => "logistic_regression",
            ModelDocument::LinearSvm(_) => "linear_svm",
        }
    }

    /// Structural checks that make evaluation total
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ModelDocument::RandomForest(forest) => forest.validate(),
            ModelDocument::LogisticRegression(model) | ModelDocument::LinearSvm(model) => {
                model.validate()
            }
        }
    }

    /// Validate the document and wrap it for evaluation
    pub fn into_classifier(self) -> Result<Box<dyn Classifier>, String> {
        self.validate()?;
        Ok(match self {
            ModelDocument::RandomForest(forest) => Box::new(forest),
            ModelDocument::LogisticRegression(model) => Box::new(LogisticRegression(model)),
            ModelDocument::LinearSvm(model) => Box::new(LinearSvm(model)),
        })
    }
}

/// Node of a decision tree, stored in a flat array
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Per-class weights (sample counts or fractions)
        value: Vec<f64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Node 0 is the root; children always sit at higher indices
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(format!("node {} splits on unknown feature {}", idx, feature));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", idx));
                    }
                    for child in [left, right] {
                        if *child <= idx || *child >= self.nodes.len() {
                            return Err(format!("node {} has invalid child index {}", idx, child));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(format!(
                            "leaf {} has {} class weights, expected {}",
                            idx,
                            value.len(),
                            n_classes
                        ));
                    }
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        return Err(format!("leaf {} has a negative or non-finite weight", idx));
                    }
                    if value.iter().sum::<f64>() <= 0.0 {
                        return Err(format!("leaf {} has zero total weight", idx));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf
    ///
    /// Bounded by the node count, so a tree that skipped validation yields
    /// an error instead of a panic or an endless walk.
    fn leaf(&self, x: &[f64; FEATURE_COUNT]) -> Result<&[f64], ModelError> {
        let mut idx = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = x.get(*feature).ok_or_else(|| {
                        ModelError::InvalidOutput(format!(
                            "node {} splits on unknown feature {}",
                            idx, feature
                        ))
                    })?;
                    idx = if *value <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { value }) => return Ok(value.as_slice()),
                None => {
                    return Err(ModelError::InvalidOutput(format!(
                        "child index {} out of range",
                        idx
                    )))
                }
            }
        }
        Err(ModelError::InvalidOutput("tree walk never reached a leaf".to_string()))
    }
}

/// Random forest: mean of per-tree normalized leaf distributions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub feature_names: Vec<String>,
    pub classes: Vec<RawLabel>,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    fn validate(&self) -> Result<(), String> {
        if self.classes.len() < 2 {
            return Err(format!("forest declares {} classes, need at least 2", self.classes.len()));
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.classes.len())
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }

    fn distribution(&self, record: &FeatureRecord) -> Result<Vec<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::EmptyOutput);
        }
        let mut acc = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf(record.values())?;
            let total: f64 = leaf.iter().sum();
            if leaf.len() != acc.len() || total <= 0.0 {
                return Err(ModelError::InvalidOutput(format!(
                    "leaf weights {:?} do not fit {} classes",
                    leaf,
                    acc.len()
                )));
            }
            for (slot, w) in acc.iter_mut().zip(leaf) {
                *slot += w / total;
            }
        }
        let n = self.trees.len() as f64;
        acc.iter_mut().for_each(|p| *p /= n);
        Ok(acc)
    }
}

impl Classifier for RandomForest {
    fn predict(&self, record: &FeatureRecord) -> Result<RawLabel, ModelError> {
        let dist = self.distribution(record)?;
        let mut best = 0;
        for (idx, p) in dist.iter().enumerate() {
            if *p > dist[best] {
                best = idx;
            }
        }
        self.classes.get(best).cloned().ok_or(ModelError::EmptyOutput)
    }

    fn probabilities(&self) -> Option<&dyn ProbabilityEstimator> {
        Some(self)
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.feature_names)
    }

    fn kind(&self) -> &str {
        "random_forest"
    }
}

impl ProbabilityEstimator for RandomForest {
    fn classes(&self) -> &[RawLabel] {
        &self.classes
    }

    fn predict_proba(&self, record: &FeatureRecord) -> Result<Vec<f64>, ModelError> {
        self.distribution(record)
    }
}

/// Binary linear model: `w . x + b`, positive side is `classes[1]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub feature_names: Vec<String>,
    pub classes: Vec<RawLabel>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    fn validate(&self) -> Result<(), String> {
        if self.classes.len() != 2 {
            return Err(format!("linear model declares {} classes, need 2", self.classes.len()));
        }
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(format!(
                "linear model has {} coefficients, expected {}",
                self.coefficients.len(),
                FEATURE_COUNT
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("linear model has non-finite parameters".to_string());
        }
        Ok(())
    }

    fn decision(&self, record: &FeatureRecord) -> f64 {
        self.coefficients
            .iter()
            .zip(record.values())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }

    fn label_for(&self, decision: f64) -> RawLabel {
        if decision > 0.0 {
            self.classes[1].clone()
        } else {
            self.classes[0].clone()
        }
    }
}

struct LogisticRegression(LinearModel);

impl Classifier for LogisticRegression {
    fn predict(&self, record: &FeatureRecord) -> Result<RawLabel, ModelError> {
        Ok(self.0.label_for(self.0.decision(record)))
    }

    fn probabilities(&self) -> Option<&dyn ProbabilityEstimator> {
        Some(self)
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.0.feature_names)
    }

    fn kind(&self) -> &str {
        "logistic_regression"
    }
}

impl ProbabilityEstimator for LogisticRegression {
    fn classes(&self) -> &[RawLabel] {
        &self.0.classes
    }

    fn predict_proba(&self, record: &FeatureRecord) -> Result<Vec<f64>, ModelError> {
        let p = 1.0 / (1.0 + (-self.0.decision(record)).exp());
        Ok(vec![1.0 - p, p])
    }
}

/// Margin classifier without probability estimates
struct LinearSvm(LinearModel);

impl Classifier for LinearSvm {
    fn predict(&self, record: &FeatureRecord) -> Result<RawLabel, ModelError> {
        Ok(self.0.label_for(self.0.decision(record)))
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.0.feature_names)
    }

    fn kind(&self) -> &str {
        "linear_svm"
    }
}
