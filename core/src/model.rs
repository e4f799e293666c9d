//! Trained elasticity model and its input-row assembly.
//!
//! The model predicts sales in log1p space from one row of named
//! features. The bundle carries the ordered column list the model was
//! trained on; any column the caller does not set stays at 0.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{PanelError, PanelResult};

/// Anything that maps one aligned feature row to a scalar prediction.
pub trait Regressor: Send + Sync {
    fn predict(&self, row: &[f64]) -> PanelResult<f64>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingModel {
    /// `intercept + Σ coefficients[i] * row[i]`
    Linear {
        intercept:    f64,
        coefficients: Vec<f64>,
    },
    /// Gradient-boosted regression trees: `base_score + Σ tree(row)`.
    TreeEnsemble {
        base_score: f64,
        trees:      Vec<RegressionTree>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    /// Node 0 is the root.
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go left when `row[feature] < threshold`, right otherwise.
    Split {
        feature:   usize,
        threshold: f64,
        left:      usize,
        right:     usize,
    },
    Leaf {
        value: f64,
    },
}

impl RegressionTree {
    fn evaluate(&self, row: &[f64]) -> PanelResult<f64> {
        let mut idx = 0usize;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split { feature, threshold, left, right }) => {
                    let x = row.get(*feature).copied().ok_or_else(|| {
                        PanelError::Inference(format!("tree split on missing feature {feature}"))
                    })?;
                    idx = if x < *threshold { *left } else { *right };
                }
                None => {
                    return Err(PanelError::Inference(format!("tree node {idx} does not exist")))
                }
            }
        }
        Err(PanelError::Inference("tree contains a cycle".into()))
    }

    fn check(&self, width: usize) -> PanelResult<()> {
        if self.nodes.is_empty() {
            return Err(PanelError::Inference("empty regression tree".into()));
        }
        for node in &self.nodes {
            if let TreeNode::Split { feature, left, right, .. } = node {
                if *feature >= width || *left >= self.nodes.len() || *right >= self.nodes.len() {
                    return Err(PanelError::Inference(format!(
                        "tree split out of range (feature={feature}, left={left}, right={right})"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Regressor for PricingModel {
    fn predict(&self, row: &[f64]) -> PanelResult<f64> {
        let value = match self {
            PricingModel::Linear { intercept, coefficients } => {
                if coefficients.len() != row.len() {
                    return Err(PanelError::Inference(format!(
                        "row has {} features, model expects {}",
                        row.len(),
                        coefficients.len()
                    )));
                }
                intercept + coefficients.iter().zip(row).map(|(c, x)| c * x).sum::<f64>()
            }
            PricingModel::TreeEnsemble { base_score, trees } => {
                let mut total = *base_score;
                for tree in trees {
                    total += tree.evaluate(row)?;
                }
                total
            }
        };
        if !value.is_finite() {
            return Err(PanelError::Inference(format!("model returned {value}")));
        }
        Ok(value)
    }
}

/// A versioned model plus the ordered list of its input columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub version: String,
    pub columns: Vec<String>,
    pub model:   PricingModel,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ModelBundle {
    pub fn new(version: impl Into<String>, columns: Vec<String>, model: PricingModel) -> PanelResult<Self> {
        let mut bundle = Self {
            version: version.into(),
            columns,
            model,
            index: HashMap::new(),
        };
        bundle.validate()?;
        bundle.build_index();
        Ok(bundle)
    }

    /// Decode a JSON artifact. Undecodable or inconsistent bundles are
    /// inference-layer failures.
    pub fn from_slice(bytes: &[u8]) -> PanelResult<Self> {
        let mut bundle: ModelBundle = serde_json::from_slice(bytes)
            .map_err(|e| PanelError::Inference(format!("cannot decode model bundle: {e}")))?;
        bundle.validate()?;
        bundle.build_index();
        Ok(bundle)
    }

    pub fn validate(&self) -> PanelResult<()> {
        if self.columns.is_empty() {
            return Err(PanelError::Inference("model bundle has no columns".into()));
        }
        let mut seen = HashMap::with_capacity(self.columns.len());
        for (i, c) in self.columns.iter().enumerate() {
            if seen.insert(c.as_str(), i).is_some() {
                return Err(PanelError::Inference(format!("duplicate model column '{c}'")));
            }
        }
        match &self.model {
            PricingModel::Linear { coefficients, .. } if coefficients.len() != self.columns.len() => {
                Err(PanelError::Inference(format!(
                    "{} coefficients for {} columns",
                    coefficients.len(),
                    self.columns.len()
                )))
            }
            PricingModel::Linear { .. } => Ok(()),
            PricingModel::TreeEnsemble { trees, .. } => {
                trees.iter().try_for_each(|t| t.check(self.columns.len()))
            }
        }
    }

    fn build_index(&mut self) {
        self.index = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// A zero-filled row aligned with this bundle's columns.
    pub fn input_row(&self) -> ModelInput<'_> {
        ModelInput {
            bundle: self,
            values: vec![0.0; self.columns.len()],
        }
    }

    /// Raw model output (log1p space).
    pub fn predict_log(&self, input: &ModelInput<'_>) -> PanelResult<f64> {
        self.model.predict(&input.values)
    }
}

/// One model input row under construction.
#[derive(Debug, Clone)]
pub struct ModelInput<'a> {
    bundle: &'a ModelBundle,
    values: Vec<f64>,
}

impl ModelInput<'_> {
    /// Set a named feature. Names the model was not trained on are
    /// dropped; returns whether the column exists.
    pub fn set(&mut self, column: &str, value: f64) -> bool {
        match self.bundle.index.get(column) {
            Some(&i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Reverse the log1p training transform: `max(0, round(exp(y) - 1))`.
pub fn expm1_sales(pred_log: f64) -> f64 {
    pred_log.exp_m1().round().max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unknown_columns_are_dropped() {
        let bundle = ModelBundle::new(
            "t",
            cols(&["A", "B"]),
            PricingModel::Linear { intercept: 0.0, coefficients: vec![1.0, 2.0] },
        )
        .unwrap();
        let mut row = bundle.input_row();
        assert!(row.set("B", 3.0));
        assert!(!row.set("ITEM_unknown", 1.0));
        assert_eq!(row.values(), &[0.0, 3.0]);
        assert_eq!(bundle.predict_log(&row).unwrap(), 6.0);
    }

    #[test]
    fn tree_ensemble_walks_splits() {
        let tree = RegressionTree {
            nodes: vec![
                TreeNode::Split { feature: 0, threshold: 10.0, left: 1, right: 2 },
                TreeNode::Leaf { value: 5.0 },
                TreeNode::Leaf { value: 3.0 },
            ],
        };
        let bundle = ModelBundle::new(
            "t",
            cols(&["PRECO_SIMULADO"]),
            PricingModel::TreeEnsemble { base_score: 0.5, trees: vec![tree.clone(), tree] },
        )
        .unwrap();
        let mut row = bundle.input_row();
        row.set("PRECO_SIMULADO", 9.0);
        assert_eq!(bundle.predict_log(&row).unwrap(), 10.5);
        row.set("PRECO_SIMULADO", 10.0);
        assert_eq!(bundle.predict_log(&row).unwrap(), 6.5);
    }

    #[test]
    fn cyclic_tree_is_an_inference_error() {
        let tree = RegressionTree {
            nodes: vec![TreeNode::Split { feature: 0, threshold: 1.0, left: 0, right: 0 }],
        };
        let model = PricingModel::TreeEnsemble { base_score: 0.0, trees: vec![tree] };
        assert!(matches!(model.predict(&[0.0]), Err(PanelError::Inference(_))));
    }

    #[test]
    fn misaligned_bundle_is_rejected() {
        let err = ModelBundle::new(
            "t",
            cols(&["A", "B"]),
            PricingModel::Linear { intercept: 0.0, coefficients: vec![1.0] },
        )
        .unwrap_err();
        assert!(matches!(err, PanelError::Inference(_)));
    }

    #[test]
    fn expm1_rounds_and_clamps() {
        assert_eq!(expm1_sales(0.0), 0.0);
        assert_eq!(expm1_sales(-3.0), 0.0);
        assert_eq!(expm1_sales(100f64.ln_1p()), 100.0);
    }
}
