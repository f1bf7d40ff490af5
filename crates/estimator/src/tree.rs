//! Decision tree ensembles (random forests and gradient boosted trees).
//!
//! Each tree is a flat node array with node 0 as the root. A split sends a
//! row to `left` when `x[feature] <= threshold` or when `x[feature]` is NaN,
//! otherwise to `right`. Child indices always point forward in the array,
//! so evaluation is guaranteed to reach a leaf.

use pm_common::FeatureRow;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// How per-tree outputs are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Average of tree outputs (random forest)
    Mean,
    /// Sum of tree outputs (gradient boosting)
    Sum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn validate(&self, index: usize) -> ModelResult<()> {
        if self.nodes.is_empty() {
            return Err(ModelError::Invalid(format!("tree {} has no nodes", index)));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    for child in [left, right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(ModelError::Invalid(format!(
                                "tree {} node {} has child {} outside {}..{}",
                                index,
                                i,
                                child,
                                i + 1,
                                self.nodes.len()
                            )));
                        }
                    }
                    if threshold.is_nan() {
                        return Err(ModelError::Invalid(format!(
                            "tree {} node {} has a NaN threshold",
                            index, i
                        )));
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(ModelError::Invalid(format!(
                            "tree {} leaf {} is not finite",
                            index, i
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                Node::Split { feature, .. } => Some(*feature),
                Node::Leaf { .. } => None,
            })
            .max()
    }

    /// Walk from the root to a leaf. Assumes a validated tree.
    pub fn evaluate(&self, row: &FeatureRow) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = row[feature];
                    i = if x.is_nan() || x <= threshold { left } else { right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub aggregation: Aggregation,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn validate(&self) -> ModelResult<()> {
        if self.trees.is_empty() {
            return Err(ModelError::Invalid("tree ensemble has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i)?;
        }
        Ok(())
    }

    /// Smallest input width every split can index into.
    pub fn min_features(&self) -> usize {
        self.trees
            .iter()
            .filter_map(Tree::max_feature)
            .max()
            .map_or(0, |f| f + 1)
    }

    pub fn check_width(&self, width: usize) -> ModelResult<()> {
        let needed = self.min_features();
        if needed > width {
            return Err(ModelError::FeatureWidth {
                expected: needed,
                actual: width,
            });
        }
        Ok(())
    }

    pub fn predict_row(&self, row: &FeatureRow) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.evaluate(row)).sum();
        let combined = match self.aggregation {
            Aggregation::Mean => total / self.trees.len() as f64,
            Aggregation::Sum => total,
        };
        self.base_score + combined
    }

    pub fn predict(&self, rows: &[FeatureRow]) -> ModelResult<Vec<f64>> {
        self.check_width(pm_common::FEATURE_COUNT)?;
        Ok(rows.par_iter().map(|r| self.predict_row(r)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, low: f64, high: f64) -> Tree {
        Tree {
            nodes: vec![
                Node::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: low },
                Node::Leaf { value: high },
            ],
        }
    }

    fn row(aod: f64) -> FeatureRow {
        [aod, 500.0, 101325.0, 300.0, 0.01, 1.0, -1.0]
    }

    #[test]
    fn test_split_threshold_goes_left() {
        let tree = stump(0, 0.4, 35.0, 80.0);
        assert_eq!(tree.evaluate(&row(0.4)), 35.0);
        assert_eq!(tree.evaluate(&row(0.41)), 80.0);
    }

    #[test]
    fn test_nan_goes_left() {
        let tree = stump(0, 0.4, 35.0, 80.0);
        assert_eq!(tree.evaluate(&row(f64::NAN)), 35.0);
    }

    #[test]
    fn test_mean_aggregation() {
        let forest = TreeEnsemble {
            aggregation: Aggregation::Mean,
            base_score: 0.0,
            trees: vec![stump(0, 0.4, 30.0, 80.0), stump(1, 1000.0, 50.0, 0.0)],
        };
        assert_eq!(forest.predict_row(&row(0.1)), 40.0);
    }

    #[test]
    fn test_sum_aggregation_with_base_score() {
        let boosted = TreeEnsemble {
            aggregation: Aggregation::Sum,
            base_score: 10.0,
            trees: vec![stump(0, 0.4, 1.0, 2.0), stump(6, 0.0, 3.0, 4.0)],
        };
        assert_eq!(boosted.predict_row(&row(0.9)), 10.0 + 2.0 + 3.0);
        assert_eq!(boosted.min_features(), 7);
    }

    #[test]
    fn test_backward_child_rejected() {
        let tree = Tree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 1,
                },
                Node::Leaf { value: 1.0 },
            ],
        };
        let ensemble = TreeEnsemble {
            aggregation: Aggregation::Mean,
            base_score: 0.0,
            trees: vec![tree],
        };
        assert!(matches!(ensemble.validate(), Err(ModelError::Invalid(_))));
    }

    #[test]
    fn test_split_on_missing_feature_rejected_by_width() {
        let ensemble = TreeEnsemble {
            aggregation: Aggregation::Mean,
            base_score: 0.0,
            trees: vec![stump(9, 0.0, 1.0, 2.0)],
        };
        assert!(ensemble.check_width(7).is_err());
        assert!(ensemble.predict(&[row(0.1)]).is_err());
    }

    #[test]
    fn test_leaf_parses_untagged() {
        let node: Node = serde_json::from_str(r#"{"value": 35.0}"#).unwrap();
        assert_eq!(node, Node::Leaf { value: 35.0 });
        let node: Node =
            serde_json::from_str(r#"{"feature": 0, "threshold": 0.4, "left": 1, "right": 2}"#)
                .unwrap();
        assert!(matches!(node, Node::Split { feature: 0, .. }));
    }
}
