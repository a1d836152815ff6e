use crate::error::{LearningError, Result};
use crate::tree::{RegressionTree, TreeParams};
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub tree: TreeParams,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeParams::default(),
        }
    }
}

/// Bagged regression trees; the prediction is the mean over trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Each tree sees a bootstrap sample drawn with `seed + tree index`, so
    /// a fixed seed gives the same forest.
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        params: &ForestParams,
        seed: u64,
    ) -> Self {
        let n = x.nrows();
        let trees = (0..params.n_estimators)
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(x, y, &sample, &params.tree)
            })
            .collect::<Vec<_>>();

        debug!(
            "Random forest: {} trees, {} nodes in total",
            trees.len(),
            trees.iter().map(RegressionTree::node_count).sum::<usize>()
        );

        Self {
            n_features: x.ncols(),
            trees,
        }
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Reject a deserialized forest with no trees or any malformed tree.
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(LearningError::InvalidBundle(
                "random forest has no trees".to_string(),
            ));
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features).map_err(|e| match e {
                LearningError::InvalidBundle(msg) => {
                    LearningError::InvalidBundle(format!("random forest tree {}: {}", index, msg))
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn step_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 3) as f64 });
        let y = Array1::from_shape_fn(40, |i| if i < 20 { 10.0 } else { 50.0 });
        (x, y)
    }

    #[test]
    fn test_forest_learns_step() {
        let (x, y) = step_data();
        let params = ForestParams {
            n_estimators: 25,
            ..Default::default()
        };
        let forest = RandomForest::fit(x.view(), y.view(), &params, 42);

        assert_eq!(forest.n_trees(), 25);
        assert!(forest.predict_row(&[2.0, 2.0]) < 20.0);
        assert!(forest.predict_row(&[38.0, 2.0]) > 40.0);
    }

    #[test]
    fn test_forest_is_reproducible() {
        let (x, y) = step_data();
        let params = ForestParams {
            n_estimators: 5,
            ..Default::default()
        };
        let a = RandomForest::fit(x.view(), y.view(), &params, 7);
        let b = RandomForest::fit(x.view(), y.view(), &params, 7);
        assert_eq!(a, b);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_empty_forest_is_invalid() {
        let (x, y) = step_data();
        let params = ForestParams {
            n_estimators: 0,
            ..Default::default()
        };
        let forest = RandomForest::fit(x.view(), y.view(), &params, 1);
        assert_eq!(forest.n_trees(), 0);
        assert!(forest.validate().is_err());
    }
}
