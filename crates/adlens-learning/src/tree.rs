//! Regression tree grown by variance reduction, the random forest's base
//! learner.
//!
//! Nodes live in a flat arena with the root at index 0. Splits maximize
//! `G_L² / n_L + G_R² / n_R - G² / n` where `G` is the sum of targets in a
//! node; leaves predict the node mean.

use crate::error::{LearningError, Result};
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Growth limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    /// Fit on the rows listed in `rows`; repeated indices act as weights.
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        rows: &[usize],
        params: &TreeParams,
    ) -> Self {
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut stack = vec![(0usize, rows.to_vec(), 0usize)];

        while let Some((slot, node_rows, depth)) = stack.pop() {
            let sum: f64 = node_rows.iter().map(|&i| y[i]).sum();
            let leaf = Node::Leaf {
                value: leaf_value(sum, node_rows.len()),
            };

            let can_split = node_rows.len() >= params.min_samples_split.max(2)
                && params.max_depth.is_none_or(|max| depth < max);
            let best = if can_split {
                best_split(x, y, &node_rows, sum, params)
            } else {
                None
            };

            let Some(split) = best else {
                nodes[slot] = leaf;
                continue;
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = node_rows
                .iter()
                .copied()
                .partition(|&i| x[[i, split.feature]] <= split.threshold);

            let left = nodes.len();
            nodes.push(Node::Leaf { value: 0.0 });
            let right = nodes.len();
            nodes.push(Node::Leaf { value: 0.0 });

            nodes[slot] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
            stack.push((right, right_rows, depth + 1));
            stack.push((left, left_rows, depth + 1));
        }

        Self { nodes }
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Check a deserialized tree before it is used for prediction.
    ///
    /// Every split must test a feature below `n_features`, and both children
    /// must lie after the split in the arena. Children always follow their
    /// parent, so a walk from the root cannot loop or index out of bounds.
    pub fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(LearningError::InvalidBundle(
                "regression tree has no nodes".to_string(),
            ));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            let Node::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            else {
                continue;
            };

            if *feature >= n_features {
                return Err(LearningError::InvalidBundle(format!(
                    "tree node {} splits on feature {} but the model has {} features",
                    index, feature, n_features
                )));
            }
            if threshold.is_nan() {
                return Err(LearningError::InvalidBundle(format!(
                    "tree node {} has a NaN threshold",
                    index
                )));
            }
            for child in [*left, *right] {
                if child <= index || child >= self.nodes.len() {
                    return Err(LearningError::InvalidBundle(format!(
                        "tree node {} points to child {} outside {}..{}",
                        index,
                        child,
                        index + 1,
                        self.nodes.len()
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

fn leaf_value(sum: f64, n: usize) -> f64 {
    if n > 0 { sum / n as f64 } else { 0.0 }
}

fn score(sum: f64, n: usize) -> f64 {
    if n > 0 { sum * sum / n as f64 } else { 0.0 }
}

fn best_split(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    rows: &[usize],
    total: f64,
    params: &TreeParams,
) -> Option<SplitCandidate> {
    let n = rows.len();
    let min_leaf = params.min_samples_leaf.max(1);
    let parent = score(total, n);
    let min_gain = 1e-12 * parent.abs().max(1.0);
    let mut best: Option<SplitCandidate> = None;
    let mut sorted = rows.to_vec();

    for feature in 0..x.ncols() {
        sorted.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        let mut left_sum = 0.0;
        for k in 0..n - 1 {
            left_sum += y[sorted[k]];
            let left_n = k + 1;
            let right_n = n - left_n;
            if left_n < min_leaf || right_n < min_leaf {
                continue;
            }

            let here = x[[sorted[k], feature]];
            let next = x[[sorted[k + 1], feature]];
            if here >= next {
                continue;
            }

            let gain = score(left_sum, left_n) + score(total - left_sum, right_n) - parent;
            if gain > min_gain && best.as_ref().is_none_or(|b| gain > b.gain) {
                let mut threshold = here + (next - here) / 2.0;
                if threshold >= next {
                    threshold = here;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    gain,
                });
            }
        }
    }

    best
}
