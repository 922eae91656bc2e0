//! CART regression tree (variance-reduction splits, mean-valued leaves).
//!
//! Nodes live in a flat arena so a fitted tree serializes as a plain list and
//! prediction is a loop rather than recursion. Split search sorts the node's
//! samples once per feature and sweeps running sums, so each node costs
//! `O(features · n log n)`.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::scaler::{N_FEATURES, Row};

/// Minimum node variance worth splitting.
const MIN_VARIANCE: f64 = 1e-10;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
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
    /// Unnormalized impurity decrease per feature.
    importances: Row,
}

struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    /// Fit on the rows selected by `sample` (indices may repeat, as in a bootstrap).
    pub fn fit(rows: &[Row], targets: &[f64], sample: &[usize], params: &TreeParams) -> ModelResult<Self> {
        if rows.len() != targets.len() {
            return Err(ModelError::training(format!(
                "feature rows ({}) and targets ({}) differ in length",
                rows.len(),
                targets.len()
            )));
        }
        if sample.is_empty() {
            return Err(ModelError::training("cannot fit a tree on zero samples"));
        }
        if let Some(bad) = sample.iter().find(|&&i| i >= rows.len()) {
            return Err(ModelError::training(format!("sample index {bad} out of range")));
        }

        let mut builder = Builder {
            rows,
            targets,
            params,
            nodes: Vec::new(),
            importances: [0.0; N_FEATURES],
        };
        let mut idx = sample.to_vec();
        builder.grow(&mut idx, 0);

        Ok(Self {
            nodes: builder.nodes,
            importances: builder.importances,
        })
    }

    pub fn predict(&self, row: &Row) -> f64 {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Check the arena is walkable: children point forward, features exist.
    /// A fitted tree always passes; a deserialized one may not.
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (at, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature, left, right, ..
            } = node
            {
                if *feature >= N_FEATURES {
                    return Err(format!("node {at} splits on feature {feature}"));
                }
                for child in [*left, *right] {
                    if child <= at || child >= self.nodes.len() {
                        return Err(format!("node {at} points to node {child} of {}", self.nodes.len()));
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn raw_importances(&self) -> &Row {
        &self.importances
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match &nodes[at] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

struct Builder<'a> {
    rows: &'a [Row],
    targets: &'a [f64],
    params: &'a TreeParams,
    nodes: Vec<Node>,
    importances: Row,
}

impl Builder<'_> {
    /// Grow the subtree over `idx` and return its node id.
    fn grow(&mut self, idx: &mut [usize], depth: usize) -> usize {
        let n = idx.len();
        let (sum, sum_sq) = idx.iter().fold((0.0, 0.0), |(s, q), &i| {
            let y = self.targets[i];
            (s + y, q + y * y)
        });
        let mean = sum / n as f64;
        let sse = (sum_sq - sum * sum / n as f64).max(0.0);

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        if n < self.params.min_samples_split || depth >= self.params.max_depth || sse / (n as f64) < MIN_VARIANCE {
            return id;
        }
        let Some(split) = self.best_split(idx, sse) else {
            return id;
        };

        let rows = self.rows;
        idx.sort_unstable_by(|&a, &b| rows[a][split.feature].total_cmp(&rows[b][split.feature]));
        let mid = idx.partition_point(|&i| rows[i][split.feature] <= split.threshold);
        self.importances[split.feature] += split.gain;

        let (left_idx, right_idx) = idx.split_at_mut(mid);
        let left = self.grow(left_idx, depth + 1);
        let right = self.grow(right_idx, depth + 1);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn best_split(&self, idx: &mut [usize], parent_sse: f64) -> Option<Split> {
        let rows = self.rows;
        let n = idx.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let (total, total_sq) = idx.iter().fold((0.0, 0.0), |(s, q), &i| {
            let y = self.targets[i];
            (s + y, q + y * y)
        });

        let mut best: Option<Split> = None;
        for feature in 0..N_FEATURES {
            idx.sort_unstable_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));

            let (mut left_sum, mut left_sq) = (0.0, 0.0);
            for pos in 0..n - 1 {
                let y = self.targets[idx[pos]];
                left_sum += y;
                left_sq += y * y;

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf {
                    continue;
                }
                if n_right < min_leaf {
                    break;
                }
                let here = rows[idx[pos]][feature];
                let next = rows[idx[pos + 1]][feature];
                if here == next {
                    continue;
                }

                let sse_left = (left_sq - left_sum * left_sum / n_left as f64).max(0.0);
                let right_sum = total - left_sum;
                let sse_right = ((total_sq - left_sq) - right_sum * right_sum / n_right as f64).max(0.0);
                let gain = parent_sse - sse_left - sse_right;

                if gain > 0.0 && best.as_ref().is_none_or(|b| gain > b.gain) {
                    let mut threshold = (here + next) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(Split {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }
        best
    }
}
