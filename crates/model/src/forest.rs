//! Bagged regression forest.

use rand::SeedableRng;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::scaler::{N_FEATURES, Row};
use crate::tree::{RegressionTree, TreeParams};

/// Forest hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub tree: TreeParams,
    /// Tree `i` draws its bootstrap sample from `seed + i`.
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            tree: TreeParams::default(),
            seed: 42,
        }
    }
}

impl ForestParams {
    pub fn with_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.tree.max_depth = max_depth;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    params: ForestParams,
    /// Mean decrease in impurity per feature, summing to 1 (or all 0).
    importances: Row,
}

impl RandomForest {
    pub fn fit(rows: &[Row], targets: &[f64], params: ForestParams) -> ModelResult<Self> {
        Self::fit_with_oob(rows, targets, params).map(|(forest, _)| forest)
    }

    /// Fit and also return each row's out-of-bag prediction: the mean over
    /// the trees whose bootstrap sample missed it (`None` if every tree saw it).
    pub fn fit_with_oob(rows: &[Row], targets: &[f64], params: ForestParams) -> ModelResult<(Self, Vec<Option<f64>>)> {
        if params.n_trees == 0 {
            return Err(ModelError::training("forest needs at least one tree"));
        }
        if rows.is_empty() {
            return Err(ModelError::training("cannot fit a forest on zero samples"));
        }

        let mut trees = Vec::with_capacity(params.n_trees);
        let mut importances = [0.0; N_FEATURES];
        let mut oob_sum = vec![0.0; rows.len()];
        let mut oob_count = vec![0usize; rows.len()];
        for i in 0..params.n_trees {
            let sample = bootstrap_sample(rows.len(), params.seed.wrapping_add(i as u64));
            let tree = RegressionTree::fit(rows, targets, &sample, &params.tree)?;

            let mut in_bag = vec![false; rows.len()];
            sample.iter().for_each(|&j| in_bag[j] = true);
            for (j, row) in rows.iter().enumerate().filter(|(j, _)| !in_bag[*j]) {
                oob_sum[j] += tree.predict(row);
                oob_count[j] += 1;
            }

            let raw = tree.raw_importances();
            let total: f64 = raw.iter().sum();
            if total > 0.0 {
                for (acc, r) in importances.iter_mut().zip(raw) {
                    *acc += r / total;
                }
            }
            trees.push(tree);
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|x| *x /= total);
        }

        let oob = oob_sum
            .into_iter()
            .zip(oob_count)
            .map(|(sum, count)| (count > 0).then(|| sum / count as f64))
            .collect();

        Ok((
            Self {
                trees,
                params,
                importances,
            },
            oob,
        ))
    }

    /// Mean of the per-tree predictions.
    pub fn predict(&self, row: &Row) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        sum / self.trees.len() as f64
    }

    pub fn feature_importances(&self) -> &Row {
        &self.importances
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Structural check for forests that did not come from [`RandomForest::fit`].
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }
}

/// Sample `n` indices with replacement.
fn bootstrap_sample(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Uniform::from(0..n);
    (0..n).map(|_| dist.sample(&mut rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> (Vec<Row>, Vec<f64>) {
        let rows: Vec<Row> = (0..120)
            .map(|i| {
                let mut r = [0.0; N_FEATURES];
                r[0] = (i % 12) as f64;
                r[3] = (i / 12) as f64;
                r[7] = ((i * 7) % 5) as f64;
                r
            })
            .collect();
        let targets = rows.iter().map(|r| 2.0 * r[0] + 0.5 * r[3]).collect();
        (rows, targets)
    }

    #[test]
    fn same_seed_gives_identical_forests() {
        let (rows, y) = dataset();
        let params = ForestParams::default().with_trees(8);
        let a = RandomForest::fit(&rows, &y, params).unwrap();
        let b = RandomForest::fit(&rows, &y, params).unwrap();
        assert_eq!(a, b);

        let c = RandomForest::fit(&rows, &y, params.with_seed(7)).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn importances_sum_to_one_and_rank_the_driver_first() {
        let (rows, y) = dataset();
        let forest = RandomForest::fit(&rows, &y, ForestParams::default().with_trees(10)).unwrap();
        let imp = forest.feature_importances();
        let total: f64 = imp.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(imp[0] > imp[3]);
        assert!(imp[3] > imp[7]);
        assert_eq!(imp[1], 0.0);
    }

    #[test]
    fn predictions_stay_inside_target_range() {
        let (rows, y) = dataset();
        let forest = RandomForest::fit(&rows, &y, ForestParams::default().with_trees(5)).unwrap();
        let lo = y.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        for r in &rows {
            let p = forest.predict(r);
            assert!(p >= lo && p <= hi);
        }
    }

    #[test]
    fn out_of_bag_predictions_cover_most_rows() {
        let (rows, y) = dataset();
        let params = ForestParams::default().with_trees(20);
        let (forest, oob) = RandomForest::fit_with_oob(&rows, &y, params).unwrap();
        assert_eq!(forest, RandomForest::fit(&rows, &y, params).unwrap());
        assert_eq!(oob.len(), rows.len());

        let lo = y.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let seen: Vec<f64> = oob.iter().flatten().copied().collect();
        assert!(seen.len() > 100, "only {} rows had out-of-bag trees", seen.len());
        assert!(seen.iter().all(|p| *p >= lo && *p <= hi));
        assert_eq!(forest.validate(), Ok(()));
    }

    #[test]
    fn zero_trees_is_rejected() {
        let (rows, y) = dataset();
        assert!(RandomForest::fit(&rows, &y, ForestParams::default().with_trees(0)).is_err());
    }
}
