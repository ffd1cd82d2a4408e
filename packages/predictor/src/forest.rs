//! Bagged ensemble of `linfa-trees` decision trees.

use linfa::Dataset;
use linfa::traits::{Fit as _, Predict as _};
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};

use crate::PredictorError;
use crate::encoding::FeatureMatrix;

/// Forest-level training options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    /// Number of trees.
    pub tree_count: usize,
    /// Master seed; every tree gets its own seed drawn from it.
    pub seed: u64,
    /// Per-tree depth limit.
    pub max_depth: Option<usize>,
    /// Per-tree minimum node size for splitting.
    pub min_samples_split: usize,
}

/// A fitted random forest classifier over class indices.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree<f64, usize>>,
    n_classes: usize,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    /// Fits `params.tree_count` Gini trees, each on a bootstrap sample of
    /// the rows of `x` drawn from its own seeded generator.
    ///
    /// Feature importances are the trees' relative impurity decreases,
    /// averaged and normalised to sum to 1. They stay all zero when no tree
    /// ever split.
    ///
    /// # Errors
    ///
    /// * [`PredictorError::Training`] if the tree learner rejects a sample
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(
        x: &FeatureMatrix,
        y: &[usize],
        n_classes: usize,
        params: &ForestParams,
    ) -> Result<Self, PredictorError> {
        let n_rows = x.n_rows();
        let n_features = x.n_features();
        let tree_params = DecisionTree::<f64, usize>::params()
            .split_quality(SplitQuality::Gini)
            .max_depth(params.max_depth)
            .min_weight_split(params.min_samples_split as f32)
            .min_weight_leaf(1.0);

        let mut master = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.tree_count);
        let mut totals = vec![0.0; n_features];

        for _ in 0..params.tree_count {
            let mut rng = StdRng::seed_from_u64(master.r#gen());
            let samples: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();

            let records = x.select(&samples).to_array();
            let targets: Array1<usize> = samples.iter().map(|&i| y[i]).collect();
            let tree = tree_params
                .fit(&Dataset::new(records, targets))
                .map_err(|e| PredictorError::Training {
                    message: e.to_string(),
                })?;

            for (total, value) in totals.iter_mut().zip(tree.feature_importance().iter()) {
                // a tree with no split reports 0/0
                if value.is_finite() {
                    *total += value;
                }
            }
            trees.push(tree);
        }

        normalize(&mut totals);

        log::debug!(
            "Fitted {} trees on {n_rows} rows x {n_features} features",
            trees.len()
        );

        Ok(Self {
            trees,
            n_classes,
            feature_importances: totals,
        })
    }

    /// Majority vote of the trees for every row of `x`; ties go to the
    /// lower class index.
    #[must_use]
    pub fn predict_rows(&self, x: &Array2<f64>) -> Vec<usize> {
        let mut votes = vec![vec![0_usize; self.n_classes]; x.nrows()];
        for tree in &self.trees {
            let labels: Array1<usize> = tree.predict(x);
            for (row, &label) in votes.iter_mut().zip(labels.iter()) {
                if let Some(count) = row.get_mut(label) {
                    *count += 1;
                }
            }
        }
        votes.iter().map(|row| majority(row)).collect()
    }

    /// Majority vote for a single encoded row.
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> usize {
        let x = Array2::from_shape_fn((1, row.len()), |(_, j)| row[j]);
        self.predict_rows(&x).first().copied().unwrap_or(0)
    }

    /// Normalised importance per feature column.
    #[must_use]
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    /// The fitted trees.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree<f64, usize>] {
        &self.trees
    }
}

fn majority(votes: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in votes.iter().enumerate() {
        if count > votes[best] {
            best = class;
        }
    }
    best
}

fn normalize(values: &mut [f64]) {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 {
        for v in values {
            *v /= sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (FeatureMatrix, Vec<usize>) {
        let mut x = FeatureMatrix::new(3);
        let mut y = Vec::new();
        for i in 0..60u32 {
            let a = f64::from(i % 2);
            let noise = f64::from((i / 2) % 3 == 0);
            x.push_row(&[a, 1.0 - a, noise]);
            y.push(if i % 2 == 0 { 0 } else { 1 });
        }
        (x, y)
    }

    fn params(seed: u64) -> ForestParams {
        ForestParams {
            tree_count: 15,
            seed,
            max_depth: None,
            min_samples_split: 2,
        }
    }

    #[test]
    fn learns_a_separable_signal() {
        let (x, y) = separable();
        let forest = RandomForest::fit(&x, &y, 2, &params(42)).unwrap();

        assert_eq!(forest.trees().len(), 15);
        assert_eq!(forest.predict(&[1.0, 0.0, 0.0]), 1);
        assert_eq!(forest.predict(&[0.0, 1.0, 1.0]), 0);
        assert_eq!(forest.predict_rows(&x.to_array()), y);

        let importances = forest.feature_importances();
        let sum: f64 = importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(importances[0] + importances[1] > importances[2]);
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = separable();
        let a = RandomForest::fit(&x, &y, 2, &params(9)).unwrap();
        let b = RandomForest::fit(&x, &y, 2, &params(9)).unwrap();
        assert_eq!(a.feature_importances(), b.feature_importances());
        assert_eq!(a.predict_rows(&x.to_array()), b.predict_rows(&x.to_array()));
    }

    #[test]
    fn single_class_sample_has_zero_importance() {
        let mut x = FeatureMatrix::new(2);
        for i in 0..10u32 {
            let a = f64::from(i % 2);
            x.push_row(&[a, 1.0 - a]);
        }
        let forest = RandomForest::fit(&x, &[3; 10], 5, &params(1)).unwrap();
        assert_eq!(forest.feature_importances(), [0.0, 0.0]);
        assert_eq!(forest.predict(&[1.0, 0.0]), 3);
    }

    #[test]
    fn vote_ties_go_to_lower_class() {
        assert_eq!(majority(&[0, 2, 2, 1]), 1);
        assert_eq!(majority(&[0, 0, 0]), 0);

        let forest = RandomForest {
            trees: Vec::new(),
            n_classes: 3,
            feature_importances: vec![0.0],
        };
        assert_eq!(forest.predict(&[1.0]), 0);
    }
}
