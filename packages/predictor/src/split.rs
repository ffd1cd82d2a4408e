//! Seeded train/test partitioning.

use std::collections::BTreeMap;

use rand::SeedableRng as _;
use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;

use crate::PredictorError;

/// Row indices assigned to each side of the split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    /// Rows used to fit the model.
    pub train: Vec<usize>,
    /// Rows held out for evaluation.
    pub test: Vec<usize>,
}

/// Partitions `labels.len()` rows into train and test sets.
///
/// The test set holds `ceil(test_fraction * n)` rows. Without `stratify`
/// the rows are drawn from one seeded shuffle and class proportions may
/// differ between the sides. With `stratify` each class contributes its
/// proportional share to the test set.
///
/// # Errors
///
/// Returns [`PredictorError::InsufficientData`] if either side would be
/// empty.
pub fn train_test_split(
    labels: &[usize],
    test_fraction: f64,
    seed: u64,
    stratify: bool,
) -> Result<TrainTestSplit, PredictorError> {
    let n = labels.len();
    let n_test = test_size(n, test_fraction);
    if n_test == 0 || n_test >= n {
        return Err(PredictorError::insufficient(format!(
            "{n} records cannot be split into non-empty train and test sets (test fraction {test_fraction})"
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);

    if !stratify {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut rng);
        let train = order.split_off(n_test);
        return Ok(TrainTestSplit { train, test: order });
    }

    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(i);
    }

    let quotas = stratified_quotas(&by_class, n_test);

    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (mut rows, quota) in by_class.into_values().zip(quotas) {
        rows.shuffle(&mut rng);
        let rest = rows.split_off(quota);
        test.extend(rows);
        train.extend(rest);
    }
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Ok(TrainTestSplit { train, test })
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn test_size(n: usize, test_fraction: f64) -> usize {
    (test_fraction * n as f64).ceil() as usize
}

/// Per-class test counts summing to `n_test`: floor of each class's share,
/// with the remainder going to the largest fractional parts (lower class
/// first on ties).
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn stratified_quotas(by_class: &BTreeMap<usize, Vec<usize>>, n_test: usize) -> Vec<usize> {
    let n: usize = by_class.values().map(Vec::len).sum();
    let shares: Vec<f64> = by_class
        .values()
        .map(|rows| rows.len() as f64 * n_test as f64 / n as f64)
        .collect();
    let mut quotas: Vec<usize> = shares.iter().map(|s| s.floor() as usize).collect();

    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = shares[a] - shares[a].floor();
        let fb = shares[b] - shares[b].floor();
        fb.total_cmp(&fa)
    });

    let mut remaining = n_test - quotas.iter().sum::<usize>();
    for i in order.into_iter().cycle() {
        if remaining == 0 {
            break;
        }
        if quotas[i] < by_class.values().nth(i).map_or(0, Vec::len) {
            quotas[i] += 1;
            remaining -= 1;
        }
    }
    quotas
}
