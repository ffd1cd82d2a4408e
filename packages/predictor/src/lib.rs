#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Severity prediction for campus incidents.
//!
//! [`train`] one-hot encodes `location` and `incident_type`, holds out a
//! seeded test split, fits a [`RandomForest`] of `linfa-trees` decision
//! trees on the rest and scores it. Identical tables and configs always
//! produce identical results.

pub mod config;
pub mod encoding;
pub mod error;
pub mod forest;
pub mod importance;
pub mod metrics;
pub mod split;

use std::collections::BTreeSet;

use campus_safety_incident_models::{IncidentSeverity, IncidentTable};
use serde::Serialize;

pub use config::PredictorConfig;
pub use encoding::{FeatureEncoder, FeatureMatrix};
pub use error::PredictorError;
pub use forest::{ForestParams, RandomForest};
pub use importance::{RankedFeature, rank_features};
pub use metrics::{AverageMetrics, ClassMetrics, ClassificationReport};
pub use split::{TrainTestSplit, train_test_split};

/// A fitted forest together with the vocabulary it was trained on.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    encoder: FeatureEncoder,
    forest: RandomForest,
}

impl TrainedModel {
    /// Predicts the severity of an incident. Labels the model never saw
    /// contribute nothing to the prediction.
    #[must_use]
    pub fn predict(&self, location: &str, incident_type: &str) -> IncidentSeverity {
        let row = self.encoder.encode(location, incident_type);
        // the forest is always fitted with IncidentSeverity::COUNT classes
        IncidentSeverity::from_index(self.forest.predict(&row)).unwrap_or(IncidentSeverity::Minimal)
    }

    /// Encoded feature names, in column order.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.encoder.feature_names()
    }

    #[must_use]
    pub const fn forest(&self) -> &RandomForest {
        &self.forest
    }
}

/// Output of one training run.
#[derive(Debug, Clone)]
pub struct PredictionResult {
    /// The fitted model, ready for [`TrainedModel::predict`].
    pub model: TrainedModel,
    /// Scores on the held-out test split.
    pub report: ClassificationReport,
    /// Highest-ranked encoded features, most important first.
    pub top_features: Vec<RankedFeature>,
    /// Records the forest was fitted on.
    pub train_size: usize,
    /// Records held out for evaluation.
    pub test_size: usize,
}

/// The serialisable part of a [`PredictionResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    /// Records the forest was fitted on.
    pub train_size: usize,
    /// Records held out for evaluation.
    pub test_size: usize,
    /// Trees in the fitted forest.
    pub tree_count: usize,
    /// Scores on the held-out test split.
    pub report: ClassificationReport,
    /// Highest-ranked encoded features, most important first.
    pub top_features: Vec<RankedFeature>,
}

impl PredictionResult {
    #[must_use]
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            train_size: self.train_size,
            test_size: self.test_size,
            tree_count: self.model.forest.trees().len(),
            report: self.report.clone(),
            top_features: self.top_features.clone(),
        }
    }
}

/// Trains and evaluates a severity classifier on `table`.
///
/// # Errors
///
/// * [`PredictorError::InvalidConfig`] if `config` fails validation
/// * [`PredictorError::InsufficientData`] if the table is too small to split
///   or the test split holds fewer than two severity classes
/// * [`PredictorError::Training`] if the tree learner fails
pub fn train(
    table: &IncidentTable,
    config: &PredictorConfig,
) -> Result<PredictionResult, PredictorError> {
    config.validate()?;

    if table.is_empty() {
        return Err(PredictorError::insufficient("no incident records to train on"));
    }

    let encoder = FeatureEncoder::fit(table);
    let x = encoder.encode_table(table);
    let labels: Vec<usize> = table.iter().map(|r| r.severity.index()).collect();

    let split = train_test_split(&labels, config.test_fraction, config.seed, config.stratify)?;

    let y_test: Vec<usize> = split.test.iter().map(|&i| labels[i]).collect();
    let test_classes: BTreeSet<usize> = y_test.iter().copied().collect();
    if test_classes.len() < 2 {
        return Err(PredictorError::insufficient(format!(
            "test split of {} records has {} severity class(es); at least 2 are required",
            y_test.len(),
            test_classes.len()
        )));
    }

    let x_train = x.select(&split.train);
    let y_train: Vec<usize> = split.train.iter().map(|&i| labels[i]).collect();

    let forest = RandomForest::fit(
        &x_train,
        &y_train,
        IncidentSeverity::COUNT,
        &ForestParams {
            tree_count: config.tree_count,
            seed: config.seed,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
        },
    )?;

    let y_pred = forest.predict_rows(&x.select(&split.test).to_array());
    let report = ClassificationReport::compute(&y_test, &y_pred)?;

    let top_features = rank_features(
        &encoder.feature_names(),
        forest.feature_importances(),
        config.top_k_features,
    );

    log::info!(
        "Trained {} trees on {} records ({} held out): accuracy {:.3}",
        config.tree_count,
        split.train.len(),
        split.test.len(),
        report.accuracy
    );
    log::debug!("Classification report:\n{report}");

    Ok(PredictionResult {
        model: TrainedModel { encoder, forest },
        report,
        top_features,
        train_size: split.train.len(),
        test_size: split.test.len(),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use campus_safety_incident_models::{IncidentRecord, IncidentSeverity, IncidentTable};
    use chrono::NaiveDate;

    pub fn table(rows: &[(&str, &str, u8)]) -> IncidentTable {
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        rows.iter()
            .map(|&(location, incident_type, severity)| IncidentRecord {
                occurred_at: day,
                location: location.to_string(),
                incident_type: incident_type.to_string(),
                severity: IncidentSeverity::from_value(severity).unwrap(),
                lat: 40.0,
                lon: -74.0,
            })
            .collect()
    }
}
