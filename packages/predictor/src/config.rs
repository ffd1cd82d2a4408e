use serde::{Deserialize, Serialize};

use crate::PredictorError;

/// Training options for the severity model.
///
/// Field names follow the camelCase keys used in the `[predictor]` section
/// of the analysis config. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PredictorConfig {
    /// Number of trees in the forest.
    pub tree_count: usize,
    /// Seed for the split and for every tree.
    pub seed: u64,
    /// Share of records held out for evaluation, in (0, 1).
    pub test_fraction: f64,
    /// How many ranked features to report.
    pub top_k_features: usize,
    /// Maximum tree depth; unbounded when `None`.
    pub max_depth: Option<usize>,
    /// Smallest node that may still be split.
    pub min_samples_split: usize,
    /// Split train/test proportionally per severity class.
    pub stratify: bool,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            tree_count: 100,
            seed: 42,
            test_fraction: 0.2,
            top_k_features: 10,
            max_depth: None,
            min_samples_split: 2,
            stratify: false,
        }
    }
}

impl PredictorConfig {
    /// Checks that every option is in range.
    ///
    /// # Errors
    ///
    /// Returns [`PredictorError::InvalidConfig`] naming the first bad option.
    pub fn validate(&self) -> Result<(), PredictorError> {
        if self.tree_count == 0 {
            return Err(PredictorError::invalid("treeCount must be at least 1"));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PredictorError::invalid(format!(
                "testFraction must be between 0 and 1 (exclusive), got {}",
                self.test_fraction
            )));
        }
        if self.min_samples_split < 2 {
            return Err(PredictorError::invalid("minSamplesSplit must be at least 2"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PredictorConfig::default();
        assert_eq!(config.tree_count, 100);
        assert_eq!(config.seed, 42);
        assert!((config.test_fraction - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.top_k_features, 10);
        assert!(!config.stratify);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: PredictorConfig = toml::from_str("treeCount = 25\nseed = 7").unwrap();
        assert_eq!(config.tree_count, 25);
        assert_eq!(config.seed, 7);
        assert_eq!(config.top_k_features, 10);
    }

    #[test]
    fn rejects_out_of_range_options() {
        let bad = [
            PredictorConfig {
                tree_count: 0,
                ..PredictorConfig::default()
            },
            PredictorConfig {
                test_fraction: 0.0,
                ..PredictorConfig::default()
            },
            PredictorConfig {
                test_fraction: 1.0,
                ..PredictorConfig::default()
            },
            PredictorConfig {
                test_fraction: f64::NAN,
                ..PredictorConfig::default()
            },
            PredictorConfig {
                min_samples_split: 1,
                ..PredictorConfig::default()
            },
        ];
        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(PredictorError::InvalidConfig { .. })
            ));
        }
    }
}
