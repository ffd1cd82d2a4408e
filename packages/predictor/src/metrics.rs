//! Held-out evaluation of the severity classifier.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::PredictorError;

/// Precision, recall and F1 for a single severity class.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassMetrics {
    /// Severity level, 1 through 5.
    pub severity: u8,
    /// Share of predictions of this class that were correct.
    pub precision: f64,
    /// Share of records of this class that were predicted as it.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Number of test records whose true severity is this class.
    pub support: usize,
}

/// Averaged metrics across classes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageMetrics {
    /// Averaged precision.
    pub precision: f64,
    /// Averaged recall.
    pub recall: f64,
    /// Averaged F1.
    pub f1: f64,
}

/// Per-class metrics plus accuracy and macro/support-weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationReport {
    /// One entry per class seen in the true or predicted labels, by
    /// ascending severity.
    pub classes: Vec<ClassMetrics>,
    /// Share of test records predicted correctly.
    pub accuracy: f64,
    /// Unweighted mean over `classes`.
    pub macro_avg: AverageMetrics,
    /// Mean over `classes` weighted by support.
    pub weighted_avg: AverageMetrics,
}

impl ClassificationReport {
    /// Scores `y_pred` against `y_true`. Labels are severity class indices
    /// (`severity - 1`).
    ///
    /// Classes are the union of true and predicted labels. A ratio with a
    /// zero denominator is reported as 0.
    ///
    /// # Errors
    ///
    /// Returns [`PredictorError::InsufficientData`] if the inputs are empty
    /// or have different lengths.
    pub fn compute(y_true: &[usize], y_pred: &[usize]) -> Result<Self, PredictorError> {
        if y_true.is_empty() || y_true.len() != y_pred.len() {
            return Err(PredictorError::insufficient(format!(
                "cannot score {} predictions against {} labels",
                y_pred.len(),
                y_true.len()
            )));
        }

        let labels: BTreeSet<usize> = y_true.iter().chain(y_pred).copied().collect();
        let pairs = || y_true.iter().zip(y_pred);

        let classes: Vec<ClassMetrics> = labels
            .iter()
            .map(|&label| {
                let tp = pairs().filter(|&(&t, &p)| t == label && p == label).count();
                let predicted = y_pred.iter().filter(|&&p| p == label).count();
                let support = y_true.iter().filter(|&&t| t == label).count();

                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                ClassMetrics {
                    severity: u8::try_from(label + 1).unwrap_or(u8::MAX),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let correct = pairs().filter(|(t, p)| t == p).count();
        let accuracy = ratio(correct, y_true.len());

        #[allow(clippy::cast_precision_loss)]
        let n_classes = classes.len() as f64;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n_classes,
        };

        #[allow(clippy::cast_precision_loss)]
        let weighted = |metric: fn(&ClassMetrics) -> f64| {
            classes
                .iter()
                .map(|c| metric(c) * c.support as f64)
                .sum::<f64>()
                / y_true.len() as f64
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
        };

        Ok(Self {
            classes,
            accuracy,
            macro_avg,
            weighted_avg,
        })
    }

    /// Metrics for one severity level, if it appeared in the test data.
    #[must_use]
    pub fn class(&self, severity: u8) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.severity == severity)
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "severity", "precision", "recall", "f1-score", "support"
        )?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.severity, c.precision, c.recall, c.f1, c.support
            )?;
        }
        let total: usize = self.classes.iter().map(|c| c.support).sum();
        writeln!(f)?;
        writeln!(f, "{:>12} {:>29.2} {total:>9}", "accuracy", self.accuracy)?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{name:>12} {:>9.2} {:>9.2} {:>9.2} {total:>9}",
                avg.precision, avg.recall, avg.f1
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn per_class_scores() {
        let report = ClassificationReport::compute(&[0, 0, 1, 1], &[0, 1, 1, 1]).unwrap();

        let low = report.class(1).unwrap();
        assert!(close(low.precision, 1.0));
        assert!(close(low.recall, 0.5));
        assert!(close(low.f1, 2.0 / 3.0));
        assert_eq!(low.support, 2);

        let high = report.class(2).unwrap();
        assert!(close(high.precision, 2.0 / 3.0));
        assert!(close(high.recall, 1.0));
        assert!(close(high.f1, 0.8));

        assert!(close(report.accuracy, 0.75));
        assert!(close(report.macro_avg.recall, 0.75));
        assert!(close(report.weighted_avg.f1, (2.0 / 3.0 + 0.8) / 2.0));
    }

    #[test]
    fn predicted_only_class_is_reported_with_zero_support() {
        let report = ClassificationReport::compute(&[0, 1], &[0, 4]).unwrap();
        let phantom = report.class(5).unwrap();
        assert_eq!(phantom.support, 0);
        assert!(close(phantom.precision, 0.0));
        assert!(close(phantom.recall, 0.0));

        let missed = report.class(2).unwrap();
        assert!(close(missed.precision, 0.0));
        assert!(close(missed.f1, 0.0));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert!(ClassificationReport::compute(&[0, 1], &[0]).is_err());
        assert!(ClassificationReport::compute(&[], &[]).is_err());
    }

    #[test]
    fn display_lists_every_class() {
        let report = ClassificationReport::compute(&[0, 2, 2], &[0, 2, 0]).unwrap();
        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("weighted avg"));
        assert_eq!(text.lines().filter(|l| l.trim_start().starts_with('3')).count(), 1);
    }
}
