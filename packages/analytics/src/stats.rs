//! Whole-table summary statistics.

use std::collections::BTreeMap;

use campus_safety_analytics_models::{IncidentStats, LabelCount};
use campus_safety_incident_models::IncidentTable;

/// Computes totals by incident type and location plus the mean severity.
#[must_use]
pub fn incident_stats(table: &IncidentTable) -> IncidentStats {
    let mut by_type: BTreeMap<&str, u64> = BTreeMap::new();
    let mut by_location: BTreeMap<&str, u64> = BTreeMap::new();
    let mut severity_sum = 0u64;

    for record in table {
        *by_type.entry(record.incident_type.as_str()).or_default() += 1;
        *by_location.entry(record.location.as_str()).or_default() += 1;
        severity_sum += u64::from(record.severity.value());
    }

    let total = table.len() as u64;
    #[allow(clippy::cast_precision_loss)]
    let mean_severity = (total > 0).then(|| severity_sum as f64 / total as f64);

    IncidentStats {
        total,
        by_type: ranked(by_type),
        by_location: ranked(by_location),
        mean_severity,
    }
}

fn ranked(counts: BTreeMap<&str, u64>) -> Vec<LabelCount> {
    let mut out: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount {
            label: label.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}
