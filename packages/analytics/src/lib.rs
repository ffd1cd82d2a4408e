#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregations over the campus incident table.
//!
//! Every function takes the table by shared reference and returns a freshly
//! computed view; nothing is cached here. Results are deterministic for a
//! given table.

pub mod allocation;
pub mod hotspots;
pub mod stats;

use std::collections::BTreeMap;

use campus_safety_analytics_models::{MonthKey, PivotCell, SeverityPivot, TrendView};
use campus_safety_incident_models::IncidentTable;

pub use allocation::allocate_personnel;
pub use hotspots::{DEFAULT_RECENT_MONTHS, hotspots};
pub use stats::incident_stats;

/// Counts incidents by calendar month and incident type.
///
/// Only months with at least one incident appear. Within each month every
/// incident type seen anywhere in the table has a count, zero if absent.
#[must_use]
pub fn monthly_trends(table: &IncidentTable) -> TrendView {
    let incident_types: Vec<String> = table
        .incident_types()
        .into_iter()
        .map(str::to_string)
        .collect();
    let column: BTreeMap<&str, usize> = incident_types
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();

    let mut rows: BTreeMap<MonthKey, Vec<u64>> = BTreeMap::new();
    for record in table {
        let row = rows
            .entry(MonthKey::from_date(record.occurred_at))
            .or_insert_with(|| vec![0; incident_types.len()]);
        row[column[record.incident_type.as_str()]] += 1;
    }

    log::debug!(
        "Computed monthly trends: {} months x {} types",
        rows.len(),
        incident_types.len()
    );

    TrendView::new(incident_types, rows)
}

/// Mean severity for each `(location, incident_type)` pair in the table.
///
/// Pairs with no observations are absent from the result.
#[must_use]
pub fn severity_pivot(table: &IncidentTable) -> SeverityPivot {
    let mut sums: BTreeMap<(&str, &str), (u64, u64)> = BTreeMap::new();
    for record in table {
        let entry = sums
            .entry((record.location.as_str(), record.incident_type.as_str()))
            .or_default();
        entry.0 += u64::from(record.severity.value());
        entry.1 += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let cells = sums
        .into_iter()
        .map(|((location, incident_type), (sum, count))| {
            (
                (location.to_string(), incident_type.to_string()),
                PivotCell {
                    mean: sum as f64 / count as f64,
                    count,
                },
            )
        })
        .collect();

    SeverityPivot::new(cells)
}
