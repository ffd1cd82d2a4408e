#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Derived statistical views over the campus incident table.
//!
//! These types are recomputed from an incident table on demand and never
//! persisted. Their JSON forms are what the API returns for the live
//! endpoints.

use std::collections::BTreeMap;

use chrono::{Datelike as _, NaiveDate};
use serde::{Serialize, Serializer};

/// A calendar month (year + month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    /// Calendar year.
    pub year: i32,
    /// Month of the year, 1-12.
    pub month: u32,
}

impl MonthKey {
    /// Creates a month key.
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Returns the month containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Incident counts by calendar month and incident type.
///
/// Months are ascending. Every month carries a count for every incident
/// type in the view, zero where no incident of that type occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendView {
    incident_types: Vec<String>,
    rows: BTreeMap<MonthKey, Vec<u64>>,
}

impl TrendView {
    /// Builds a view from dense rows. Each row holds one count per entry
    /// of `incident_types`, in the same order.
    #[must_use]
    pub fn new(incident_types: Vec<String>, rows: BTreeMap<MonthKey, Vec<u64>>) -> Self {
        debug_assert!(rows.values().all(|r| r.len() == incident_types.len()));
        Self {
            incident_types,
            rows,
        }
    }

    /// Incident types, in column order.
    #[must_use]
    pub fn incident_types(&self) -> &[String] {
        &self.incident_types
    }

    /// Months present in the view, ascending.
    pub fn months(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.rows.keys().copied()
    }

    /// Rows of `(month, counts)`, counts in [`Self::incident_types`] order.
    pub fn rows(&self) -> impl Iterator<Item = (MonthKey, &[u64])> + '_ {
        self.rows.iter().map(|(m, c)| (*m, c.as_slice()))
    }

    /// Count for one `(month, incident_type)` pair, zero if unseen.
    #[must_use]
    pub fn count(&self, month: MonthKey, incident_type: &str) -> u64 {
        let Some(col) = self.incident_types.iter().position(|t| t == incident_type) else {
            return 0;
        };
        self.rows.get(&month).map_or(0, |row| row[col])
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.rows.values().flatten().sum()
    }

    /// Whether the view has no months.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Nested `month -> incident_type -> count` form.
    #[must_use]
    pub fn to_nested(&self) -> BTreeMap<String, BTreeMap<String, u64>> {
        self.rows
            .iter()
            .map(|(month, counts)| {
                let by_type = self
                    .incident_types
                    .iter()
                    .cloned()
                    .zip(counts.iter().copied())
                    .collect();
                (month.to_string(), by_type)
            })
            .collect()
    }
}

impl Serialize for TrendView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_nested().serialize(serializer)
    }
}

/// Mean severity for one `(location, incident_type)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotCell {
    /// Arithmetic mean of the severities observed.
    pub mean: f64,
    /// Number of observations.
    pub count: u64,
}

/// Mean severity by location and incident type.
///
/// Pairs that were never observed have no cell. They are reported as
/// missing, never as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeverityPivot {
    locations: Vec<String>,
    incident_types: Vec<String>,
    cells: BTreeMap<(String, String), PivotCell>,
}

impl SeverityPivot {
    /// Builds a pivot from the observed cells. Row and column labels are
    /// taken from the cells, sorted.
    #[must_use]
    pub fn new(cells: BTreeMap<(String, String), PivotCell>) -> Self {
        let mut locations: Vec<String> = cells.keys().map(|(l, _)| l.clone()).collect();
        locations.dedup();
        let mut incident_types: Vec<String> = cells.keys().map(|(_, t)| t.clone()).collect();
        incident_types.sort();
        incident_types.dedup();

        Self {
            locations,
            incident_types,
            cells,
        }
    }

    /// Row labels, sorted.
    #[must_use]
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Column labels, sorted.
    #[must_use]
    pub fn incident_types(&self) -> &[String] {
        &self.incident_types
    }

    /// The cell for a pair, if observed.
    #[must_use]
    pub fn cell(&self, location: &str, incident_type: &str) -> Option<&PivotCell> {
        self.cells
            .get(&(location.to_string(), incident_type.to_string()))
    }

    /// Mean severity for a pair, if observed.
    #[must_use]
    pub fn mean(&self, location: &str, incident_type: &str) -> Option<f64> {
        self.cell(location, incident_type).map(|c| c.mean)
    }

    /// Observed cells in `(location, incident_type)` order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str, &PivotCell)> + '_ {
        self.cells
            .iter()
            .map(|((l, t), c)| (l.as_str(), t.as_str(), c))
    }

    /// Number of observed cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no pair was observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Dense grid of means, rows by location and columns by incident type.
    #[must_use]
    pub fn grid(&self) -> Vec<Vec<Option<f64>>> {
        self.locations
            .iter()
            .map(|l| {
                self.incident_types
                    .iter()
                    .map(|t| self.mean(l, t))
                    .collect()
            })
            .collect()
    }
}

impl Serialize for SeverityPivot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nested: BTreeMap<&str, BTreeMap<&str, Option<f64>>> = self
            .locations
            .iter()
            .map(|l| {
                let row = self
                    .incident_types
                    .iter()
                    .map(|t| (t.as_str(), self.mean(l, t)))
                    .collect();
                (l.as_str(), row)
            })
            .collect();
        nested.serialize(serializer)
    }
}

/// A location ranked by incident risk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Location label.
    pub location: String,
    /// All incidents at this location.
    pub incident_count: u64,
    /// Incidents inside the recent window.
    pub recent_count: u64,
    /// `recent_count * 2 + incident_count`.
    pub risk_score: u64,
}

/// Security staff assigned to one hotspot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonnelAllocation {
    /// Location label.
    pub location: String,
    /// Risk score the share was weighted by.
    pub risk_score: u64,
    /// Staff assigned here.
    pub personnel: u32,
}

/// Count of incidents sharing one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelCount {
    /// The label (incident type or location).
    pub label: String,
    /// Number of incidents.
    pub count: u64,
}

/// Summary statistics for the whole table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentStats {
    /// Number of incidents.
    pub total: u64,
    /// Counts by incident type, most frequent first.
    pub by_type: Vec<LabelCount>,
    /// Counts by location, most frequent first.
    pub by_location: Vec<LabelCount>,
    /// Mean severity, absent for an empty table.
    pub mean_severity: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(mean: f64, count: u64) -> PivotCell {
        PivotCell { mean, count }
    }

    #[test]
    fn month_key_formats_with_padding() {
        assert_eq!(MonthKey::new(2024, 3).to_string(), "2024-03");
        let date = NaiveDate::from_ymd_opt(2023, 11, 30).unwrap();
        assert_eq!(MonthKey::from_date(date), MonthKey::new(2023, 11));
    }

    #[test]
    fn trend_view_lookup_defaults_to_zero() {
        let mut rows = BTreeMap::new();
        rows.insert(MonthKey::new(2024, 3), vec![1, 0]);
        let view = TrendView::new(vec!["theft".into(), "vandalism".into()], rows);

        assert_eq!(view.count(MonthKey::new(2024, 3), "theft"), 1);
        assert_eq!(view.count(MonthKey::new(2024, 3), "vandalism"), 0);
        assert_eq!(view.count(MonthKey::new(2024, 4), "theft"), 0);
        assert_eq!(view.count(MonthKey::new(2024, 3), "arson"), 0);
        assert_eq!(view.total(), 1);
    }

    #[test]
    fn trend_view_serializes_month_then_type() {
        let mut rows = BTreeMap::new();
        rows.insert(MonthKey::new(2024, 3), vec![1, 0]);
        let view = TrendView::new(vec!["theft".into(), "vandalism".into()], rows);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "2024-03": { "theft": 1, "vandalism": 0 } })
        );
    }

    #[test]
    fn pivot_reports_missing_pairs_as_null() {
        let mut cells = BTreeMap::new();
        cells.insert(("Library".into(), "theft".into()), cell(2.5, 2));
        cells.insert(("Cafeteria".into(), "fighting".into()), cell(4.0, 1));
        let pivot = SeverityPivot::new(cells);

        assert_eq!(pivot.locations(), ["Cafeteria", "Library"]);
        assert_eq!(pivot.incident_types(), ["fighting", "theft"]);
        assert_eq!(pivot.mean("Library", "fighting"), None);
        assert_eq!(
            pivot.grid(),
            vec![vec![Some(4.0), None], vec![None, Some(2.5)]]
        );

        let json = serde_json::to_value(&pivot).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Cafeteria": { "fighting": 4.0, "theft": null },
                "Library": { "fighting": null, "theft": 2.5 },
            })
        );
    }
}
