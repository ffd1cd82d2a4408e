#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Campus incident record types and severity definitions.
//!
//! This crate defines the single record shape that every other part of
//! the campus-safety system works with. Records are produced in bulk by
//! the datastore and are immutable afterwards: an [`IncidentTable`] only
//! exposes read access to its rows.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Severity level for an incident, from 1 (minimal) to 5 (critical).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentSeverity {
    /// Level 1: Nuisance reports with no harm or loss
    Minimal = 1,
    /// Level 2: Minor loss or damage
    Low = 2,
    /// Level 3: Moderate harm, loss, or disruption
    Moderate = 3,
    /// Level 4: Serious harm or significant loss
    High = 4,
    /// Level 5: Most severe incidents
    Critical = 5,
}

impl IncidentSeverity {
    /// Number of distinct severity levels.
    pub const COUNT: usize = 5;

    /// Returns the numeric value of this severity level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Returns the zero-based class index (`Minimal` is 0).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize - 1
    }

    /// Creates a severity level from a numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-5.
    pub const fn from_value(value: u8) -> Result<Self, InvalidSeverityError> {
        match value {
            1 => Ok(Self::Minimal),
            2 => Ok(Self::Low),
            3 => Ok(Self::Moderate),
            4 => Ok(Self::High),
            5 => Ok(Self::Critical),
            _ => Err(InvalidSeverityError { value }),
        }
    }

    /// Creates a severity level from a zero-based class index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Minimal),
            1 => Some(Self::Low),
            2 => Some(Self::Moderate),
            3 => Some(Self::High),
            4 => Some(Self::Critical),
            _ => None,
        }
    }

    /// Returns all variants of this enum, least severe first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Minimal,
            Self::Low,
            Self::Moderate,
            Self::High,
            Self::Critical,
        ]
    }
}

/// Error returned when attempting to create an [`IncidentSeverity`] from an
/// invalid numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSeverityError {
    /// The invalid severity value that was provided.
    pub value: u8,
}

impl std::fmt::Display for InvalidSeverityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid severity value {}: expected 1-5", self.value)
    }
}

impl std::error::Error for InvalidSeverityError {}

/// One reported campus incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Day the incident occurred.
    pub occurred_at: NaiveDate,
    /// Campus place label (e.g. `Library`).
    pub location: String,
    /// Incident type label (e.g. `theft`).
    pub incident_type: String,
    /// Severity level.
    pub severity: IncidentSeverity,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

/// The full ordered collection of incidents for one analysis run.
///
/// Rows keep the order they had in the source table. There is no mutable
/// access once the table has been built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentTable {
    records: Vec<IncidentRecord>,
}

impl IncidentTable {
    /// Builds a table from records in source order.
    #[must_use]
    pub const fn new(records: Vec<IncidentRecord>) -> Self {
        Self { records }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read-only view of all records.
    #[must_use]
    pub fn records(&self) -> &[IncidentRecord] {
        &self.records
    }

    /// Iterates over the records in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, IncidentRecord> {
        self.records.iter()
    }

    /// Returns the latest `occurred_at` in the table.
    #[must_use]
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.occurred_at).max()
    }

    /// Distinct location labels, sorted.
    #[must_use]
    pub fn locations(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.location.as_str()).collect()
    }

    /// Distinct incident type labels, sorted.
    #[must_use]
    pub fn incident_types(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .map(|r| r.incident_type.as_str())
            .collect()
    }
}

impl FromIterator<IncidentRecord> for IncidentTable {
    fn from_iter<T: IntoIterator<Item = IncidentRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a IncidentTable {
    type Item = &'a IncidentRecord;
    type IntoIter = std::slice::Iter<'a, IncidentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
