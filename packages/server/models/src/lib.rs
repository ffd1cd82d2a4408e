#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the campus safety server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the domain types so the API contract can evolve independently.

use campus_safety_incident_models::IncidentRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An incident as returned by `GET /api/incidents`.
///
/// Field names match the columns of the source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiIncident {
    /// Day the incident occurred (`YYYY-MM-DD`).
    pub date: NaiveDate,
    pub location: String,
    pub incident_type: String,
    /// Severity numeric value (1-5).
    pub severity: u8,
    pub lat: f64,
    pub lon: f64,
}

impl From<&IncidentRecord> for ApiIncident {
    fn from(record: &IncidentRecord) -> Self {
        Self {
            date: record.occurred_at,
            location: record.location.clone(),
            incident_type: record.incident_type.clone(),
            severity: record.severity.value(),
            lat: record.lat,
            lon: record.lon,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable error class, e.g. `artifact_not_found`.
    pub kind: String,
}

impl ApiError {
    #[must_use]
    pub fn new(kind: &str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            kind: kind.to_string(),
        }
    }
}

/// Response to `POST /api/analysis`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiJobAccepted {
    pub job_id: Uuid,
}

/// Query parameters for the hotspots endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotQueryParams {
    /// Length of the recent window in months.
    pub recent_months: Option<u32>,
    /// Maximum number of hotspots returned.
    pub limit: Option<usize>,
}

/// Query parameters for the personnel allocation endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationQueryParams {
    /// Security staff to distribute.
    pub personnel: u32,
    /// Length of the recent window in months.
    pub recent_months: Option<u32>,
}

#[cfg(test)]
mod tests {
    use campus_safety_incident_models::IncidentSeverity;

    use super::*;

    #[test]
    fn incident_uses_source_column_names() {
        let record = IncidentRecord {
            occurred_at: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            location: "Library".to_string(),
            incident_type: "theft".to_string(),
            severity: IncidentSeverity::Moderate,
            lat: 40.5,
            lon: -74.25,
        };
        let json = serde_json::to_value(ApiIncident::from(&record)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "date": "2024-03-15",
                "location": "Library",
                "incident_type": "theft",
                "severity": 3,
                "lat": 40.5,
                "lon": -74.25,
            })
        );
    }

    #[test]
    fn job_accepted_is_camel_case() {
        let json = serde_json::to_value(ApiJobAccepted { job_id: Uuid::nil() }).unwrap();
        assert_eq!(json["jobId"], "00000000-0000-0000-0000-000000000000");
    }
}
