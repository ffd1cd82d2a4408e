//! Location risk ranking.
//!
//! A location's risk score weights incidents inside a recent window twice
//! as heavily as older ones. The window ends at the table's latest incident
//! date rather than the wall clock, so the ranking depends only on the data.

use std::collections::BTreeMap;

use campus_safety_analytics_models::Hotspot;
use campus_safety_incident_models::IncidentTable;
use chrono::{Months, NaiveDate};

/// Length of the recent window used by the API.
pub const DEFAULT_RECENT_MONTHS: u32 = 3;

/// Ranks locations by `recent * 2 + total`, highest first. Ties are broken
/// by location name.
#[must_use]
pub fn hotspots(table: &IncidentTable, recent_months: u32) -> Vec<Hotspot> {
    let Some(latest) = table.latest_date() else {
        return Vec::new();
    };
    let window_start = latest
        .checked_sub_months(Months::new(recent_months))
        .unwrap_or(NaiveDate::MIN);

    let mut counts: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for record in table {
        let entry = counts.entry(record.location.as_str()).or_default();
        entry.0 += 1;
        if record.occurred_at >= window_start {
            entry.1 += 1;
        }
    }

    let mut ranked: Vec<Hotspot> = counts
        .into_iter()
        .map(|(location, (total, recent))| Hotspot {
            location: location.to_string(),
            incident_count: total,
            recent_count: recent,
            risk_score: recent * 2 + total,
        })
        .collect();

    // Stable sort keeps the alphabetical order from the map for ties.
    ranked.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    ranked
}
