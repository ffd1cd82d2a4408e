#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading and validation of the campus incident table.
//!
//! [`load`] reads the CSV source in full and validates every row; a single
//! bad row fails the whole load. [`DataStore`] owns the loaded table and
//! only re-reads the source when the file's modification time changes, so
//! request handlers can share one immutable snapshot.

pub mod parsing;
pub mod paths;
pub mod vocabulary;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use campus_safety_incident_models::{IncidentRecord, IncidentTable};

pub use vocabulary::VocabularyPolicy;

/// Columns every source table must carry.
pub const REQUIRED_COLUMNS: [&str; 6] = ["date", "location", "incident_type", "severity", "lat", "lon"];

/// Errors that can occur while loading the incident table.
#[derive(Debug, thiserror::Error)]
pub enum DataStoreError {
    /// The source file is missing or unreadable.
    #[error("Incident data unavailable at {}: {source}", path.display())]
    DataUnavailable {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// A row violates the record invariants.
    #[error("Schema error at row {row}, column '{field}' (value '{value}'): {message}")]
    Schema {
        /// 1-based data row, not counting the header; 0 for a header problem.
        row: u64,
        /// Offending column name.
        field: String,
        /// Raw value that failed validation.
        value: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The source is not well-formed CSV.
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl DataStoreError {
    /// Whether the error describes bad data rather than a missing source.
    #[must_use]
    pub const fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. } | Self::Csv(_))
    }

    fn schema(row: u64, field: &str, value: &str, message: impl Into<String>) -> Self {
        Self::Schema {
            row,
            field: field.to_string(),
            value: value.to_string(),
            message: message.into(),
        }
    }
}

/// Loads and validates the incident table at `path`.
///
/// Each call re-reads the source. Callers that derive several views from
/// the same data should load once and share the table.
///
/// # Errors
///
/// * [`DataStoreError::DataUnavailable`] if the file cannot be opened
/// * [`DataStoreError::Schema`] if any row fails validation
/// * [`DataStoreError::Csv`] if the file is not well-formed CSV
pub fn load(path: &Path, policy: &VocabularyPolicy) -> Result<IncidentTable, DataStoreError> {
    let file = std::fs::File::open(path).map_err(|source| DataStoreError::DataUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    let table = load_from_reader(file, policy)?;
    log::info!("Loaded {} incidents from {}", table.len(), path.display());
    Ok(table)
}

/// Loads and validates an incident table from any CSV reader.
///
/// # Errors
///
/// * [`DataStoreError::Schema`] if a required column is missing or any row
///   fails validation
/// * [`DataStoreError::Csv`] if the input is not well-formed CSV
pub fn load_from_reader<R: Read>(
    reader: R,
    policy: &VocabularyPolicy,
) -> Result<IncidentTable, DataStoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let mut columns = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, name) in columns.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataStoreError::schema(0, name, "", "missing required column"))?;
    }
    let [date_col, location_col, type_col, severity_col, lat_col, lon_col] = columns;

    let mut records = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i as u64 + 1;
        let field = |col: usize| record.get(col).unwrap_or("");

        let raw = field(date_col);
        let occurred_at = parsing::parse_incident_date(raw).ok_or_else(|| {
            DataStoreError::schema(row, "date", raw, "expected a calendar date (YYYY-MM-DD)")
        })?;

        let raw = field(location_col);
        let location = parsing::parse_label(raw)
            .ok_or_else(|| DataStoreError::schema(row, "location", raw, "empty label"))?;
        if !policy.allows_location(location) {
            return Err(DataStoreError::schema(
                row,
                "location",
                raw,
                "not in the configured location vocabulary",
            ));
        }

        let raw = field(type_col);
        let incident_type = parsing::parse_label(raw)
            .ok_or_else(|| DataStoreError::schema(row, "incident_type", raw, "empty label"))?;
        if !policy.allows_incident_type(incident_type) {
            return Err(DataStoreError::schema(
                row,
                "incident_type",
                raw,
                "not in the configured incident type vocabulary",
            ));
        }

        let raw = field(severity_col);
        let severity = parsing::parse_severity(raw).ok_or_else(|| {
            DataStoreError::schema(row, "severity", raw, "expected an integer in 1-5")
        })?;

        let raw = field(lat_col);
        let lat = parsing::parse_coordinate(raw)
            .ok_or_else(|| DataStoreError::schema(row, "lat", raw, "expected a number"))?;

        let raw = field(lon_col);
        let lon = parsing::parse_coordinate(raw)
            .ok_or_else(|| DataStoreError::schema(row, "lon", raw, "expected a number"))?;

        records.push(IncidentRecord {
            occurred_at,
            location: location.to_string(),
            incident_type: incident_type.to_string(),
            severity,
            lat,
            lon,
        });
    }

    Ok(IncidentTable::new(records))
}

struct Snapshot {
    table: Arc<IncidentTable>,
    modified: Option<SystemTime>,
}

/// Owner of the loaded incident table.
///
/// Built once with [`DataStore::open`]. [`DataStore::snapshot`] hands out
/// the current immutable table and re-reads the source only when its
/// modification time differs from the one seen at the last load. A failed
/// reload keeps the previous table in place.
pub struct DataStore {
    path: PathBuf,
    policy: VocabularyPolicy,
    state: RwLock<Snapshot>,
}

impl DataStore {
    /// Loads the table at `path` and takes ownership of it.
    ///
    /// # Errors
    ///
    /// Returns [`DataStoreError`] if the initial load fails.
    pub fn open(path: impl Into<PathBuf>, policy: VocabularyPolicy) -> Result<Self, DataStoreError> {
        let path = path.into();
        let modified = modified_time(&path)?;
        let table = load(&path, &policy)?;

        Ok(Self {
            path,
            policy,
            state: RwLock::new(Snapshot {
                table: Arc::new(table),
                modified,
            }),
        })
    }

    /// Path of the backing source.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the last loaded table without checking the source.
    #[must_use]
    pub fn current(&self) -> Arc<IncidentTable> {
        Arc::clone(
            &self
                .state
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .table,
        )
    }

    /// Returns the current table, reloading first if the source's
    /// modification time has changed since the last load.
    ///
    /// # Errors
    ///
    /// Returns [`DataStoreError`] if the source has disappeared or the
    /// reload fails validation.
    pub fn snapshot(&self) -> Result<Arc<IncidentTable>, DataStoreError> {
        let modified = modified_time(&self.path)?;
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if modified.is_some() && state.modified == modified {
                return Ok(Arc::clone(&state.table));
            }
        }
        log::info!("{} changed on disk, reloading", self.path.display());
        self.reload(modified)
    }

    /// Unconditionally re-reads the source.
    ///
    /// # Errors
    ///
    /// Returns [`DataStoreError`] if the reload fails. The previous table
    /// stays in place.
    pub fn refresh(&self) -> Result<Arc<IncidentTable>, DataStoreError> {
        let modified = modified_time(&self.path)?;
        self.reload(modified)
    }

    fn reload(&self, modified: Option<SystemTime>) -> Result<Arc<IncidentTable>, DataStoreError> {
        let table = Arc::new(load(&self.path, &self.policy).inspect_err(|e| {
            log::error!("Failed to reload {}: {e}", self.path.display());
        })?);

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = Snapshot {
            table: Arc::clone(&table),
            modified,
        };
        drop(state);

        Ok(table)
    }
}

/// Returns the file's modification time, or `None` if the platform does
/// not report one.
fn modified_time(path: &Path) -> Result<Option<SystemTime>, DataStoreError> {
    let meta = std::fs::metadata(path).map_err(|source| DataStoreError::DataUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(meta.modified().ok())
}
