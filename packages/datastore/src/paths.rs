#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the data directory.
//!
//! All paths are relative to the working directory the binaries are
//! started from.

use std::path::PathBuf;

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Returns the default location of the incident table.
#[must_use]
pub fn default_incidents_path() -> PathBuf {
    data_dir().join("campus_incidents.csv")
}

/// Returns the `data/generated/` directory for output artifacts.
#[must_use]
pub fn generated_dir() -> PathBuf {
    data_dir().join("generated")
}
