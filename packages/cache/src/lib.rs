#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Named store for the most recently generated artifacts.
//!
//! Each artifact is held behind an [`Arc`]; [`ArtifactCache::put`] swaps the
//! pointer under a write lock, so readers always observe either the previous
//! complete artifact or the new one. There is no expiry: an artifact stays
//! until it is replaced or invalidated.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

/// Stacked bar chart of incidents per month and type.
pub const MONTHLY_TRENDS_PNG: &str = "monthly_trends.png";
/// Mean severity by location and type.
pub const SEVERITY_HEATMAP_PNG: &str = "severity_heatmap.png";
/// Ranked model feature importances.
pub const FEATURE_IMPORTANCE_PNG: &str = "feature_importance.png";
/// Interactive incident map.
pub const INCIDENT_MAP_HTML: &str = "incident_map.html";
/// Classification report and ranked features of the last training run.
pub const MODEL_REPORT_JSON: &str = "model_report.json";

/// Every artifact name an analysis run can produce.
pub const ARTIFACT_NAMES: [&str; 5] = [
    MONTHLY_TRENDS_PNG,
    SEVERITY_HEATMAP_PNG,
    FEATURE_IMPORTANCE_PNG,
    INCIDENT_MAP_HTML,
    MODEL_REPORT_JSON,
];

/// Errors from cache lookups and persistence.
#[derive(Debug, Error)]
pub enum CacheError {
    /// No artifact has been generated under this name yet.
    #[error("Artifact not found: {name}")]
    NotFound {
        /// Requested artifact name.
        name: String,
    },

    /// Reading or writing the artifact directory failed.
    #[error("Artifact I/O error at {}: {source}", path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Media type of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArtifactKind {
    Png,
    Html,
    Json,
}

impl ArtifactKind {
    /// HTTP `Content-Type` for this kind.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Html => "text/html; charset=utf-8",
            Self::Json => "application/json",
        }
    }

    /// Infers the kind from a file name's extension.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match Path::new(name).extension()?.to_str()? {
            "png" => Some(Self::Png),
            "html" => Some(Self::Html),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// A named, typed blob produced by a render step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub kind: ArtifactKind,
    pub bytes: Vec<u8>,
    pub generated_at: DateTime<Utc>,
}

impl Artifact {
    /// Creates an artifact stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ArtifactKind, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind,
            bytes,
            generated_at: Utc::now(),
        }
    }

    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        self.kind.content_type()
    }
}

/// Thread-safe map from artifact name to the latest artifact.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    entries: RwLock<BTreeMap<String, Arc<Artifact>>>,
}

impl ArtifactCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `artifact` under its name, replacing any previous one.
    pub fn put(&self, artifact: Artifact) {
        let name = artifact.name.clone();
        let size = artifact.bytes.len();
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), Arc::new(artifact));
        log::info!("Published artifact {name} ({size} bytes)");
    }

    /// Returns the current artifact named `name`.
    ///
    /// # Errors
    ///
    /// * [`CacheError::NotFound`] if nothing has been published under `name`
    pub fn get(&self, name: &str) -> Result<Arc<Artifact>, CacheError> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| CacheError::NotFound {
                name: name.to_string(),
            })
    }

    /// Removes the artifact named `name`. Returns whether one was present.
    pub fn invalidate(&self, name: &str) -> bool {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some();
        if removed {
            log::info!("Invalidated artifact {name}");
        }
        removed
    }

    /// Names of all published artifacts, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Writes every artifact to `dir/<name>`.
    ///
    /// Each file is written to a temporary sibling and renamed into place so
    /// a reader of `dir` never sees a partial file.
    ///
    /// # Errors
    ///
    /// * [`CacheError::Io`] if the directory cannot be created or a file
    ///   cannot be written
    pub fn persist(&self, dir: &Path) -> Result<usize, CacheError> {
        std::fs::create_dir_all(dir).map_err(|e| CacheError::io(dir, e))?;

        let snapshot: Vec<Arc<Artifact>> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for artifact in &snapshot {
            let target = dir.join(&artifact.name);
            let tmp = dir.join(format!(".{}.tmp", artifact.name));
            std::fs::write(&tmp, &artifact.bytes).map_err(|e| CacheError::io(&tmp, e))?;
            std::fs::rename(&tmp, &target).map_err(|e| CacheError::io(&target, e))?;
            log::debug!("Wrote {}", target.display());
        }

        log::info!(
            "Persisted {} artifact(s) to {}",
            snapshot.len(),
            dir.display()
        );
        Ok(snapshot.len())
    }

    /// Loads any known artifact files found in `dir`, stamped with their
    /// modification time. Returns how many were loaded.
    ///
    /// # Errors
    ///
    /// * [`CacheError::Io`] if a present artifact file cannot be read
    pub fn restore(&self, dir: &Path) -> Result<usize, CacheError> {
        let mut restored = 0;
        for name in ARTIFACT_NAMES {
            let path = dir.join(name);
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(CacheError::io(&path, e)),
            };
            let Some(kind) = ArtifactKind::from_name(name) else {
                continue;
            };
            let generated_at = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .map_or_else(|_| Utc::now(), DateTime::<Utc>::from);

            self.put(Artifact {
                name: name.to_string(),
                kind,
                bytes,
                generated_at,
            });
            restored += 1;
        }
        log::info!("Restored {restored} artifact(s) from {}", dir.display());
        Ok(restored)
    }
}
