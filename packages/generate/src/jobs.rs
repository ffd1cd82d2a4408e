//! Background analysis runs.
//!
//! Runs are CPU bound, so each one goes to Tokio's blocking pool. Only one
//! run executes at a time; later submissions wait their turn in `Pending`.
//! A run that panics is reported as `Failed`. Only the most recent finished
//! records are retained.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinError;
use uuid::Uuid;

use crate::GenerateError;

/// Finished records kept by [`AnalysisJobs::new`].
pub const DEFAULT_RETAINED_JOBS: usize = 100;

/// Lifecycle of a submitted run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for an earlier run to finish.
    Pending,
    /// Executing on the blocking pool.
    Running,
    /// Finished without error.
    Succeeded {
        /// Artifacts published by the run.
        artifacts: Vec<String>,
    },
    /// Finished with an error or a panic.
    Failed {
        /// Error message of the run.
        error: String,
    },
}

impl JobStatus {
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}

/// A submitted run and its current status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Job id returned on submission.
    pub id: Uuid,
    /// Current status, flattened into the record.
    #[serde(flatten)]
    pub status: JobStatus,
    /// When the job was queued.
    pub submitted_at: DateTime<Utc>,
    /// When the job succeeded or failed.
    pub finished_at: Option<DateTime<Utc>>,
}

/// Registry of analysis runs executed off the request path.
#[derive(Debug, Clone)]
pub struct AnalysisJobs {
    jobs: Arc<RwLock<BTreeMap<Uuid, JobRecord>>>,
    run_lock: Arc<Mutex<()>>,
    retained: usize,
}

impl Default for AnalysisJobs {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETAINED_JOBS)
    }
}

impl AnalysisJobs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that keeps at most `retained` finished records; older
    /// ones are dropped as new runs finish. Pending and running jobs are
    /// never dropped.
    #[must_use]
    pub fn with_retention(retained: usize) -> Self {
        Self {
            jobs: Arc::default(),
            run_lock: Arc::default(),
            retained,
        }
    }

    /// Queues `run` on the blocking pool and returns its job id.
    ///
    /// # Panics
    ///
    /// * If called outside a Tokio runtime
    pub fn submit<F>(&self, run: F) -> Uuid
    where
        F: FnOnce() -> Result<Vec<String>, GenerateError> + Send + 'static,
    {
        let id = Uuid::new_v4();
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                JobRecord {
                    id,
                    status: JobStatus::Pending,
                    submitted_at: Utc::now(),
                    finished_at: None,
                },
            );
        log::info!("Queued analysis job {id}");

        let this = self.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _guard = this.run_lock.lock().unwrap_or_else(PoisonError::into_inner);
            this.set_status(id, JobStatus::Running);
            log::info!("Analysis job {id} started");
            run()
        });

        let this = self.clone();
        tokio::spawn(async move {
            let status = match handle.await {
                Ok(Ok(artifacts)) => {
                    log::info!("Analysis job {id} succeeded");
                    JobStatus::Succeeded { artifacts }
                }
                Ok(Err(e)) => {
                    log::error!("Analysis job {id} failed: {e}");
                    JobStatus::Failed {
                        error: e.to_string(),
                    }
                }
                Err(e) => {
                    let error = join_error_message(e);
                    log::error!("Analysis job {id} failed: {error}");
                    JobStatus::Failed { error }
                }
            };
            this.set_status(id, status);
        });

        id
    }

    /// Current record for `id`, if it was ever submitted.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<JobRecord> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    fn set_status(&self, id: Uuid, status: JobStatus) {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(record) = jobs.get_mut(&id) {
            if status.is_finished() {
                record.finished_at = Some(Utc::now());
            }
            record.status = status;
        }
        prune_finished(&mut jobs, self.retained);
    }
}

fn prune_finished(jobs: &mut BTreeMap<Uuid, JobRecord>, retained: usize) {
    let mut finished: Vec<(DateTime<Utc>, Uuid)> = jobs
        .values()
        .filter_map(|r| r.finished_at.map(|at| (at, r.id)))
        .collect();
    if finished.len() <= retained {
        return;
    }
    finished.sort_unstable();
    for (_, id) in &finished[..finished.len() - retained] {
        jobs.remove(id);
        log::debug!("Dropped finished analysis job {id}");
    }
}

fn join_error_message(e: JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }
    let payload = e.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .map_or_else(
            || "analysis run panicked".to_string(),
            |message| format!("analysis run panicked: {message}"),
        )
}
