#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Artifact generation for campus safety analytics.
//!
//! A run takes one shared [`IncidentTable`] snapshot, renders the trend
//! chart, severity heatmap and incident map, then trains the severity model
//! and renders its feature importances. Each artifact is published to the
//! [`ArtifactCache`] as soon as it is complete.

pub mod config;
pub mod jobs;

use campus_safety_analytics::{monthly_trends, severity_pivot};
use campus_safety_cache::{
    Artifact, ArtifactCache, ArtifactKind, CacheError, FEATURE_IMPORTANCE_PNG, INCIDENT_MAP_HTML,
    MODEL_REPORT_JSON, MONTHLY_TRENDS_PNG, SEVERITY_HEATMAP_PNG,
};
use campus_safety_datastore::DataStoreError;
use campus_safety_incident_models::IncidentTable;
use campus_safety_predictor::PredictorError;
use campus_safety_render::{ChartRenderer, GeoRenderer, RenderError};

pub use config::{AnalysisConfig, ConfigError};
pub use jobs::{AnalysisJobs, JobRecord, JobStatus};

/// Errors that can occur during an analysis run.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The incident table could not be loaded.
    #[error(transparent)]
    Data(#[from] DataStoreError),

    /// The config file could not be read.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A chart or map failed to render.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Model training or evaluation failed.
    #[error(transparent)]
    Predictor(#[from] PredictorError),

    /// The model report could not be serialised.
    #[error("Failed to serialise model report: {0}")]
    Json(#[from] serde_json::Error),

    /// Artifacts could not be persisted.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// One generation step. Steps always run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Trends,
    Heatmap,
    Map,
    Predict,
}

impl Step {
    /// Every step, in run order.
    pub const ALL: [Self; 4] = [Self::Trends, Self::Heatmap, Self::Map, Self::Predict];
}

/// Renders the monthly trends chart and publishes it.
///
/// # Errors
///
/// * If the chart fails to render
pub fn generate_trends(
    table: &IncidentTable,
    charts: &dyn ChartRenderer,
    cache: &ArtifactCache,
) -> Result<Vec<String>, GenerateError> {
    let png = charts.monthly_trends(&monthly_trends(table))?;
    cache.put(Artifact::new(MONTHLY_TRENDS_PNG, ArtifactKind::Png, png));
    Ok(vec![MONTHLY_TRENDS_PNG.to_string()])
}

/// Renders the severity heatmap and publishes it.
///
/// # Errors
///
/// * If the chart fails to render
pub fn generate_heatmap(
    table: &IncidentTable,
    charts: &dyn ChartRenderer,
    cache: &ArtifactCache,
) -> Result<Vec<String>, GenerateError> {
    let png = charts.severity_heatmap(&severity_pivot(table))?;
    cache.put(Artifact::new(SEVERITY_HEATMAP_PNG, ArtifactKind::Png, png));
    Ok(vec![SEVERITY_HEATMAP_PNG.to_string()])
}

/// Renders the incident map and publishes it.
///
/// # Errors
///
/// * If the map fails to render
pub fn generate_map(
    table: &IncidentTable,
    geo: &dyn GeoRenderer,
    cache: &ArtifactCache,
) -> Result<Vec<String>, GenerateError> {
    let html = geo.incident_map(table)?;
    cache.put(Artifact::new(
        INCIDENT_MAP_HTML,
        ArtifactKind::Html,
        html.into_bytes(),
    ));
    Ok(vec![INCIDENT_MAP_HTML.to_string()])
}

/// Trains the severity model, then publishes the importance chart and the
/// model report together. Nothing is published if training fails, so the
/// previous model artifacts stay in place.
///
/// # Errors
///
/// * If training fails, including [`PredictorError::InsufficientData`]
/// * If the chart fails to render or the report fails to serialise
pub fn generate_model(
    table: &IncidentTable,
    config: &AnalysisConfig,
    charts: &dyn ChartRenderer,
    cache: &ArtifactCache,
) -> Result<Vec<String>, GenerateError> {
    let result = campus_safety_predictor::train(table, &config.predictor).inspect_err(|e| {
        log::error!("Model training failed: {e}");
    })?;

    let png = charts.feature_importance(&result.top_features)?;
    let report = serde_json::to_vec_pretty(&result.summary())?;

    cache.put(Artifact::new(FEATURE_IMPORTANCE_PNG, ArtifactKind::Png, png));
    cache.put(Artifact::new(MODEL_REPORT_JSON, ArtifactKind::Json, report));

    for feature in &result.top_features {
        log::info!("  {:<40} {:.4}", feature.feature, feature.importance);
    }

    Ok(vec![
        FEATURE_IMPORTANCE_PNG.to_string(),
        MODEL_REPORT_JSON.to_string(),
    ])
}

/// Runs the given steps in run order against one table snapshot and
/// returns the names of the artifacts published.
///
/// Stops at the first failing step; artifacts from earlier steps stay
/// published.
///
/// # Errors
///
/// * If any step fails
pub fn run_steps(
    table: &IncidentTable,
    config: &AnalysisConfig,
    charts: &dyn ChartRenderer,
    geo: &dyn GeoRenderer,
    cache: &ArtifactCache,
    steps: &[Step],
) -> Result<Vec<String>, GenerateError> {
    let mut steps = steps.to_vec();
    steps.sort_unstable();
    steps.dedup();

    let mut published = Vec::new();
    for step in steps {
        log::info!("Running {step:?} step on {} incidents", table.len());
        let names = match step {
            Step::Trends => generate_trends(table, charts, cache)?,
            Step::Heatmap => generate_heatmap(table, charts, cache)?,
            Step::Map => generate_map(table, geo, cache)?,
            Step::Predict => generate_model(table, config, charts, cache)?,
        };
        published.extend(names);
    }
    Ok(published)
}

/// One full generation run.
///
/// # Errors
///
/// * If any step fails; see [`run_steps`]
pub fn run_analysis(
    table: &IncidentTable,
    config: &AnalysisConfig,
    charts: &dyn ChartRenderer,
    geo: &dyn GeoRenderer,
    cache: &ArtifactCache,
) -> Result<Vec<String>, GenerateError> {
    let published = run_steps(table, config, charts, geo, cache, &Step::ALL)?;
    log::info!("Analysis run published {} artifacts", published.len());
    Ok(published)
}
