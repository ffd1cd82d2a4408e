#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rendering of analysis outputs into servable artifacts.
//!
//! The pipeline only depends on the [`ChartRenderer`] and [`GeoRenderer`]
//! traits. [`RasterChartRenderer`] draws plain PNG charts and
//! [`LeafletMapRenderer`] emits a self-contained Leaflet page.

mod canvas;
pub mod chart;
pub mod map;
pub mod palette;

use campus_safety_analytics_models::{SeverityPivot, TrendView};
use campus_safety_incident_models::IncidentTable;
use campus_safety_predictor::RankedFeature;
use thiserror::Error;

pub use chart::RasterChartRenderer;
pub use map::{LeafletMapRenderer, MapStyle};

/// Errors raised while producing an artifact.
#[derive(Debug, Error)]
pub enum RenderError {
    /// PNG encoding failed.
    #[error("Image encoding error: {0}")]
    Encode(#[from] image::ImageError),

    /// Marker data could not be serialised into the map page.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Turns aggregation and model outputs into PNG charts.
pub trait ChartRenderer: Send + Sync {
    /// Stacked bar chart, one bar per month, one segment per incident type.
    ///
    /// # Errors
    ///
    /// * If the image fails to encode
    fn monthly_trends(&self, view: &TrendView) -> Result<Vec<u8>, RenderError>;

    /// Location by incident type grid coloured by mean severity.
    ///
    /// # Errors
    ///
    /// * If the image fails to encode
    fn severity_heatmap(&self, pivot: &SeverityPivot) -> Result<Vec<u8>, RenderError>;

    /// Horizontal bars for the ranked features, most important on top.
    ///
    /// # Errors
    ///
    /// * If the image fails to encode
    fn feature_importance(&self, features: &[RankedFeature]) -> Result<Vec<u8>, RenderError>;
}

/// Turns incident records into an HTML map document.
pub trait GeoRenderer: Send + Sync {
    /// One marker per record.
    ///
    /// # Errors
    ///
    /// * If the marker data fails to serialise
    fn incident_map(&self, table: &IncidentTable) -> Result<String, RenderError>;
}
