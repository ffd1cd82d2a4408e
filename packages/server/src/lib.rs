#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for campus safety analytics.
//!
//! Serves live JSON views computed from the incident table and the charts,
//! map and model report produced by analysis runs. Runs are started with
//! `POST /api/analysis` and execute on the blocking pool; artifacts from the
//! last run are restored from `data/generated` at startup.

mod config;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use campus_safety_cache::ArtifactCache;
use campus_safety_datastore::DataStore;
use campus_safety_generate::{AnalysisConfig, AnalysisJobs};
use campus_safety_render::{ChartRenderer, GeoRenderer, LeafletMapRenderer, RasterChartRenderer};

pub use config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Owner of the incident table.
    pub store: Arc<DataStore>,
    /// Artifacts from the most recent analysis runs.
    pub cache: Arc<ArtifactCache>,
    /// Background analysis runs.
    pub jobs: AnalysisJobs,
    pub config: Arc<AnalysisConfig>,
    pub charts: Arc<dyn ChartRenderer>,
    pub geo: Arc<dyn GeoRenderer>,
}

impl AppState {
    /// State with the default renderers and an empty cache.
    #[must_use]
    pub fn new(store: DataStore, config: AnalysisConfig) -> Self {
        let geo = LeafletMapRenderer::new(config.map.clone());
        Self {
            store: Arc::new(store),
            cache: Arc::new(ArtifactCache::new()),
            jobs: AnalysisJobs::new(),
            config: Arc::new(config),
            charts: Arc::new(RasterChartRenderer::default()),
            geo: Arc::new(geo),
        }
    }
}

/// Registers every `/api` route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/incidents", web::get().to(handlers::incidents))
            .route("/trends", web::get().to(handlers::trends))
            .route("/severity_pivot", web::get().to(handlers::pivot))
            .route("/stats", web::get().to(handlers::stats))
            .route("/hotspots", web::get().to(handlers::hotspots))
            .route("/allocation", web::get().to(handlers::allocation))
            .route("/heatmap", web::get().to(handlers::heatmap))
            .route(
                "/feature_importance",
                web::get().to(handlers::feature_importance),
            )
            .route("/incident_map", web::get().to(handlers::incident_map))
            .route(
                "/monthly_trends",
                web::get().to(handlers::monthly_trends_chart),
            )
            .route("/model_report", web::get().to(handlers::model_report))
            .route("/analysis", web::post().to(handlers::submit_analysis))
            .route("/analysis/{id}", web::get().to(handlers::analysis_status)),
    );
}

/// Starts the campus safety API server.
///
/// Reads the analysis config, loads the incident table, restores any
/// previously generated artifacts and starts the Actix-Web HTTP server.
/// The caller provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the config or incident table
/// cannot be loaded, or if the HTTP server fails to bind or encounters a
/// runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = AnalysisConfig::resolve(None).map_err(std::io::Error::other)?;

    log::info!(
        "Loading incident table from {}...",
        config.data.incidents_path.display()
    );
    let store = DataStore::open(&config.data.incidents_path, config.vocabulary.clone())
        .map_err(std::io::Error::other)?;

    let generated_dir = config.data.generated_dir.clone();
    let state = web::Data::new(AppState::new(store, config));

    if let Err(e) = state.cache.restore(&generated_dir) {
        log::warn!("Could not restore artifacts from {}: {e}", generated_dir.display());
    }

    let server = ServerConfig::from_env();
    log::info!("Starting server on {}:{}", server.bind_addr, server.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((server.bind_addr, server.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;
    use std::path::Path;
    use std::time::Duration;

    use actix_web::http::StatusCode;
    use actix_web::test;
    use campus_safety_cache::SEVERITY_HEATMAP_PNG;
    use campus_safety_datastore::VocabularyPolicy;

    use super::*;

    const HEADER: &str = "date,location,incident_type,severity,lat,lon\n";

    /// Severity depends only on the incident type.
    fn fixture_csv(n: usize) -> String {
        let locations = ["Cafeteria", "Library", "Parking Lot"];
        let types = [("fighting", 4), ("theft", 2), ("vandalism", 3)];
        let mut csv = HEADER.to_string();
        for i in 0..n {
            let (incident_type, severity) = types[(i / 3) % 3];
            writeln!(
                csv,
                "2024-{:02}-{:02},{},{incident_type},{severity},40.{i:03},-74.0",
                i % 12 + 1,
                i % 28 + 1,
                locations[i % 3],
            )
            .unwrap();
        }
        csv
    }

    fn state_for(dir: &Path, csv: &str) -> web::Data<AppState> {
        let incidents = dir.join("incidents.csv");
        std::fs::write(&incidents, csv).unwrap();

        let mut config = AnalysisConfig::default();
        config.data.incidents_path.clone_from(&incidents);
        config.data.generated_dir = dir.join("generated");
        config.predictor.tree_count = 10;

        let store = DataStore::open(&incidents, VocabularyPolicy::Open).unwrap();
        web::Data::new(AppState::new(store, config))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state.clone()).configure(configure)).await
        };
    }

    #[actix_web::test]
    async fn heatmap_is_not_found_until_generated() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path(), &fixture_csv(60));
        let app = app!(state);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/heatmap").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["kind"], "artifact_not_found");

        let table = state.store.snapshot().unwrap();
        campus_safety_generate::run_analysis(
            &table,
            &state.config,
            state.charts.as_ref(),
            state.geo.as_ref(),
            &state.cache,
        )
        .unwrap();

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/heatmap").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "image/png"
        );
        let body = test::read_body(resp).await;
        assert!(!body.is_empty());
        assert_eq!(&body[..4], b"\x89PNG");
    }

    #[actix_web::test]
    async fn trends_for_a_single_record() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(
            dir.path(),
            &format!("{HEADER}2024-03-15,Library,theft,2,40.1,-74.1\n"),
        );
        let app = app!(state);

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/trends").to_request(),
        )
        .await;
        assert_eq!(body, serde_json::json!({ "2024-03": { "theft": 1 } }));
    }

    #[actix_web::test]
    async fn incidents_use_source_columns() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path(), &fixture_csv(5));
        let app = app!(state);

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/incidents").to_request(),
        )
        .await;
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0]["date"], "2024-01-01");
        assert_eq!(rows[0]["location"], "Cafeteria");
        assert_eq!(rows[0]["severity"], 4);
    }

    #[actix_web::test]
    async fn missing_source_is_service_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path(), &fixture_csv(5));
        let app = app!(state);
        std::fs::remove_file(dir.path().join("incidents.csv")).unwrap();

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/stats").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["kind"], "data_unavailable");
    }

    #[actix_web::test]
    async fn analysis_job_generates_and_persists_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path(), &fixture_csv(90));
        let app = app!(state);

        let resp = test::call_service(&app, test::TestRequest::post().uri("/api/analysis").to_request()).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let accepted: serde_json::Value = test::read_body_json(resp).await;
        let job_id = accepted["jobId"].as_str().unwrap().to_string();

        let mut status = serde_json::Value::Null;
        for _ in 0..500 {
            status = test::call_and_read_body_json(
                &app,
                test::TestRequest::get()
                    .uri(&format!("/api/analysis/{job_id}"))
                    .to_request(),
            )
            .await;
            if status["status"] == "succeeded" || status["status"] == "failed" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(status["status"], "succeeded", "{status}");

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/model_report").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(dir.path().join("generated").join(SEVERITY_HEATMAP_PNG).exists());
    }

    #[actix_web::test]
    async fn unknown_job_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path(), &fixture_csv(5));
        let app = app!(state);

        for uri in ["/api/analysis/not-a-uuid", "/api/analysis/00000000-0000-0000-0000-000000000000"] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        }
    }

    #[actix_web::test]
    async fn allocation_spreads_personnel_over_hotspots() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path(), &fixture_csv(30));
        let app = app!(state);

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/allocation?personnel=7&recentMonths=2")
                .to_request(),
        )
        .await;
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        let total: u64 = rows.iter().map(|r| r["personnel"].as_u64().unwrap()).sum();
        assert_eq!(total, 7);
        assert!(rows[0]["riskScore"].as_u64().unwrap() >= rows[2]["riskScore"].as_u64().unwrap());

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/allocation").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn hotspots_respect_limit() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path(), &fixture_csv(30));
        let app = app!(state);

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/hotspots?recentMonths=2&limit=2")
                .to_request(),
        )
        .await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }
}
