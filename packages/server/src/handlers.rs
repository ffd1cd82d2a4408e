//! HTTP handler functions for the campus safety API.
//!
//! JSON views are computed from the current table snapshot on every call.
//! Taking the snapshot may re-read the source file, so it runs on the
//! blocking pool. Artifact endpoints only read the cache; generation happens
//! through `POST /api/analysis`.

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use campus_safety_analytics::{
    DEFAULT_RECENT_MONTHS, allocate_personnel, hotspots as rank_hotspots, incident_stats,
    monthly_trends, severity_pivot,
};
use campus_safety_cache::{
    CacheError, FEATURE_IMPORTANCE_PNG, INCIDENT_MAP_HTML, MODEL_REPORT_JSON, MONTHLY_TRENDS_PNG,
    SEVERITY_HEATMAP_PNG,
};
use campus_safety_datastore::DataStoreError;
use campus_safety_incident_models::IncidentTable;
use campus_safety_server_models::{
    AllocationQueryParams, ApiError, ApiHealth, ApiIncident, ApiJobAccepted, HotspotQueryParams,
};
use uuid::Uuid;

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/incidents`
pub async fn incidents(state: web::Data<AppState>) -> HttpResponse {
    with_table(&state, |table| {
        let api_incidents: Vec<ApiIncident> = table.iter().map(ApiIncident::from).collect();
        HttpResponse::Ok().json(api_incidents)
    })
    .await
}

/// `GET /api/trends`
///
/// Month → incident type → count.
pub async fn trends(state: web::Data<AppState>) -> HttpResponse {
    with_table(&state, |table| HttpResponse::Ok().json(monthly_trends(table))).await
}

/// `GET /api/severity_pivot`
///
/// Location → incident type → mean severity, `null` where never observed.
pub async fn pivot(state: web::Data<AppState>) -> HttpResponse {
    with_table(&state, |table| HttpResponse::Ok().json(severity_pivot(table))).await
}

/// `GET /api/stats`
pub async fn stats(state: web::Data<AppState>) -> HttpResponse {
    with_table(&state, |table| HttpResponse::Ok().json(incident_stats(table))).await
}

/// `GET /api/hotspots`
pub async fn hotspots(
    state: web::Data<AppState>,
    params: web::Query<HotspotQueryParams>,
) -> HttpResponse {
    let recent_months = params.recent_months.unwrap_or(DEFAULT_RECENT_MONTHS);
    with_table(&state, |table| {
        let mut ranked = rank_hotspots(table, recent_months);
        if let Some(limit) = params.limit {
            ranked.truncate(limit);
        }
        HttpResponse::Ok().json(ranked)
    })
    .await
}

/// `GET /api/allocation?personnel=N`
///
/// Splits `personnel` security staff across the current hotspots by risk.
pub async fn allocation(
    state: web::Data<AppState>,
    params: web::Query<AllocationQueryParams>,
) -> HttpResponse {
    let recent_months = params.recent_months.unwrap_or(DEFAULT_RECENT_MONTHS);
    with_table(&state, |table| {
        let ranked = rank_hotspots(table, recent_months);
        HttpResponse::Ok().json(allocate_personnel(&ranked, params.personnel))
    })
    .await
}

/// `GET /api/heatmap`
pub async fn heatmap(state: web::Data<AppState>) -> HttpResponse {
    artifact(&state, SEVERITY_HEATMAP_PNG)
}

/// `GET /api/feature_importance`
pub async fn feature_importance(state: web::Data<AppState>) -> HttpResponse {
    artifact(&state, FEATURE_IMPORTANCE_PNG)
}

/// `GET /api/incident_map`
pub async fn incident_map(state: web::Data<AppState>) -> HttpResponse {
    artifact(&state, INCIDENT_MAP_HTML)
}

/// `GET /api/monthly_trends`
pub async fn monthly_trends_chart(state: web::Data<AppState>) -> HttpResponse {
    artifact(&state, MONTHLY_TRENDS_PNG)
}

/// `GET /api/model_report`
pub async fn model_report(state: web::Data<AppState>) -> HttpResponse {
    artifact(&state, MODEL_REPORT_JSON)
}

/// `POST /api/analysis`
///
/// Queues a generation run against the current snapshot and returns its
/// job id immediately.
pub async fn submit_analysis(state: web::Data<AppState>) -> HttpResponse {
    let table = match snapshot(&state).await {
        Ok(table) => table,
        Err(response) => return response,
    };

    let config = Arc::clone(&state.config);
    let charts = Arc::clone(&state.charts);
    let geo = Arc::clone(&state.geo);
    let cache = Arc::clone(&state.cache);

    let job_id = state.jobs.submit(move || {
        let result = campus_safety_generate::run_analysis(
            &table,
            &config,
            charts.as_ref(),
            geo.as_ref(),
            &cache,
        );
        cache.persist(&config.data.generated_dir)?;
        result
    });

    HttpResponse::Accepted().json(ApiJobAccepted { job_id })
}

/// `GET /api/analysis/{id}`
pub async fn analysis_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let record = Uuid::parse_str(&path).ok().and_then(|id| state.jobs.get(id));
    record.map_or_else(
        || {
            HttpResponse::NotFound().json(ApiError::new(
                "job_not_found",
                format!("Unknown analysis job: {path}"),
            ))
        },
        |record| HttpResponse::Ok().json(record),
    )
}

async fn snapshot(state: &AppState) -> Result<Arc<IncidentTable>, HttpResponse> {
    let store = Arc::clone(&state.store);
    match web::block(move || store.snapshot()).await {
        Ok(Ok(table)) => Ok(table),
        Ok(Err(e)) => Err(data_error(&e)),
        Err(e) => {
            log::error!("Failed to take incident snapshot: {e}");
            Err(HttpResponse::InternalServerError().json(ApiError::new("internal", e.to_string())))
        }
    }
}

async fn with_table(
    state: &AppState,
    respond: impl FnOnce(&IncidentTable) -> HttpResponse,
) -> HttpResponse {
    match snapshot(state).await {
        Ok(table) => respond(&table),
        Err(response) => response,
    }
}

fn artifact(state: &AppState, name: &str) -> HttpResponse {
    match state.cache.get(name) {
        Ok(artifact) => HttpResponse::Ok()
            .content_type(artifact.content_type())
            .body(artifact.bytes.clone()),
        Err(e @ CacheError::NotFound { .. }) => {
            log::warn!("{e}");
            HttpResponse::NotFound().json(ApiError::new("artifact_not_found", e.to_string()))
        }
        Err(e) => {
            log::error!("Failed to read artifact {name}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("cache", e.to_string()))
        }
    }
}

fn data_error(e: &DataStoreError) -> HttpResponse {
    log::error!("Failed to load incident data: {e}");
    match e {
        DataStoreError::DataUnavailable { .. } => HttpResponse::ServiceUnavailable()
            .json(ApiError::new("data_unavailable", e.to_string())),
        DataStoreError::Schema { .. } => {
            HttpResponse::InternalServerError().json(ApiError::new("schema", e.to_string()))
        }
        DataStoreError::Csv(_) => HttpResponse::InternalServerError()
            .json(ApiError::new("malformed_csv", e.to_string())),
    }
}
