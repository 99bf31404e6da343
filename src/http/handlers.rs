use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::client::DatabaseStatus;
use crate::http::response::{timestamp, ApiError, ApiResponse};
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub environment: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub database: DatabaseStatus,
}

pub async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Gas Price Predictor API is running",
        environment: state.config.environment.as_str(),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: timestamp(),
    })
}

/// Liveness plus database connectivity. 503 while the database is unusable.
pub async fn health(State(state): State<AppState>, OriginalUri(uri): OriginalUri) -> Response {
    let (healthy, database) = match &state.database {
        Some(db) => (db.check_health().await, db.status()),
        None => (false, DatabaseStatus::unconfigured()),
    };

    let report = HealthReport {
        status: if healthy { "ok" } else { "degraded" },
        uptime_secs: state.started.elapsed().as_secs(),
        database,
    };

    let mut body = ApiResponse::ok(report).at(uri.path());
    body.success = healthy;
    if healthy {
        body.respond(StatusCode::OK)
    } else {
        body.with_message("Database unavailable")
            .respond(StatusCode::SERVICE_UNAVAILABLE)
    }
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    ApiError::not_found("Route not found").at(uri.path())
}
