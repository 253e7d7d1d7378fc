//! HTTP API for health status, reports and Prometheus metrics

use crate::runner::LatestReport;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use monitor_lib::MonitorEngine;
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MonitorEngine>,
    pub latest: LatestReport,
}

impl AppState {
    pub fn new(engine: Arc<MonitorEngine>, latest: LatestReport) -> Self {
        Self { engine, latest }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AssessParams {
    /// Include log error rate and resource pressure
    #[serde(default)]
    pub signals: bool,
}

/// Liveness: the process is up and serving
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// Readiness: at least one background assessment has completed
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let ready = state.latest.read().await.is_some();
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(json!({ "ready": ready })))
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.engine.quick_status().await)
}

async fn assessment(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AssessParams>,
) -> impl IntoResponse {
    Json(state.engine.assess(params.signals).await)
}

async fn report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AssessParams>,
) -> impl IntoResponse {
    Json(state.engine.report(params.signals).await)
}

/// Report from the last background cycle, without probing again
async fn latest_report(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.latest.read().await.clone() {
        Some(report) => (StatusCode::OK, Json(json!(report))),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "no assessment has completed yet" })),
        ),
    }
}

async fn targets(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.engine.config().targets.clone())
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/status", get(status))
        .route("/assessment", get(assessment))
        .route("/report", get(report))
        .route("/report/latest", get(latest_report))
        .route("/targets", get(targets))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::AssessmentLoop;
    use crate::testing::{engine_with_down, test_engine};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state(engine: Arc<MonitorEngine>) -> Arc<AppState> {
        Arc::new(AppState::new(engine, LatestReport::default()))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_healthz_endpoint() {
        let (status, body) = get_json(create_router(state(test_engine())), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_readyz_waits_for_first_assessment() {
        let state = state(test_engine());

        let (status, _) = get_json(create_router(state.clone()), "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        AssessmentLoop::new(
            state.engine.clone(),
            state.latest.clone(),
            Duration::from_secs(30),
            false,
        )
        .run_once()
        .await;

        let (status, body) = get_json(create_router(state), "/readyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let engine = engine_with_down(&["http://loki/ready", "http://grafana/api/health"]);
        let (status, body) = get_json(create_router(state(engine)), "/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["services_available"], 2);
        assert_eq!(body["services_total"], 4);
        assert_eq!(body["label"], "PARTIAL");
    }

    #[tokio::test]
    async fn test_assessment_endpoint() {
        let engine = engine_with_down(&["http://app/health"]);
        let (status, body) =
            get_json(create_router(state(engine)), "/assessment?signals=false").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 75);
        assert_eq!(body["level"], "GOOD");
        assert_eq!(
            body["contributing_factors"][0]["factor_name"],
            "unavailable_services"
        );
    }

    #[tokio::test]
    async fn test_report_endpoint() {
        let (status, body) = get_json(create_router(state(test_engine())), "/report").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["assessment"]["score"], 100);
        assert_eq!(body["recommendations"][0]["text"], "continue monitoring");
        assert_eq!(body["probes"]["results"].as_array().map(Vec::len), Some(5));
    }

    #[tokio::test]
    async fn test_latest_report_before_first_cycle() {
        let (status, body) =
            get_json(create_router(state(test_engine())), "/report/latest").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_targets_endpoint() {
        let (status, body) = get_json(create_router(state(test_engine())), "/targets").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[4]["kind"], "container_group");
        assert_eq!(body[4]["expected"], 4);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let state = state(test_engine());
        state.engine.assess(false).await;

        let response = create_router(state)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("stackmon_health_score"));
    }
}
