//! Prometheus metrics endpoint and HTTP request tracking middleware.

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;

use super::error::ApiError;
use crate::AppState;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const MATERIAL_MUTATIONS_TOTAL: &str = "material_mutations_total";
pub const MATERIALS_TOTAL: &str = "materials_total";

/// Install the global Prometheus recorder. Call once at startup.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(HTTP_REQUESTS_TOTAL, "Total number of HTTP requests received");
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_counter!(
        MATERIAL_MUTATIONS_TOTAL,
        "Material writes by operation (create/update/adjust_quantity/delete)"
    );
    describe_gauge!(MATERIALS_TOTAL, "Number of materials currently held");

    Ok(handle)
}

/// GET /metrics - Prometheus text format, no authentication.
pub async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> Response {
    gauge!(MATERIALS_TOTAL).set(state.inventory.len() as f64);

    match state.metrics_handle.as_ref() {
        Some(h) => (StatusCode::OK, h.render()).into_response(),
        None => ApiError::not_found("Metrics are disabled").into_response(),
    }
}

/// Records request count and duration per method, matched path and status.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();

    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let method = request.method().to_string();

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "path" => path).record(duration);

    response
}

pub fn record_material_mutation(operation: &'static str) {
    counter!(MATERIAL_MUTATIONS_TOTAL, "operation" => operation).increment(1);
}
