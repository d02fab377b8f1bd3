pub mod auth;
pub mod error;
mod materials;
pub mod metrics;

pub use auth::{LoginRequest, LoginResponse};

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new().route("/login", post(auth::login));

    // Protected API routes
    let api_routes = Router::new()
        .route(
            "/materials",
            get(materials::list_materials).post(materials::create_material),
        )
        .route(
            "/materials/:id",
            get(materials::get_material)
                .put(materials::update_material)
                .delete(materials::delete_material),
        )
        .route("/materials/:id/quantity", patch(materials::adjust_quantity))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let mut router = Router::new().route("/health", get(health_check));

    // Only exposed when a recorder is installed; disabled metrics answer 404
    if state.metrics_handle.is_some() {
        router = router.route("/metrics", get(metrics::metrics_endpoint));
    }

    router
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .layer(middleware::from_fn(metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
