//! Router assembly.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::auth::require_auth;
use crate::handlers;
use crate::state::AppState;

/// Build the service router.
///
/// `/export/*` routes sit behind [`require_auth`]; everything else is public.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = state.settings.cors_layer();

    let protected = Router::new()
        .route("/export/points", get(handlers::points::points_handler))
        .route_layer(middleware::from_fn(require_auth));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        .route("/mean", get(handlers::mean::mean_handler))
        .route("/auth/login", post(handlers::auth::login_handler))
        .merge(protected)
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
