use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints open to any client. The storefront reads the same category listing the
/// admin surface does.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /api/categories
        // The full collection as a JSON array, ordered by id.
        .route("/api/categories", get(handlers::list_categories))
        // GET /api/categories/{id}
        .route("/api/categories/{id}", get(handlers::get_category))
}
