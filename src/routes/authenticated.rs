use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Authenticated Router Module
///
/// Catalog mutations. Every route requires a confirmed user; failures answer
/// `401 {"error": "Unauthorized"}`.
///
/// All mutations are POSTs keyed by path, matching the contract existing dashboard
/// clients already speak.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /api/categories/new
        .route("/api/categories/new", post(handlers::create_category))
        // POST /api/categories/edit/{id}
        // Replaces name, image and parent. Parent changes may not create cycles.
        .route("/api/categories/edit/{id}", post(handlers::update_category))
        // POST /api/categories/delete/{id}
        // `{"deleted": id}` on success, `{"error": ...}` otherwise.
        .route("/api/categories/delete/{id}", post(handlers::delete_category))
        // POST /api/categories/upload
        // Presigned PUT URL for a category image (10 minute lifetime).
        .route("/api/categories/upload", post(handlers::get_image_upload_url))
}
