use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Dashboard Router Module
///
/// HTML pages of the category admin. Visitors without a confirmed session are sent to
/// `/login`.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        // GET /dashboard/categories
        .route("/dashboard/categories", get(handlers::categories_page))
        // GET  /dashboard/categories/delete/{id}  -> confirmation prompt
        // POST /dashboard/categories/delete/{id}  -> confirmed delete, back to the table
        .route(
            "/dashboard/categories/delete/{id}",
            get(handlers::delete_prompt).post(handlers::delete_confirm),
        )
}
