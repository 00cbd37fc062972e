use crate::{
    AppState,
    auth::{AuthUser, Session},
    dashboard::{CategoriesPage, PageOutcome},
    error::{ApiError, RepositoryError},
    gateway::LocalGateway,
    models::{
        Category, CategoryPayload, DeletedResponse, ErrorBody, ImageUploadRequest,
        ImageUploadResponse,
    },
    storage,
    view::{self, CategoryRowView},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;

/// Where the dashboard returns to after a delete or a cancelled prompt.
pub const CATEGORIES_PAGE_PATH: &str = "/dashboard/categories";

// --- Catalog API ---

/// list_categories
///
/// [Public Route] The full category collection, ordered by id. No pagination.
#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "All categories", body = [Category]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.repo.list_categories().await?))
}

/// get_category
///
/// [Public Route] A single category, used by the edit surface.
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Category>, ApiError> {
    state
        .repo
        .get_category(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))
}

/// create_category
///
/// [Authenticated Route] Adds a category. `id` and `created_at` are assigned by the store.
#[utoipa::path(
    post,
    path = "/api/categories/new",
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 401, description = "No confirmed session", body = ErrorBody)
    )
)]
pub async fn create_category(
    AuthUser { email, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CategoryPayload>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let payload = payload.normalized().map_err(ApiError::Validation)?;
    let category = state.repo.create_category(payload).await?;
    tracing::info!(category_id = category.id, by = %email, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// update_category
///
/// [Authenticated Route] Replaces a category's name, image and parent.
#[utoipa::path(
    post,
    path = "/api/categories/edit/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    request_body = CategoryPayload,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn update_category(
    AuthUser { email, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryPayload>,
) -> Result<Json<Category>, ApiError> {
    let payload = payload.normalized().map_err(ApiError::Validation)?;
    let category = state.repo.update_category(id, payload).await?;
    tracing::info!(category_id = id, by = %email, "category updated");
    Ok(Json(category))
}

/// delete_category
///
/// [Authenticated Route] Deletes a category. Success bodies carry no `error` field;
/// every failure body does. Children of the deleted category become top-level.
#[utoipa::path(
    post,
    path = "/api/categories/delete/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Deleted", body = DeletedResponse),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_category(
    AuthUser { email, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse>, ApiError> {
    if state.repo.delete_category(id).await? {
        tracing::info!(category_id = id, by = %email, "category deleted");
        Ok(Json(DeletedResponse { deleted: id }))
    } else {
        Err(ApiError::Repository(RepositoryError::NotFound(id)))
    }
}

/// get_image_upload_url
///
/// [Authenticated Route] Signs a direct-to-storage upload for a category image.
#[utoipa::path(
    post,
    path = "/api/categories/upload",
    request_body = ImageUploadRequest,
    responses(
        (status = 200, description = "Upload URL", body = ImageUploadResponse),
        (status = 400, description = "Not an image", body = ErrorBody)
    )
)]
pub async fn get_image_upload_url(
    _user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ImageUploadRequest>,
) -> Result<Json<ImageUploadResponse>, ApiError> {
    if !payload.file_type.starts_with("image/") {
        return Err(ApiError::Validation(
            "Category images must have an image/* content type".to_string(),
        ));
    }

    let resource_key = storage::category_image_key(&payload.filename);
    let upload_url = state
        .storage
        .get_presigned_upload_url(&resource_key, &payload.file_type)
        .await?;

    Ok(Json(ImageUploadResponse {
        upload_url,
        resource_key,
    }))
}

// --- Dashboard Pages ---

fn page_for(state: &AppState, Session(user): Session) -> CategoriesPage {
    CategoriesPage::new(Arc::new(LocalGateway::new(state.repo.clone(), user)))
}

/// categories_page
///
/// Session guard, then the category table.
pub async fn categories_page(
    session: Session,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let page = page_for(&state, session);
    match page.activate().await {
        PageOutcome::Redirect(path) => Ok(Redirect::to(path).into_response()),
        PageOutcome::Render(view) => {
            let html = view::render_categories_page(&view.rows, view.notice.as_deref())?;
            Ok(Html(html).into_response())
        }
    }
}

/// delete_prompt
///
/// The confirmation prompt for deleting one category.
pub async fn delete_prompt(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let mut page = page_for(&state, session);
    let view = match page.activate().await {
        PageOutcome::Redirect(path) => return Ok(Redirect::to(path).into_response()),
        PageOutcome::Render(view) => view,
    };

    let Some(row) = view.rows.iter().find(|row| row.id == id) else {
        return Ok(Redirect::to(CATEGORIES_PAGE_PATH).into_response());
    };
    page.request_delete(id);
    render_prompt(row)
}

fn render_prompt(row: &CategoryRowView) -> Result<Response, ApiError> {
    Ok(Html(view::render_delete_prompt(row)?).into_response())
}

/// delete_confirm
///
/// Confirmation of the prompt: issues the delete, then returns to the table.
pub async fn delete_confirm(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let mut page = page_for(&state, session);
    if let PageOutcome::Redirect(path) = page.activate().await {
        return Ok(Redirect::to(path).into_response());
    }

    page.request_delete(id);
    if let Some(task) = page.confirm_delete() {
        match task.await {
            Ok(Ok(())) => {}
            // Already logged by the directory.
            Ok(Err(_)) => {}
            Err(e) => tracing::error!(category_id = id, "delete task failed: {}", e),
        }
    }
    Ok(Redirect::to(CATEGORIES_PAGE_PATH).into_response())
}
