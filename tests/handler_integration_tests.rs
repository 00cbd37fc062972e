use async_trait::async_trait;
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use catalog_admin::{
    AppState,
    auth::{AuthUser, Session},
    config::AppConfig,
    error::IdentityError,
    handlers,
    identity::IdentityProvider,
    models::{CategoryPayload, ErrorBody, ImageUploadRequest, ImageUploadResponse, SessionUser},
    repository::{InMemoryRepository, Repository},
    storage::MockStorageService,
};
use std::sync::Arc;
use tokio::test;
use uuid::Uuid;

// --- MOCK IDENTITY ---

struct NoIdentity;

#[async_trait]
impl IdentityProvider for NoIdentity {
    async fn get_user(&self, _access_token: &str) -> Result<Option<SessionUser>, IdentityError> {
        Ok(None)
    }
}

// --- TEST UTILITIES ---

fn seeded_repo() -> Arc<InMemoryRepository> {
    Arc::new(InMemoryRepository::with_categories(vec![
        CategoryPayload {
            name: "Shoes".to_string(),
            image: "/a.png".to_string(),
            parent_id: None,
        },
        CategoryPayload {
            name: "Boots".to_string(),
            image: "/b.png".to_string(),
            parent_id: Some(1),
        },
    ]))
}

fn create_test_state(repo: Arc<InMemoryRepository>, storage: MockStorageService) -> AppState {
    AppState {
        repo,
        storage: Arc::new(storage),
        identity: Arc::new(NoIdentity),
        config: AppConfig::default(),
    }
}

fn admin_user() -> AuthUser {
    AuthUser {
        id: Uuid::from_u128(456),
        email: "admin@shop.test".to_string(),
    }
}

fn confirmed_session() -> Session {
    Session(Some(SessionUser {
        email: Some("admin@shop.test".to_string()),
        confirmed_at: Some("2024-01-01T00:00:00Z".to_string()),
    }))
}

async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let (_parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: Response) -> String {
    let (_parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

// --- CATALOG API ---

#[test]
async fn test_list_categories_returns_every_record() {
    let state = create_test_state(seeded_repo(), MockStorageService::new());

    let Json(categories) = handlers::list_categories(State(state)).await.unwrap();

    assert_eq!(categories.len(), 2);
    assert_eq!(categories[1].parent_id, Some(1));
}

#[test]
async fn test_get_category_not_found_has_error_body() {
    let state = create_test_state(seeded_repo(), MockStorageService::new());

    let response = handlers::get_category(State(state), Path(77))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.error, "Category not found");
}

#[test]
async fn test_create_category_trims_and_persists() {
    let repo = seeded_repo();
    let state = create_test_state(repo.clone(), MockStorageService::new());

    let (status, Json(category)) = handlers::create_category(
        admin_user(),
        State(state),
        Json(CategoryPayload {
            name: "  Hats ".to_string(),
            image: "/c.png".to_string(),
            parent_id: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(category.name, "Hats");
    assert_eq!(repo.list_categories().await.unwrap().len(), 3);
}

#[test]
async fn test_create_category_rejects_blank_name() {
    let state = create_test_state(seeded_repo(), MockStorageService::new());

    let response = handlers::create_category(
        admin_user(),
        State(state),
        Json(CategoryPayload {
            name: "   ".to_string(),
            image: "/c.png".to_string(),
            parent_id: None,
        }),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = body_json(response).await;
    assert!(body.error.contains("name"));
}

#[test]
async fn test_update_category_rejects_cycle() {
    let state = create_test_state(seeded_repo(), MockStorageService::new());

    let response = handlers::update_category(
        admin_user(),
        State(state),
        Path(1),
        Json(CategoryPayload {
            name: "Shoes".to_string(),
            image: "/a.png".to_string(),
            parent_id: Some(2),
        }),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
async fn test_delete_category_success_has_no_error_field() {
    let repo = seeded_repo();
    let state = create_test_state(repo.clone(), MockStorageService::new());

    let response = handlers::delete_category(admin_user(), State(state), Path(2))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(response).await;
    assert!(body.get("error").is_none());
    assert_eq!(body["deleted"], 2);
    assert!(repo.get_category(2).await.unwrap().is_none());
}

#[test]
async fn test_delete_missing_category_has_error_field() {
    let state = create_test_state(seeded_repo(), MockStorageService::new());

    let response = handlers::delete_category(admin_user(), State(state), Path(42))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.error, "Category not found");
}

#[test]
async fn test_image_upload_url_uses_category_prefix() {
    let state = create_test_state(seeded_repo(), MockStorageService::new());

    let Json(upload) = handlers::get_image_upload_url(
        admin_user(),
        State(state),
        Json(ImageUploadRequest {
            filename: "shoes.PNG".to_string(),
            file_type: "image/png".to_string(),
        }),
    )
    .await
    .unwrap();

    let ImageUploadResponse {
        upload_url,
        resource_key,
    } = upload;
    assert!(resource_key.starts_with("categories/"));
    assert!(resource_key.ends_with(".png"));
    assert!(upload_url.starts_with("http://localhost:9000/mock-bucket/"));
    assert!(upload_url.contains(&resource_key));
}

#[test]
async fn test_image_upload_rejects_non_images() {
    let state = create_test_state(seeded_repo(), MockStorageService::new());

    let response = handlers::get_image_upload_url(
        admin_user(),
        State(state),
        Json(ImageUploadRequest {
            filename: "report.pdf".to_string(),
            file_type: "application/pdf".to_string(),
        }),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
async fn test_image_upload_storage_failure_is_internal_error() {
    let state = create_test_state(seeded_repo(), MockStorageService::new_failing());

    let response = handlers::get_image_upload_url(
        admin_user(),
        State(state),
        Json(ImageUploadRequest {
            filename: "shoes.png".to_string(),
            file_type: "image/png".to_string(),
        }),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.error, "Failed to prepare upload");
}

// --- DASHBOARD PAGES ---

#[test]
async fn test_categories_page_redirects_without_session() {
    let state = create_test_state(seeded_repo(), MockStorageService::new());

    let response = handlers::categories_page(Session(None), State(state))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
    assert!(!body_text(response).await.contains("<table>"));
}

#[test]
async fn test_categories_page_renders_table() {
    let state = create_test_state(seeded_repo(), MockStorageService::new());

    let response = handlers::categories_page(confirmed_session(), State(state))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert_eq!(html.matches("<tr data-id=").count(), 2);
    assert!(html.contains("Boots"));
}

#[test]
async fn test_delete_prompt_for_listed_category() {
    let state = create_test_state(seeded_repo(), MockStorageService::new());

    let response = handlers::delete_prompt(confirmed_session(), State(state), Path(2))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Eliminar categoria"));
}

#[test]
async fn test_delete_prompt_for_unknown_category_returns_to_table() {
    let state = create_test_state(seeded_repo(), MockStorageService::new());

    let response = handlers::delete_prompt(confirmed_session(), State(state), Path(99))
        .await
        .unwrap();

    assert_eq!(location(&response), Some("/dashboard/categories"));
}

#[test]
async fn test_delete_confirm_removes_category_and_returns_to_table() {
    let repo = seeded_repo();
    let state = create_test_state(repo.clone(), MockStorageService::new());

    let response = handlers::delete_confirm(confirmed_session(), State(state), Path(1))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/dashboard/categories"));
    let remaining = repo.list_categories().await.unwrap();
    assert_eq!(remaining.len(), 1);
    // The child of the deleted category is now top-level.
    assert_eq!(remaining[0].parent_id, None);
}

#[test]
async fn test_delete_confirm_without_session_deletes_nothing() {
    let repo = seeded_repo();
    let state = create_test_state(repo.clone(), MockStorageService::new());

    let response = handlers::delete_confirm(Session(None), State(state), Path(1))
        .await
        .unwrap();

    assert_eq!(location(&response), Some("/login"));
    assert_eq!(repo.list_categories().await.unwrap().len(), 2);
}
