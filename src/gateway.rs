use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::{
    error::DirectoryError,
    identity::{IdentityProvider, SupabaseIdentity},
    models::{DeletedResponse, ErrorBody, SessionUser},
    repository::RepositoryState,
};

/// AdminGateway
///
/// Everything the categories dashboard needs from the outside world: who is signed in,
/// and the two catalog calls. Bodies are handed back undecoded so the directory client
/// owns payload validation.
#[async_trait]
pub trait AdminGateway: Send + Sync {
    /// The signed-in user, or `None` when there is no usable session.
    async fn current_user(&self) -> Option<SessionUser>;

    /// `GET /api/categories`, raw JSON body.
    async fn list_categories(&self) -> Result<Value, DirectoryError>;

    /// `POST /api/categories/delete/{id}`, raw JSON body.
    async fn delete_category(&self, id: i64) -> Result<Value, DirectoryError>;
}

/// GatewayState
pub type GatewayState = Arc<dyn AdminGateway>;

/// HttpAdminGateway
///
/// Talks to a remote catalog API and to Supabase Auth over HTTP. No request timeouts are
/// configured; a hung request is ended by cancelling the owning view instead.
#[derive(Clone)]
pub struct HttpAdminGateway {
    client: reqwest::Client,
    api_base_url: String,
    identity: SupabaseIdentity,
    access_token: Option<String>,
}

impl HttpAdminGateway {
    pub fn new(
        api_base_url: &str,
        identity_base_url: &str,
        anon_key: &str,
        access_token: Option<String>,
    ) -> Self {
        let client = reqwest::Client::new();
        Self {
            identity: SupabaseIdentity::with_client(client.clone(), identity_base_url, anon_key),
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Reads a response body as JSON regardless of its status code: the API reports
/// failures inside the body.
async fn json_body(response: reqwest::Response) -> Result<Value, DirectoryError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl AdminGateway for HttpAdminGateway {
    async fn current_user(&self) -> Option<SessionUser> {
        let token = self.access_token.as_deref()?;
        match self.identity.get_user(token).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("session lookup failed: {}", e);
                None
            }
        }
    }

    async fn list_categories(&self) -> Result<Value, DirectoryError> {
        let response = self
            .authorized(self.client.get(format!("{}/api/categories", self.api_base_url)))
            .send()
            .await?;
        json_body(response).await
    }

    async fn delete_category(&self, id: i64) -> Result<Value, DirectoryError> {
        let response = self
            .authorized(
                self.client
                    .post(format!("{}/api/categories/delete/{}", self.api_base_url, id)),
            )
            .send()
            .await?;
        json_body(response).await
    }
}

/// LocalGateway
///
/// In-process gateway used by the server-rendered dashboard: the session was already
/// resolved from the incoming request and the catalog store is called directly. Delete
/// answers mirror the HTTP API bodies.
#[derive(Clone)]
pub struct LocalGateway {
    repo: RepositoryState,
    user: Option<SessionUser>,
}

impl LocalGateway {
    pub fn new(repo: RepositoryState, user: Option<SessionUser>) -> Self {
        Self { repo, user }
    }
}

#[async_trait]
impl AdminGateway for LocalGateway {
    async fn current_user(&self) -> Option<SessionUser> {
        self.user.clone()
    }

    async fn list_categories(&self) -> Result<Value, DirectoryError> {
        let categories = self.repo.list_categories().await.map_err(|e| {
            tracing::error!("listing categories failed: {:?}", e);
            DirectoryError::Server("Database error occurred".to_string())
        })?;
        Ok(serde_json::to_value(categories)?)
    }

    async fn delete_category(&self, id: i64) -> Result<Value, DirectoryError> {
        let body = match self.repo.delete_category(id).await {
            Ok(true) => json!(DeletedResponse { deleted: id }),
            Ok(false) => json!(ErrorBody {
                error: "Category not found".to_string(),
            }),
            Err(e) => {
                tracing::error!("deleting category {} failed: {:?}", id, e);
                json!(ErrorBody {
                    error: "Database error occurred".to_string(),
                })
            }
        };
        Ok(body)
    }
}
