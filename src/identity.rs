use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;

use crate::{error::IdentityError, models::SessionUser};

/// IdentityProvider
///
/// Resolves the "current user" behind an access token. Authentication itself is owned
/// by the external provider; this service only asks who the token belongs to.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` when the provider does not recognise the token (expired, revoked, ...).
    async fn get_user(&self, access_token: &str) -> Result<Option<SessionUser>, IdentityError>;
}

/// IdentityState
pub type IdentityState = Arc<dyn IdentityProvider>;

/// SupabaseIdentity
///
/// Calls Supabase Auth's `GET /auth/v1/user` endpoint, the same lookup the Supabase
/// client SDKs perform for `auth.getUser()`.
#[derive(Clone)]
pub struct SupabaseIdentity {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseIdentity {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, anon_key)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, anon_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn get_user(&self, access_token: &str) -> Result<Option<SessionUser>, IdentityError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.json::<SessionUser>().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                tracing::debug!(status = %response.status(), "identity provider rejected token");
                Ok(None)
            }
            status => Err(IdentityError::Status(status.as_u16())),
        }
    }
}
