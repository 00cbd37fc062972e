use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::ApiError,
    identity::IdentityState,
    models::SessionUser,
    session::{self, GuardDecision},
};

/// Name of the cookie the Supabase browser client stores the access token in.
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";

/// Audience Supabase stamps on tokens of signed-in users.
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Claims
///
/// Payload of a Supabase access token. Only the fields this service reads are declared.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the auth user's UUID.
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    /// Expiration. Always validated.
    pub exp: usize,
    pub iat: usize,
}

/// Pulls the access token from the `Authorization: Bearer` header, falling back to the
/// `sb-access-token` cookie used by browser sessions.
pub fn access_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == ACCESS_TOKEN_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|token| !token.is_empty())
}

/// Decodes and validates a Supabase access token against the shared JWT secret.
pub fn decode_claims(token: &str, secret: &str) -> Option<Claims> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("access token expired"),
                other => tracing::debug!("access token rejected: {:?}", other),
            }
            None
        }
    }
}

/// Resolves the session behind a request: local token validation first, then the
/// identity provider lookup for the user's confirmation state.
async fn resolve_session(
    parts: &Parts,
    config: &AppConfig,
    identity: &IdentityState,
) -> Option<(Claims, SessionUser)> {
    let token = access_token(parts)?;
    let claims = decode_claims(&token, &config.jwt_secret)?;

    match identity.get_user(&token).await {
        Ok(Some(user)) => Some((claims, user)),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("identity lookup failed: {}", e);
            None
        }
    }
}

/// Session
///
/// The current session user, if any. Never rejects: pages use it to feed the session
/// guard, which decides on the redirect.
#[derive(Debug, Clone)]
pub struct Session(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    IdentityState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = IdentityState::from_ref(state);
        let config = AppConfig::from_ref(state);
        let user = resolve_session(parts, &config, &identity)
            .await
            .map(|(_, user)| user);
        Ok(Session(user))
    }
}

/// AuthUser
///
/// A confirmed user, as required by every state-changing API route.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    IdentityState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = IdentityState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let (claims, user) = resolve_session(parts, &config, &identity)
            .await
            .ok_or(ApiError::Unauthorized)?;

        match session::guard(Some(user)) {
            GuardDecision::Admit(user) => Ok(AuthUser {
                id: claims.sub,
                email: user.email.unwrap_or_default(),
            }),
            GuardDecision::Redirect(_) => Err(ApiError::Unauthorized),
        }
    }
}
