use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::{AppConfig, ConfigError},
    error::RepoError,
    repository::RepositoryState,
};

/// SessionUser
///
/// The identity behind a request, as reported by a `SessionProvider`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("user lookup failed: {0}")]
    Repository(#[from] RepoError),
}

/// SessionProvider
///
/// Turns request headers into the caller's identity. `Ok(None)` means "no session";
/// errors are provider failures. The `AuthUser` extractor collapses both into a 401.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, SessionError>;
}

pub type SessionState = Arc<dyn SessionProvider>;

/// session_provider
///
/// Picks the provider for this deployment: local JWT verification when a shared
/// secret is configured, otherwise the remote identity provider.
pub fn session_provider(
    config: &AppConfig,
    client: reqwest::Client,
    repo: RepositoryState,
) -> Result<SessionState, ConfigError> {
    if let Some(secret) = config.auth_jwt_secret.as_deref() {
        tracing::info!("sessions verified locally with AUTH_JWT_SECRET");
        return Ok(Arc::new(JwtSessionProvider::new(secret, repo)));
    }

    match config.auth_service_url.as_deref() {
        Some(base_url) => {
            tracing::info!(%base_url, "sessions resolved by the identity provider");
            Ok(Arc::new(HttpSessionProvider::new(client, base_url)))
        }
        None => Err(ConfigError::NoSessionProvider),
    }
}

// --- Remote identity provider ---

/// Envelope returned by `GET /api/auth/get-session`. The body is JSON `null` when
/// the cookie or token does not belong to a live session.
#[derive(Deserialize)]
struct SessionEnvelope {
    user: SessionUser,
}

/// HttpSessionProvider
///
/// Asks the identity provider who the caller is, forwarding the caller's `cookie` and
/// `authorization` headers unchanged.
pub struct HttpSessionProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSessionProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, SessionError> {
        let mut request = self
            .client
            .get(format!("{}/api/auth/get-session", self.base_url));
        for name in [header::COOKIE, header::AUTHORIZATION] {
            if let Some(value) = headers.get(&name) {
                request = request.header(name, value.clone());
            }
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "identity provider reported no session");
            return Ok(None);
        }

        let envelope: Option<SessionEnvelope> = response.json().await?;
        Ok(envelope.map(|e| e.user))
    }
}

// --- Local JWT verification ---

/// Claims
///
/// Payload expected inside a Bearer JWT signed with the shared HS256 secret.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's id in the `users` table.
    pub sub: Uuid,
    /// Expiration time, always validated.
    pub exp: usize,
    /// Issued at.
    pub iat: usize,
}

/// JwtSessionProvider
///
/// Verifies `Authorization: Bearer <jwt>` locally and then loads the user, so a user
/// removed after the token was issued loses access immediately.
pub struct JwtSessionProvider {
    decoding_key: DecodingKey,
    validation: Validation,
    repo: RepositoryState,
}

impl JwtSessionProvider {
    pub fn new(secret: &str, repo: RepositoryState) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            repo,
        }
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, SessionError> {
        let Some(token) = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
        else {
            return Ok(None);
        };

        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let user = self.repo.get_user(token_data.claims.sub).await?;

        Ok(user.map(|user| SessionUser {
            id: user.id,
            name: user.name,
            email: user.email,
        }))
    }
}
