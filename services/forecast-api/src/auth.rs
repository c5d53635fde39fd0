//! Bearer authentication against an external identity provider.
//!
//! Tokens are opaque: they are obtained by exchanging credentials with the
//! provider and validated by asking the provider for the token's user on
//! every protected request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Extension, Request},
    http::header,
    middleware::Next,
    response::Response,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::state::AppState;

/// Errors from the identity provider.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Email address has not been confirmed")]
    EmailNotConfirmed,

    #[error("Identity provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl AuthError {
    /// Whether the error is the caller's fault rather than the provider's.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::MissingToken
                | AuthError::InvalidToken
                | AuthError::EmailNotConfirmed
        )
    }
}

/// Session returned by a credential exchange.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// User behind a validated token.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<String>,
}

impl User {
    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// Identity provider operations used by the API.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange email and password for a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Resolve the user owning `token`.
    async fn get_user(&self, token: &str) -> Result<User, AuthError>;
}

/// GoTrue-compatible identity provider (as used by Supabase).
pub struct GoTrueProvider {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl GoTrueProvider {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }
}

#[async_trait]
impl IdentityProvider for GoTrueProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .client
            .post(self.url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json::<Session>().await?),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                debug!(status = %response.status(), "Credential exchange rejected");
                Err(AuthError::InvalidCredentials)
            }
            status => Err(provider_error(status, response).await),
        }
    }

    async fn get_user(&self, token: &str) -> Result<User, AuthError> {
        let response = self
            .client
            .get(self.url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json::<User>().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::InvalidToken),
            status => Err(provider_error(status, response).await),
        }
    }
}

async fn provider_error(status: StatusCode, response: reqwest::Response) -> AuthError {
    let message = response.text().await.unwrap_or_default();
    warn!(status = %status, message = %message, "Identity provider error");
    AuthError::Provider {
        status: status.as_u16(),
        message,
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Authenticated user, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Middleware rejecting requests without a valid, confirmed bearer token.
pub async fn require_auth(
    Extension(state): Extension<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string);

    let user = match authenticate(state.identity.as_ref(), token.as_deref()).await {
        Ok(user) => user,
        Err(e) => {
            metrics::counter!("forecast_auth_failures_total").increment(1);
            debug!(error = %e, path = %request.uri().path(), "Rejected request");
            return Err(e.into());
        }
    };

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Resolve a confirmed user for `token`.
pub async fn authenticate(
    identity: &dyn IdentityProvider,
    token: Option<&str>,
) -> Result<User, AuthError> {
    let token = token.ok_or(AuthError::MissingToken)?;
    let user = identity.get_user(token).await?;
    if !user.is_confirmed() {
        return Err(AuthError::EmailNotConfirmed);
    }
    Ok(user)
}
