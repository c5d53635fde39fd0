//! Credential exchange handler.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};
use forecast_protocol::{ApiError, LoginRequest, LoginResponse};
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

/// POST /auth/login
///
/// Exchanges `{email, password}` for a bearer token issued by the identity
/// provider.
pub async fn login_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    metrics::counter!("forecast_requests_total", "endpoint" => "login").increment(1);

    let Json(request) = body.map_err(|e| ApiError::InvalidParameter(e.body_text()))?;
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::InvalidParameter("email and password are required".to_string()).into());
    }

    let session = state
        .identity
        .sign_in(request.email.trim(), &request.password)
        .await?;
    info!(email = %request.email.trim(), "Issued session");

    Ok(Json(LoginResponse::bearer(
        session.access_token,
        session.expires_in,
    )))
}
