//! HTTP error responses.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use forecast_protocol::{media_types, ApiError, QueryError};
use regrid::RegridError;
use tracing::error;

use crate::auth::AuthError;

/// An [`ApiError`] rendered as a JSON exception body.
#[derive(Debug)]
pub struct AppError(pub ApiError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }

        (
            status,
            [(header::CONTENT_TYPE, media_types::PROBLEM_JSON)],
            Json(self.0.to_exception()),
        )
            .into_response()
    }
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        Self(e)
    }
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        Self(ApiError::InvalidQuery(e))
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        if e.is_rejection() {
            Self(ApiError::Unauthorized(e.to_string()))
        } else {
            Self(ApiError::UpstreamError(e.to_string()))
        }
    }
}

impl From<RegridError> for AppError {
    fn from(e: RegridError) -> Self {
        Self(ApiError::DataAccessError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_rejection_is_unauthorized() {
        let response = AppError::from(AuthError::MissingToken).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            media_types::PROBLEM_JSON
        );
    }

    #[test]
    fn test_provider_failure_is_bad_gateway() {
        let err = AuthError::Provider {
            status: 503,
            message: "down".to_string(),
        };
        assert_eq!(
            AppError::from(err).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_storage_failure_is_server_error() {
        let err = RegridError::StorageError("disk gone".to_string());
        assert_eq!(
            AppError::from(err).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
