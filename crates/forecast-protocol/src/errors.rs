//! API error types.

use thiserror::Error;

use crate::queries::QueryError;
use crate::responses::ExceptionResponse;

/// Errors that can occur in API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid query parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Query parsing error.
    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] QueryError),

    /// Variable not present in the dataset.
    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    /// A selector label is not present on its dimension.
    #[error("Label not found: {0}")]
    LabelNotFound(String),

    /// No data available for the query.
    #[error("No data available: {0}")]
    NoDataAvailable(String),

    /// Missing, invalid or expired credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The identity provider could not be reached or answered unexpectedly.
    #[error("Identity provider error: {0}")]
    UpstreamError(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Data access error.
    #[error("Data access error: {0}")]
    DataAccessError(String),
}

impl ApiError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidParameter(_) => 400,
            ApiError::InvalidQuery(_) => 400,
            ApiError::VariableNotFound(_) => 404,
            ApiError::LabelNotFound(_) => 404,
            ApiError::NoDataAvailable(_) => 404,
            ApiError::Unauthorized(_) => 401,
            ApiError::UpstreamError(_) => 502,
            ApiError::InternalError(_) => 500,
            ApiError::DataAccessError(_) => 500,
        }
    }

    /// Convert to an ExceptionResponse.
    pub fn to_exception(&self) -> ExceptionResponse {
        match self {
            ApiError::InvalidParameter(msg) => ExceptionResponse::bad_request(msg),
            ApiError::InvalidQuery(e) => ExceptionResponse::bad_request(e.to_string()),
            ApiError::VariableNotFound(_)
            | ApiError::LabelNotFound(_)
            | ApiError::NoDataAvailable(_) => ExceptionResponse::not_found(self.to_string()),
            ApiError::Unauthorized(msg) => ExceptionResponse::unauthorized(msg),
            ApiError::UpstreamError(msg) => ExceptionResponse::bad_gateway(msg),
            ApiError::InternalError(msg) => ExceptionResponse::internal_error(msg),
            ApiError::DataAccessError(msg) => ExceptionResponse::internal_error(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_common::BboxError;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::InvalidParameter("test".to_string()).status_code(), 400);
        assert_eq!(ApiError::VariableNotFound("test".to_string()).status_code(), 404);
        assert_eq!(ApiError::LabelNotFound("test".to_string()).status_code(), 404);
        assert_eq!(ApiError::NoDataAvailable("test".to_string()).status_code(), 404);
        assert_eq!(ApiError::Unauthorized("test".to_string()).status_code(), 401);
        assert_eq!(ApiError::DataAccessError("test".to_string()).status_code(), 500);
    }

    #[test]
    fn test_error_to_exception() {
        let err = ApiError::VariableNotFound("q700".to_string());
        let exc = err.to_exception();

        assert_eq!(exc.status, Some(404));
        assert!(exc.detail.unwrap().contains("q700"));
    }

    #[test]
    fn test_bbox_error_conversion() {
        let query_err = QueryError::InvalidBbox(BboxError::InvertedLongitude {
            west: 20.0,
            east: 10.0,
        });
        let err: ApiError = query_err.into();

        assert_eq!(err.status_code(), 400);
        let exc = err.to_exception();
        assert_eq!(exc.status, Some(400));
        assert!(exc.detail.unwrap().contains("west"));
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::LabelNotFound("level=850".to_string());
        let display = format!("{}", err);
        assert!(display.contains("Label not found"));
        assert!(display.contains("level=850"));
    }
}
