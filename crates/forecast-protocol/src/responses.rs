//! JSON response bodies.

use serde::{Deserialize, Serialize};

/// Health check body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Credentials posted to `/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Session returned by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds, when the identity provider reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl LoginResponse {
    /// Bearer session for `access_token`.
    pub fn bearer(access_token: impl Into<String>, expires_in: Option<u64>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "bearer".to_string(),
            expires_in,
        }
    }
}

/// Scalar mean of one variable over a bounding box.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeanResponse {
    pub variable: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,

    /// `null` when every selected value is missing.
    pub mean: Option<f64>,

    /// Number of non-missing values averaged.
    pub count: usize,
}

impl MeanResponse {
    /// Mean of `values`, skipping NaN.
    pub fn from_values<I>(variable: impl Into<String>, units: Option<String>, values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let (sum, count) = values
            .into_iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));

        Self {
            variable: variable.into(),
            units,
            mean: (count > 0).then(|| sum / count as f64),
            count,
        }
    }
}

/// Exception response for errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExceptionResponse {
    /// Exception type identifier.
    #[serde(rename = "type")]
    pub type_: String,

    /// Human-readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// HTTP status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Detailed error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// URI of the request that caused the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ExceptionResponse {
    /// Create a new exception response.
    pub fn new(type_: impl Into<String>, status: u16, detail: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            title: None,
            status: Some(status),
            detail: Some(detail.into()),
            instance: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the instance URI.
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Create a 400 Bad Request exception.
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new("invalid-parameter-value", 400, detail).with_title("Bad Request")
    }

    /// Create a 401 Unauthorized exception.
    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new("unauthorized", 401, detail).with_title("Unauthorized")
    }

    /// Create a 404 Not Found exception.
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new("not-found", 404, detail).with_title("Not Found")
    }

    /// Create a 500 Internal Server Error exception.
    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::new("server-error", 500, detail).with_title("Internal Server Error")
    }

    /// Create a 502 Bad Gateway exception.
    pub fn bad_gateway(detail: impl Into<String>) -> Self {
        Self::new("upstream-error", 502, detail).with_title("Bad Gateway")
    }
}
