//! Service configuration from the environment.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Names of the forecast dimensions in the served store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionNames {
    pub init: String,
    pub lead: String,
    pub member: String,
    pub level: String,
}

impl Default for DimensionNames {
    fn default() -> Self {
        Self {
            init: "init".to_string(),
            lead: "lead".to_string(),
            member: "member".to_string(),
            level: "level".to_string(),
        }
    }
}

impl DimensionNames {
    /// Override defaults with `FORECAST_DIM_*` variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            init: env_or("FORECAST_DIM_INIT", defaults.init),
            lead: env_or("FORECAST_DIM_LEAD", defaults.lead),
            member: env_or("FORECAST_DIM_MEMBER", defaults.member),
            level: env_or("FORECAST_DIM_LEVEL", defaults.level),
        }
    }
}

/// Runtime settings for the forecast API.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the identity provider.
    pub identity_url: String,

    /// Public API key sent with every identity provider request.
    pub identity_anon_key: String,

    /// Allowed CORS origins; `*` allows any origin.
    pub cors_origins: Vec<String>,

    /// Zarr store served by the data endpoints.
    pub zarr_path: PathBuf,

    pub dims: DimensionNames,
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// `IDENTITY_URL` and `IDENTITY_ANON_KEY` are required.
    pub fn from_env() -> Result<Self> {
        let identity_url =
            std::env::var("IDENTITY_URL").context("IDENTITY_URL must be set")?;
        let identity_anon_key =
            std::env::var("IDENTITY_ANON_KEY").context("IDENTITY_ANON_KEY must be set")?;

        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|s| parse_origins(&s))
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let zarr_path = PathBuf::from(env_or("FORECAST_ZARR_PATH", "data/forecast.zarr".to_string()));

        let settings = Self {
            identity_url: identity_url.trim_end_matches('/').to_string(),
            identity_anon_key,
            cors_origins,
            zarr_path,
            dims: DimensionNames::from_env(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check the settings for obvious mistakes.
    pub fn validate(&self) -> Result<()> {
        if !(self.identity_url.starts_with("http://") || self.identity_url.starts_with("https://"))
        {
            bail!("IDENTITY_URL must be an http(s) URL, got '{}'", self.identity_url);
        }
        if self.identity_anon_key.trim().is_empty() {
            bail!("IDENTITY_ANON_KEY must not be empty");
        }
        for origin in &self.cors_origins {
            if origin != "*" && HeaderValue::from_str(origin).is_err() {
                bail!("Invalid CORS origin: {}", origin);
            }
        }
        Ok(())
    }

    /// CORS layer for the configured origins.
    pub fn cors_layer(&self) -> CorsLayer {
        if self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*") {
            return CorsLayer::permissive();
        }

        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();

        CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
    }
}

/// Split a comma separated origin list.
pub fn parse_origins(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| o.trim_end_matches('/').to_string())
        .collect()
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}
