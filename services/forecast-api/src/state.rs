//! Application state for the forecast API.

use std::sync::Arc;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::auth::{GoTrueProvider, IdentityProvider};
use crate::config::Settings;
use crate::data::ForecastStore;

/// Shared application state.
pub struct AppState {
    pub settings: Settings,

    /// Opened forecast store.
    pub store: Arc<ForecastStore>,

    /// Identity provider validating bearer tokens.
    pub identity: Arc<dyn IdentityProvider>,

    /// Prometheus recorder handle, when one is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Open the configured store and connect the identity provider.
    ///
    /// Fails when the store cannot be opened.
    pub fn new(settings: Settings, prometheus: Option<PrometheusHandle>) -> Result<Self> {
        let store = ForecastStore::open(&settings.zarr_path, settings.dims.clone())
            .with_context(|| format!("Failed to open store {}", settings.zarr_path.display()))?;
        let identity = GoTrueProvider::new(&settings.identity_url, &settings.identity_anon_key)
            .context("Failed to create identity provider client")?;

        Ok(Self::with_parts(settings, store, Arc::new(identity), prometheus))
    }

    /// Assemble state from already constructed parts.
    pub fn with_parts(
        settings: Settings,
        store: ForecastStore,
        identity: Arc<dyn IdentityProvider>,
        prometheus: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            settings,
            store: Arc::new(store),
            identity,
            prometheus,
        }
    }
}
