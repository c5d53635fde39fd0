//! HTTP request handlers for the forecast API.

pub mod auth;
pub mod health;
pub mod mean;
pub mod points;

use std::sync::Arc;

use forecast_protocol::{ApiError, SubsetParams, SubsetQuery};

use crate::data::ForecastStore;
use crate::error::AppError;

/// Validate `params` and run `read` against the store on the blocking pool.
pub(crate) async fn query_store<T, F>(
    store: Arc<ForecastStore>,
    params: SubsetParams,
    read: F,
) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&ForecastStore, &SubsetQuery) -> Result<T, AppError> + Send + 'static,
{
    let query = SubsetQuery::from_params(&params)?;
    tokio::task::spawn_blocking(move || read(&store, &query))
        .await
        .map_err(|e| ApiError::InternalError(format!("Store read task failed: {}", e)))?
}
