//! Bounding-box mean handler.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    Json,
};
use forecast_protocol::{MeanResponse, SubsetParams};
use tracing::debug;

use crate::error::AppError;
use crate::handlers::query_store;
use crate::state::AppState;

/// GET /mean?variable=&west=&south=&east=&north=
///
/// Public: no bearer token required.
pub async fn mean_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SubsetParams>,
) -> Result<Json<MeanResponse>, AppError> {
    metrics::counter!("forecast_requests_total", "endpoint" => "mean").increment(1);

    let response = query_store(state.store.clone(), params, |store, query| store.mean(query)).await?;
    debug!(
        variable = %response.variable,
        count = response.count,
        "Computed bounding box mean"
    );

    Ok(Json(response))
}
