//! GeoJSON point export handler.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use forecast_protocol::{media_types, SubsetParams};
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::handlers::query_store;
use crate::state::AppState;

/// GET /export/points?variable=a,b&west=&south=&east=&north=
///
/// Requires a bearer token; see [`crate::auth::require_auth`].
pub async fn points_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Query(params): Query<SubsetParams>,
) -> Result<Response, AppError> {
    metrics::counter!("forecast_requests_total", "endpoint" => "export_points").increment(1);

    let collection = query_store(state.store.clone(), params, |store, query| {
        store.export_points(query)
    })
    .await?;

    let returned = collection.features.len();
    metrics::histogram!("forecast_points_returned").record(returned as f64);
    info!(
        user = %user.id,
        points = returned,
        "Exported points"
    );

    Ok((
        [(header::CONTENT_TYPE, media_types::GEO_JSON)],
        Json(collection),
    )
        .into_response())
}
