use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::service::{PerformanceService, PerformanceServiceError};
use crate::gateway::DataGateway;
use crate::workflows::farmers::FarmerId;

#[derive(Debug, Deserialize)]
pub struct CollectionDateQuery {
    pub date: NaiveDate,
}

/// Router exposing the performance dashboard and per-farmer scoring.
pub fn performance_router<G>(service: Arc<PerformanceService<G>>) -> Router
where
    G: DataGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/performance/dashboard",
            get(dashboard_handler::<G>),
        )
        .route(
            "/api/v1/performance/dashboard/refresh",
            post(refresh_handler::<G>),
        )
        .route(
            "/api/v1/performance/farmers/:farmer_id",
            get(farmer_handler::<G>),
        )
        .route(
            "/api/v1/farmers/:farmer_id/collections/exists",
            get(collection_exists_handler::<G>),
        )
        .with_state(service)
}

fn error_response(error: PerformanceServiceError) -> Response {
    let status = match &error {
        PerformanceServiceError::FarmerNotFound(_) => StatusCode::NOT_FOUND,
        PerformanceServiceError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn dashboard_handler<G>(
    State(service): State<Arc<PerformanceService<G>>>,
) -> Response
where
    G: DataGateway + 'static,
{
    match service.dashboard() {
        Ok(dashboard) => (StatusCode::OK, axum::Json(dashboard)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn refresh_handler<G>(
    State(service): State<Arc<PerformanceService<G>>>,
) -> Response
where
    G: DataGateway + 'static,
{
    match service.refresh_dashboard() {
        Ok(dashboard) => (StatusCode::OK, axum::Json(dashboard)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn farmer_handler<G>(
    State(service): State<Arc<PerformanceService<G>>>,
    Path(farmer_id): Path<String>,
) -> Response
where
    G: DataGateway + 'static,
{
    match service.farmer_performance(&FarmerId(farmer_id)) {
        Ok(performance) => (StatusCode::OK, axum::Json(performance)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn collection_exists_handler<G>(
    State(service): State<Arc<PerformanceService<G>>>,
    Path(farmer_id): Path<String>,
    Query(query): Query<CollectionDateQuery>,
) -> Response
where
    G: DataGateway + 'static,
{
    let farmer_id = FarmerId(farmer_id);
    match service.collection_exists(&farmer_id, query.date) {
        Ok(exists) => {
            let payload = json!({
                "farmer_id": farmer_id,
                "date": query.date,
                "exists": exists,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}
