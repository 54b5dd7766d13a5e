use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::audit::AuditPublisher;
use super::domain::{
    DeductionTypeDraft, DeductionTypeId, FarmerDeductionRequest, ImmediateDeductionRequest,
    RecurringDeductionRequest,
};
use super::service::{DeductionService, DeductionServiceError};
use crate::gateway::{DataGateway, GatewayError};
use crate::workflows::farmers::FarmerId;

/// Header naming the administrator behind a mutating request.
pub const ACTOR_HEADER: &str = "x-actor-id";
const SYSTEM_ACTOR: &str = "system";

/// Body of a due-deduction run. Both fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct ApplyDueRequest {
    #[serde(default)]
    pub applied_by: Option<String>,
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

/// Router exposing deduction administration endpoints.
pub fn deduction_router<G, A>(service: Arc<DeductionService<G, A>>) -> Router
where
    G: DataGateway + 'static,
    A: AuditPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/deductions/types",
            get(list_types_handler::<G, A>).post(create_type_handler::<G, A>),
        )
        .route(
            "/api/v1/deductions/types/:type_id",
            put(update_type_handler::<G, A>).delete(delete_type_handler::<G, A>),
        )
        .route(
            "/api/v1/deductions/farmers",
            get(list_farmer_deductions_handler::<G, A>).post(save_farmer_deduction_handler::<G, A>),
        )
        .route(
            "/api/v1/deductions/farmers/:farmer_id/total",
            get(total_handler::<G, A>),
        )
        .route(
            "/api/v1/deductions/farmers/:farmer_id/:type_id",
            delete(delete_farmer_deduction_handler::<G, A>),
        )
        .route("/api/v1/deductions/summary", get(summary_handler::<G, A>))
        .route("/api/v1/deductions/records", get(records_handler::<G, A>))
        .route(
            "/api/v1/deductions/recurring",
            post(recurring_handler::<G, A>),
        )
        .route(
            "/api/v1/deductions/immediate",
            post(immediate_handler::<G, A>),
        )
        .route("/api/v1/deductions/apply-due", post(apply_due_handler::<G, A>))
        .with_state(service)
}

fn actor(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn error_response(error: DeductionServiceError) -> Response {
    match error {
        DeductionServiceError::Validation(failed) => {
            let payload = json!({
                "error": failed.to_string(),
                "errors": failed.errors,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        DeductionServiceError::NotFound(missing) => {
            let payload = json!({ "error": missing.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        DeductionServiceError::Gateway(GatewayError::NotFound) => {
            let payload = json!({ "error": "record not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        error @ DeductionServiceError::InUse(_) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        error @ DeductionServiceError::NoFarmers => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn list_types_handler<G, A>(
    State(service): State<Arc<DeductionService<G, A>>>,
) -> Response
where
    G: DataGateway + 'static,
    A: AuditPublisher + 'static,
{
    match service.list_deduction_types() {
        Ok(types) => (StatusCode::OK, axum::Json(types)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_type_handler<G, A>(
    State(service): State<Arc<DeductionService<G, A>>>,
    headers: HeaderMap,
    axum::Json(draft): axum::Json<DeductionTypeDraft>,
) -> Response
where
    G: DataGateway + 'static,
    A: AuditPublisher + 'static,
{
    match service.create_deduction_type(draft, actor(&headers).as_deref()) {
        Ok(created) => (StatusCode::CREATED, axum::Json(created)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_type_handler<G, A>(
    State(service): State<Arc<DeductionService<G, A>>>,
    Path(type_id): Path<String>,
    headers: HeaderMap,
    axum::Json(draft): axum::Json<DeductionTypeDraft>,
) -> Response
where
    G: DataGateway + 'static,
    A: AuditPublisher + 'static,
{
    let id = DeductionTypeId(type_id);
    match service.update_deduction_type(&id, draft, actor(&headers).as_deref()) {
        Ok(updated) => (StatusCode::OK, axum::Json(updated)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_type_handler<G, A>(
    State(service): State<Arc<DeductionService<G, A>>>,
    Path(type_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    G: DataGateway + 'static,
    A: AuditPublisher + 'static,
{
    let id = DeductionTypeId(type_id);
    match service.delete_deduction_type(&id, actor(&headers).as_deref()) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_farmer_deductions_handler<G, A>(
    State(service): State<Arc<DeductionService<G, A>>>,
) -> Response
where
    G: DataGateway + 'static,
    A: AuditPublisher + 'static,
{
    match service.list_farmer_deductions() {
        Ok(deductions) => (StatusCode::OK, axum::Json(deductions)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn save_farmer_deduction_handler<G, A>(
    State(service): State<Arc<DeductionService<G, A>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<FarmerDeductionRequest>,
) -> Response
where
    G: DataGateway + 'static,
    A: AuditPublisher + 'static,
{
    match service.save_farmer_deduction(request, actor(&headers).as_deref()) {
        Ok(saved) => (StatusCode::OK, axum::Json(saved)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_farmer_deduction_handler<G, A>(
    State(service): State<Arc<DeductionService<G, A>>>,
    Path((farmer_id, type_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response
where
    G: DataGateway + 'static,
    A: AuditPublisher + 'static,
{
    match service.delete_farmer_deduction(
        &FarmerId(farmer_id),
        &DeductionTypeId(type_id),
        actor(&headers).as_deref(),
    ) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn total_handler<G, A>(
    State(service): State<Arc<DeductionService<G, A>>>,
    Path(farmer_id): Path<String>,
) -> Response
where
    G: DataGateway + 'static,
    A: AuditPublisher + 'static,
{
    let farmer_id = FarmerId(farmer_id);
    match service.calculate_total_deductions_for_farmer(&farmer_id) {
        Ok(total) => {
            let payload = json!({
                "farmer_id": farmer_id,
                "total_deductions": total,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn summary_handler<G, A>(
    State(service): State<Arc<DeductionService<G, A>>>,
) -> Response
where
    G: DataGateway + 'static,
    A: AuditPublisher + 'static,
{
    match service.farmers_with_deductions() {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn records_handler<G, A>(
    State(service): State<Arc<DeductionService<G, A>>>,
) -> Response
where
    G: DataGateway + 'static,
    A: AuditPublisher + 'static,
{
    match service.list_deduction_records() {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Precondition failures come back in the batch outcome shape so clients can
/// treat every response from this endpoint uniformly.
pub(crate) async fn recurring_handler<G, A>(
    State(service): State<Arc<DeductionService<G, A>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<RecurringDeductionRequest>,
) -> Response
where
    G: DataGateway + 'static,
    A: AuditPublisher + 'static,
{
    match service.create_recurring_deduction_for_all_farmers(request, actor(&headers).as_deref())
    {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => {
            let status = match &error {
                DeductionServiceError::Validation(_) | DeductionServiceError::NoFarmers => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                DeductionServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let payload = json!({
                "success": false,
                "createdCount": 0,
                "errors": [error.to_string()],
            });
            (status, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn immediate_handler<G, A>(
    State(service): State<Arc<DeductionService<G, A>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<ImmediateDeductionRequest>,
) -> Response
where
    G: DataGateway + 'static,
    A: AuditPublisher + 'static,
{
    let applied_by = actor(&headers).unwrap_or_else(|| SYSTEM_ACTOR.to_string());
    match service.apply_immediate_deduction(request, &applied_by) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn apply_due_handler<G, A>(
    State(service): State<Arc<DeductionService<G, A>>>,
    headers: HeaderMap,
    body: Option<axum::Json<ApplyDueRequest>>,
) -> Response
where
    G: DataGateway + 'static,
    A: AuditPublisher + 'static,
{
    let request = body.map(|axum::Json(request)| request).unwrap_or_default();
    let applied_by = request
        .applied_by
        .or_else(|| actor(&headers))
        .unwrap_or_else(|| SYSTEM_ACTOR.to_string());
    let today = request.today.unwrap_or_else(|| service.today());

    match service.apply_due_recurring_deductions(&applied_by, today) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}
