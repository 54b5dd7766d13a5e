use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::clock::FixedClock;
use crate::gateway::InMemoryGateway;
use crate::workflows::deductions::router::{deduction_router, recurring_handler};
use crate::workflows::deductions::{DeductionService, RecurringDeductionRequest};

#[tokio::test]
async fn create_type_route_returns_created_record() {
    let harness = harness();
    let router = deduction_router(harness.service.clone());

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/deductions/types",
            json!({ "name": "Transport levy", "description": "Route trucks" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["name"], "Transport levy");
    assert_eq!(
        harness.audit.entries()[0].actor.as_deref(),
        Some("admin-1")
    );
}

#[tokio::test]
async fn invalid_type_returns_unprocessable_with_errors() {
    let harness = harness();
    let router = deduction_router(harness.service.clone());

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/deductions/types",
            json!({ "name": "" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["errors"], json!(["Deduction type name is required"]));
}

#[tokio::test]
async fn deleting_type_in_use_returns_conflict() {
    let harness = harness();
    let type_id = harness
        .service
        .create_deduction_type(transport_levy(), None)
        .expect("created")
        .id;
    harness
        .service
        .save_farmer_deduction(farmer_request("f-001", &type_id, 90.0, "weekly"), None)
        .expect("saved");

    let response = deduction_router(harness.service.clone())
        .oneshot(
            Request::delete(format!("/api/v1/deductions/types/{type_id}"))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn missing_standing_deduction_returns_not_found() {
    let harness = harness();

    let response = deduction_router(harness.service.clone())
        .oneshot(
            Request::delete("/api/v1/deductions/farmers/f-001/dt-0099")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn total_route_reports_farmer_total() {
    let harness = harness();
    let type_id = harness
        .service
        .create_deduction_type(transport_levy(), None)
        .expect("created")
        .id;
    harness
        .service
        .save_farmer_deduction(farmer_request("f-004", &type_id, 125.5, "monthly"), None)
        .expect("saved");

    let response = deduction_router(harness.service.clone())
        .oneshot(
            Request::get("/api/v1/deductions/farmers/f-004/total")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["farmer_id"], "f-004");
    assert_eq!(payload["total_deductions"].as_f64(), Some(125.5));
}

#[tokio::test]
async fn recurring_handler_renders_precondition_failure_as_outcome() {
    let service = Arc::new(DeductionService::new(
        Arc::new(InMemoryGateway::new()),
        Arc::new(MemoryAudit::default()),
        Arc::new(FixedClock::at_date(today())),
    ));
    let type_id = service
        .create_deduction_type(transport_levy(), None)
        .expect("created")
        .id;

    let response = recurring_handler::<InMemoryGateway, MemoryAudit>(
        State(service),
        axum::http::HeaderMap::new(),
        axum::Json::<RecurringDeductionRequest>(recurring_request(&type_id)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload,
        json!({ "success": false, "createdCount": 0, "errors": ["No farmers found"] })
    );
}

#[tokio::test]
async fn recurring_route_returns_batch_outcome() {
    let harness = harness();
    let type_id = harness
        .service
        .create_deduction_type(transport_levy(), None)
        .expect("created")
        .id;

    let response = deduction_router(harness.service.clone())
        .oneshot(json_request(
            Method::POST,
            "/api/v1/deductions/recurring",
            json!({
                "deduction_type_id": type_id,
                "amount": 75.0,
                "frequency": "weekly",
                "start_date": "2024-03-18",
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], Value::Bool(true));
    assert_eq!(payload["createdCount"], 5);
    assert_eq!(payload["errors"], json!([]));
}

#[tokio::test]
async fn apply_due_route_accepts_empty_body() {
    let harness = harness();
    let type_id = harness
        .service
        .create_deduction_type(transport_levy(), None)
        .expect("created")
        .id;
    harness
        .service
        .save_farmer_deduction(farmer_request("f-005", &type_id, 20.0, "daily"), None)
        .expect("saved");

    let response = deduction_router(harness.service.clone())
        .oneshot(
            Request::post("/api/v1/deductions/apply-due")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["appliedCount"], 1);

    let records = harness.service.list_deduction_records().expect("records");
    assert_eq!(records[0].record.applied_by, "system");
    assert_eq!(records[0].farmer_name, "Chebet Kiprono");
}
