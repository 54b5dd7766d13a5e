use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use dairy_coop::gateway::DataGateway;
use dairy_coop::workflows::deductions::{deduction_router, AuditPublisher, DeductionService};
use dairy_coop::workflows::performance::{performance_router, PerformanceService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_service_routes<G, A>(
    performance: Arc<PerformanceService<G>>,
    deductions: Arc<DeductionService<G, A>>,
) -> axum::Router
where
    G: DataGateway + 'static,
    A: AuditPublisher + 'static,
{
    performance_router(performance)
        .merge(deduction_router(deductions))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::seed_cooperative;
    use crate::infra::InMemoryAuditLog;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use dairy_coop::clock::FixedClock;
    use dairy_coop::config::DashboardConfig;
    use dairy_coop::gateway::InMemoryGateway;
    use tower::ServiceExt;

    fn router() -> axum::Router {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid date");
        let gateway = Arc::new(InMemoryGateway::new());
        seed_cooperative(&gateway, today);
        let clock = Arc::new(FixedClock::at_date(today));
        let performance = Arc::new(PerformanceService::new(
            gateway.clone(),
            clock.clone(),
            DashboardConfig::default(),
        ));
        let deductions = Arc::new(DeductionService::new(
            gateway,
            Arc::new(InMemoryAuditLog::default()),
            clock,
        ));
        with_service_routes(performance, deductions)
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn composed_router_serves_both_workflows() {
        let app = router();

        let dashboard = app
            .clone()
            .oneshot(
                Request::get("/api/v1/performance/dashboard")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(dashboard.status(), StatusCode::OK);

        let types = app
            .oneshot(
                Request::get("/api/v1/deductions/types")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(types.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_route_is_mounted() {
        let response = router()
            .oneshot(
                Request::get("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
