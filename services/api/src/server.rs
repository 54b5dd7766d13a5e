use crate::cli::ServeArgs;
use crate::demo::seed_cooperative;
use crate::infra::{AppState, InMemoryAuditLog};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use dairy_coop::clock::{Clock, SystemClock};
use dairy_coop::config::{AppConfig, AppEnvironment};
use dairy_coop::error::AppError;
use dairy_coop::gateway::InMemoryGateway;
use dairy_coop::telemetry;
use dairy_coop::workflows::deductions::DeductionService;
use dairy_coop::workflows::performance::PerformanceService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let gateway = Arc::new(InMemoryGateway::new());
    if config.environment != AppEnvironment::Production {
        seed_cooperative(&gateway, clock.today());
        info!("seeded in-memory gateway with demo cooperative");
    }

    let performance_service = Arc::new(PerformanceService::new(
        gateway.clone(),
        clock.clone(),
        config.dashboard.clone(),
    ));
    let deduction_service = Arc::new(DeductionService::new(
        gateway,
        Arc::new(InMemoryAuditLog::default()),
        clock,
    ));

    let app = with_service_routes(performance_service, deduction_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "dairy cooperative back office ready");

    axum::serve(listener, app).await?;
    Ok(())
}
