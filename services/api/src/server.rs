use crate::cli::ServeArgs;
use crate::infra::{build_service, AppState};
use crate::routes::with_careers_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use simulistic_careers::config::AppConfig;
use simulistic_careers::error::AppError;
use simulistic_careers::telemetry;
use simulistic_careers::workflows::careers::AdminAccess;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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

    let careers_service = Arc::new(build_service(&config)?);
    let access = AdminAccess::new(config.admin.access_token.clone());
    if !access.is_enabled() {
        warn!("ADMIN_ACCESS_TOKEN not set, review console routes answer 403");
    }

    let app = with_careers_routes(careers_service, access)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "careers service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
