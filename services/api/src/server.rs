use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryApprovalStore, InMemoryRenewalStore, LoggingNotificationSender,
};
use crate::routes::with_licensing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use parkguide::config::AppConfig;
use parkguide::error::AppError;
use parkguide::telemetry;
use parkguide::workflows::licensing::{LicensingService, SystemClock};
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

    let service = Arc::new(LicensingService::new(
        Arc::new(InMemoryApprovalStore::default()),
        Arc::new(InMemoryRenewalStore::default()),
        Arc::new(LoggingNotificationSender),
        Arc::new(SystemClock),
        config.sweep.dispatch_timeout(),
    ));

    let scheduler_handle = service.start_scheduler(config.sweep.interval());

    let app = with_licensing_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "license lifecycle service ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let an in-flight sweep finish before the runtime winds down.
    scheduler_handle.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
    }
}
