use crate::cli::ServeArgs;
use crate::infra::{AppState, TracingMailer};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use castlyo::clock::SystemClock;
use castlyo::config::AppConfig;
use castlyo::error::AppError;
use castlyo::telemetry;
use castlyo::{AppDependencies, AppServices};
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

    let mailer = TracingMailer::for_environment(config.environment);
    if !mailer.reveals_variables() {
        warn!("mail is written to the log without template values; verification tokens are not delivered");
    }
    let services = AppServices::build(
        &config.auth,
        AppDependencies::in_memory(Arc::new(mailer), Arc::new(SystemClock)),
    );

    let app = with_operational_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "castlyo api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
