use crate::cli::ServeArgs;
use crate::infra::{build_service, AppState};
use crate::routes::with_onboarding_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use onboard_ai::config::AppConfig;
use onboard_ai::error::AppError;
use onboard_ai::telemetry;
use onboard_ai::workflows::onboarding::SystemClock;
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

    let onboarding_service = Arc::new(build_service(&config.onboarding, Arc::new(SystemClock))?);

    let app = with_onboarding_routes(onboarding_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    let settings = &config.onboarding.settings;
    info!(
        ?config.environment,
        %addr,
        extraction_mode = ?config.onboarding.extraction_mode,
        demo_mode = settings.demo_mode,
        skip_rules = settings.skip_rules,
        "onboarding verification service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
