use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryPropertyStore, StaticSessionDirectory};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use listing_intake::config::AppConfig;
use listing_intake::error::AppError;
use listing_intake::intake::{SchemaRegistry, ValidationEngine, WizardSessions};
use listing_intake::telemetry;
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

    // A misconfigured step catalog must never serve traffic.
    let registry = SchemaRegistry::standard();
    registry.verify()?;
    let engine = Arc::new(ValidationEngine::new(registry));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryPropertyStore::default());
    let sessions = Arc::new(WizardSessions::new(engine, store));
    let directory = Arc::new(StaticSessionDirectory::default());

    let app = with_intake_routes(sessions, directory)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "listing intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
