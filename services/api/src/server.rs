use crate::cli::ServeArgs;
use crate::infra::{AppState, Services};
use crate::routes::with_workflow_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use school_ops::audit::TracingAuditSink;
use school_ops::config::AppConfig;
use school_ops::error::AppError;
use school_ops::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(args: ServeArgs) -> Result<(), AppError> {
    let config = with_overrides(AppConfig::load()?, args);
    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let ready = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: ready.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let services = Services::in_memory(Arc::new(TracingAuditSink), config.pagination);
    let app = with_workflow_routes(&services)
        .layer(Extension(state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    ready.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        page_size = config.pagination.default_page_size,
        "school operations service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Command-line flags win over the environment.
fn with_overrides(mut config: AppConfig, args: ServeArgs) -> AppConfig {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config
}
