use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryRoleDirectory, InMemoryVettingStore, LoggingStatusNotifier};
use crate::routes::with_vetting_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use membergate::config::AppConfig;
use membergate::error::AppError;
use membergate::telemetry;
use membergate::workflows::vetting::{
    AccessControlGate, AccessGateConfig, StatusLookup, TtlStatusCache, UserId,
    VettingRouterState, VettingWorkflowService,
};
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

    let store = Arc::new(InMemoryVettingStore::default());
    let directory = Arc::new(InMemoryRoleDirectory::default());
    directory.grant_administrator(&UserId(config.vetting.bootstrap_admin.clone()));
    let notifier = Arc::new(LoggingStatusNotifier);
    let cache = Arc::new(TtlStatusCache::new(config.vetting.access_cache_ttl()));

    let state = VettingRouterState {
        service: Arc::new(VettingWorkflowService::new(
            store.clone(),
            directory.clone(),
            notifier,
            cache.clone(),
        )),
        gate: Arc::new(AccessControlGate::new(
            store.clone(),
            cache,
            AccessGateConfig {
                support_contact: config.vetting.support_contact.clone(),
            },
        )),
        lookup: Arc::new(StatusLookup::new(store)),
    };

    let app = with_vetting_routes(state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "membership vetting service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
