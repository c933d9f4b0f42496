use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryApplicationBackend, InMemoryContractLedger, InMemoryDocumentStore,
};
use crate::routes::with_workflow_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use leaseflow::config::AppConfig;
use leaseflow::error::AppError;
use leaseflow::telemetry;
use leaseflow::workflows::application::ApplicationDesk;
use leaseflow::workflows::contract::ContractService;
use leaseflow::workflows::platform::PlatformClient;
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

    // A configured platform token routes both workflows at the real
    // marketplace API; without one the service runs self-contained on the
    // in-memory gateways.
    let routes = if config.platform.api_token.is_some() {
        let client = Arc::new(PlatformClient::new(&config.platform)?);
        let desk = Arc::new(ApplicationDesk::new(
            client.clone(),
            client.clone(),
            config.verification.clone(),
        ));
        let contracts = Arc::new(ContractService::new(client));
        info!(base_url = %config.platform.base_url, "routing workflows at the platform API");
        with_workflow_routes(desk, contracts)
    } else {
        let desk = Arc::new(ApplicationDesk::new(
            Arc::new(InMemoryDocumentStore::default()),
            Arc::new(InMemoryApplicationBackend::default()),
            config.verification.clone(),
        ));
        let contracts = Arc::new(ContractService::new(Arc::new(
            InMemoryContractLedger::with_demo_contract(),
        )));
        info!("no platform token configured; running on in-memory gateways");
        with_workflow_routes(desk, contracts)
    };

    let app = routes
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "leaseflow workflow service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
