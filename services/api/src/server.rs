use crate::cli::ServeArgs;
use crate::infra::{load_dataset, resolve_data_dir, AppState};
use crate::routes::router;
use axum_prometheus::PrometheusMetricLayer;
use dealer_kpi::config::AppConfig;
use dealer_kpi::error::AppError;
use dealer_kpi::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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

    let data_dir = resolve_data_dir(&config, args.data_dir.take());
    let dataset = load_dataset(&data_dir)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        dataset,
        scoring: config.scoring,
    };

    let app = router(state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        data_dir = %data_dir.display(),
        amber_tolerance = config.scoring.amber_tolerance,
        "dealer KPI service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
