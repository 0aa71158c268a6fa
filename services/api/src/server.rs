use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryDecisionLog, InMemoryReadingStore, LoggingEscalationPublisher, Monitor,
};
use crate::routes::{garden_routes, GardenApi};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use garden::config::AppConfig;
use garden::error::AppError;
use garden::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let policies = config.files.load_policies()?;
    let sensors = config.files.load_sensors()?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = InMemoryReadingStore::with_retention(sensors.retention());
    let decisions = Arc::new(InMemoryDecisionLog::default());
    let monitor = Monitor::from_config(
        Arc::new(store.clone()),
        decisions.clone(),
        Arc::new(LoggingEscalationPublisher),
        &policies,
        &sensors,
    )?;
    let period = sensors.evaluation_interval();
    let evaluation = spawn_evaluation_loop(monitor, period);

    let app = garden_routes(GardenApi { store, decisions })
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        policy_version = %policies.policy_version,
        every_seconds = period.as_secs(),
        "garden monitor ready"
    );

    let served = axum::serve(listener, app).await;
    evaluation.abort();
    served?;
    Ok(())
}

/// Run one cycle per tick. A failed cycle is logged and the next tick tries
/// again with the same carried state.
fn spawn_evaluation_loop(mut monitor: Monitor, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if let Err(err) = monitor.run_cycle(Utc::now()) {
                error!(%err, "evaluation cycle failed");
            }
        }
    })
}
