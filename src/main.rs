use anyhow::Context;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::{error, info};

use robobar::{
    create_app, init_observability, repositories::InMemorySessionRepository,
    services::OrderService, shutdown_observability, Config, Metrics, RequestLimits,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment().context("failed to load configuration")?;

    init_observability(&config.observability).context("failed to initialize observability")?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!(
        "Sessions: max={}, ttl={}s, sweep every {}s",
        config.sessions.max_sessions,
        config.sessions.session_ttl_seconds,
        config.sessions.sweep_interval_seconds
    );

    let metrics = Arc::new(Metrics::new().context("failed to register metrics")?);

    let repository = Arc::new(InMemorySessionRepository::new(
        config.sessions.max_sessions,
    ));
    let order_service = Arc::new(OrderService::new(repository, metrics.clone()));

    let sweeper = tokio::spawn(sweep_idle_sessions(
        order_service.clone(),
        config.sessions.session_ttl(),
        config.sessions.sweep_interval(),
    ));

    let app = create_app(
        order_service,
        metrics,
        RequestLimits {
            timeout: config.server.request_timeout(),
            max_request_size: config.server.max_request_size,
        },
    );

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .with_context(|| format!("invalid host: {}", config.server.host))?,
        config.server.port,
    );
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    shutdown_observability().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Periodically drop sessions nobody has touched within the TTL
async fn sweep_idle_sessions(order_service: Arc<OrderService>, ttl: Duration, every: Duration) {
    let mut interval = tokio::time::interval(every);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        if let Err(e) = order_service.purge_idle_sessions(ttl).await {
            error!("Idle session sweep failed: {}", e);
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
