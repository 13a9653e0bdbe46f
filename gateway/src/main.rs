use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenv::dotenv;
use tokio::signal;

use gateway::config::GatewayConfig;
use gateway::observability::Observability;
use gateway::state::AppState;
use gateway::store::{self, PgPlayerStatsStore};
use gateway::routes;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;
    let obs = Observability::init(config.log_format)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting stew gateway");
    tracing::info!(
        log_format = ?config.log_format,
        listen_address = %config.api.listen_address,
        listen_port = config.api.listen_port,
        known_protocols = config.known_protocols.len(),
        "Config loaded"
    );

    tracing::info!(
        host = %config.database.host,
        port = config.database.port,
        database = %config.database.database,
        "Connecting to database"
    );
    let pool = store::connect(&config.database).await.with_context(|| {
        format!(
            "failed to connect to {}:{}/{}",
            config.database.host, config.database.port, config.database.database
        )
    })?;
    tracing::info!(
        min_connections = config.database.min_connections,
        max_connections = config.database.max_connections,
        "Database pool ready"
    );

    let store = PgPlayerStatsStore::new(pool.clone(), config.database.timeout);
    let state = AppState::new(
        Arc::new(store),
        config.known_protocols,
        obs.registry,
        obs.metrics,
        config.api.max_body_bytes,
    );

    tracing::info!("Loading router");
    let app = routes::build_router(state);

    let listener =
        tokio::net::TcpListener::bind((config.api.listen_address.as_str(), config.api.listen_port))
            .await
            .with_context(|| {
                format!(
                    "failed to bind {}:{}",
                    config.api.listen_address, config.api.listen_port
                )
            })?;
    tracing::info!("API server listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    pool.close().await;
    tracing::info!("Gateway stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
