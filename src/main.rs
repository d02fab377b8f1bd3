use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockroom::cli::{self, Cli};
use stockroom::config::Config;
use stockroom::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration. Client commands only read the log level from it, and
    // `config check` reports a broken file itself.
    let config = match cli.command {
        None => Config::load(&cli.config)?,
        Some(_) => Config::load(&cli.config).unwrap_or_default(),
    };

    // Initialize logging (the terminal view owns the screen, so it logs nothing)
    let interactive = matches!(cli.command, Some(cli::Commands::Tui));
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    if !interactive {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
            )
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if cli.command.is_some() {
        return cli::run_command(&cli).await;
    }

    tracing::info!("Starting stockroom v{}", env!("CARGO_PKG_VERSION"));

    let mut state = AppState::from_config(config.clone());
    if config.metrics.enabled {
        let handle = stockroom::api::metrics::init_metrics()
            .context("Failed to install Prometheus recorder")?;
        state = state.with_metrics(handle);
    }
    let state = Arc::new(state);

    tracing::info!(
        materials = state.inventory.len(),
        users = state.credentials.usernames().count(),
        "Inventory ready (in memory, not persisted)"
    );

    let app = stockroom::api::create_router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
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

    tracing::info!("Shutdown signal received");
}
