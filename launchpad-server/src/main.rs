//! # Launchpad Server
//!
//! Serves the assembled app dashboard: popular/featured, public, recently
//! added and recently used listings for one user, fetched concurrently from
//! PostgreSQL after the public app set is resolved through the permissions
//! service.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use launchpad_config::{ConfigLoader, logging::init_tracing};
use launchpad_core::{
    DashboardService, DashboardSettings, MIGRATOR, PermissionsClient,
    database::{PostgresAppsRepository, connect},
};
use launchpad_server::{AppState, create_router};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "launchpad-server")]
#[command(about = "Serves per-user app catalog dashboards")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "LAUNCHPAD_CONFIG")]
    config: Option<PathBuf>,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Apply pending schema migrations before serving
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path.clone());
    }
    if let Some(path) = &cli.env_file {
        loader = loader.with_env_file(path.clone());
    }
    let mut config = loader.load().context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let pool = connect(&config.database.url, config.database.max_connections)
        .await
        .context("failed to connect to PostgreSQL")?;

    if cli.migrate {
        MIGRATOR
            .run(&pool)
            .await
            .context("failed to apply migrations")?;
        info!("migrations applied");
    }

    let permissions = PermissionsClient::new(
        config.permissions.base_url.clone(),
        config.permissions.timeout,
    )
    .context("failed to build permissions client")?;

    let dashboard = DashboardService::new(
        Arc::new(PostgresAppsRepository::new(pool.clone())),
        Arc::new(permissions),
        DashboardSettings {
            public_group: config.permissions.public_group.clone(),
            favorites_group_index: config.apps.favorites_group_index,
            ranking_window: config.apps.ranking_window.to_pg_interval(),
            section_limit: config.apps.section_limit,
        },
    );

    let shutdown = CancellationToken::new();
    let router = create_router(AppState::new(dashboard, shutdown.clone()));

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .with_context(|| {
            format!("invalid bind address {}", config.server.bind_address())
        })?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Starting Launchpad server on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    pool.close().await;
    info!("Launchpad server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
    shutdown.cancel();
}
