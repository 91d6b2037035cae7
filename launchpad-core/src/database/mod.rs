//! PostgreSQL access for the app catalog listings.

pub mod apps;
mod executor;
pub mod fan_out;
mod fragments;
pub mod options;

pub use apps::{AppsFanOut, AppsQueryConfig, AppsRepository, PostgresAppsRepository};
pub use fan_out::{FanOutReceiver, FanOutSender, dispatch, fan_out_channel};
pub use options::{
    QueryOption, QuerySettings, SharedTransaction, with_limit, with_offset,
    with_transaction,
};

use std::time::Duration;

use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use tracing::info;

use crate::error::{LaunchpadError, Result};

/// Opens the shared pool the listings read through.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let connect_options: PgConnectOptions = database_url
        .parse()
        .map_err(LaunchpadError::Connectivity)?;

    let pool = PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await?;

    info!(max_connections, "database pool initialized");
    Ok(pool)
}
