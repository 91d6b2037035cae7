//! Resolved configuration types.

pub mod sources;

use std::{fmt, time::Duration};

use url::Url;

use crate::loader::error::ConfigLoadError;

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listener.
    pub server: ServerConfig,
    /// PostgreSQL pool.
    pub database: DatabaseConfig,
    /// Permissions service client.
    pub permissions: PermissionsConfig,
    /// Listing parameters.
    pub apps: AppsConfig,
}

/// Where the HTTP server listens.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `SERVER_HOST`, default `0.0.0.0`.
    pub host: String,
    /// `SERVER_PORT`, default 3000.
    pub port: u16,
}

impl ServerConfig {
    /// `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Connection settings; the URL is redacted from `Debug`.
#[derive(Clone)]
pub struct DatabaseConfig {
    /// `DATABASE_URL`, required.
    pub url: String,
    /// `DB_MAX_CONNECTIONS`, default 10.
    pub max_connections: u32,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Permissions service endpoint and public group.
#[derive(Debug, Clone)]
pub struct PermissionsConfig {
    /// `PERMISSIONS_URL`, required.
    pub base_url: Url,
    /// `PUBLIC_GROUP`, default `de-public`.
    pub public_group: String,
    /// `PERMISSIONS_TIMEOUT`, default 30s.
    pub timeout: Duration,
}

/// Inputs shared by every listing.
#[derive(Debug, Clone)]
pub struct AppsConfig {
    /// `FAVORITES_GROUP_INDEX`, default 0.
    pub favorites_group_index: i32,
    /// `RANKING_WINDOW`, default 30 days.
    pub ranking_window: LookbackWindow,
    /// `SECTION_LIMIT`, default 10; `None` when configured as 0.
    pub section_limit: Option<u64>,
}

/// How far back job runs count towards the usage rankings.
///
/// Built only from a parsed duration, so its interval text is safe to splice
/// into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow(Duration);

impl LookbackWindow {
    /// Rejects windows shorter than one second.
    pub fn new(duration: Duration) -> Result<Self, ConfigLoadError> {
        if duration.as_secs() == 0 {
            return Err(ConfigLoadError::InvalidRankingWindow {
                value: humantime::format_duration(duration).to_string(),
                reason: "must be at least one second".into(),
            });
        }
        Ok(Self(duration))
    }

    /// Parses humantime syntax such as `30days` or `2w 3d`.
    pub fn parse(raw: &str) -> Result<Self, ConfigLoadError> {
        let duration = humantime::parse_duration(raw.trim()).map_err(|err| {
            ConfigLoadError::InvalidRankingWindow {
                value: raw.to_string(),
                reason: err.to_string(),
            }
        })?;
        Self::new(duration)
    }

    /// The parsed duration.
    pub fn duration(&self) -> Duration {
        self.0
    }

    /// PostgreSQL interval text, e.g. `"2592000 seconds"`.
    pub fn to_pg_interval(&self) -> String {
        format!("{} seconds", self.0.as_secs())
    }
}

impl Default for LookbackWindow {
    fn default() -> Self {
        Self(Duration::from_secs(30 * 24 * 60 * 60))
    }
}
