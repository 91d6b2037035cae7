//! Raw configuration sources: the TOML file and the environment.

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, str::FromStr};

use crate::util::{non_empty_var, parse_var};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    /// `[server]` table.
    #[serde(default)]
    pub server: FileServerConfig,
    /// `[database]` table.
    #[serde(default)]
    pub database: FileDatabaseConfig,
    /// `[permissions]` table.
    #[serde(default)]
    pub permissions: FilePermissionsConfig,
    /// `[apps]` table.
    #[serde(default)]
    pub apps: FileAppsConfig,
}

/// `[server]` table.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    /// Listen host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Listen port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// `[database]` table.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    /// PostgreSQL connection URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Pool size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

/// `[permissions]` table.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FilePermissionsConfig {
    /// Permissions service base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Group whose apps count as public.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_group: Option<String>,
    /// Humantime duration, e.g. `"10s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// `[apps]` table.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileAppsConfig {
    /// Favorites category index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorites_group_index: Option<i32>,
    /// Humantime duration, e.g. `"30days"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking_window: Option<String>,
    /// Rows per dashboard section; 0 for no cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_limit: Option<u64>,
}

/// A numeric variable that was set but did not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedVar {
    /// Variable name.
    pub name: &'static str,
    /// Raw value as set.
    pub value: String,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    /// `LAUNCHPAD_CONFIG`
    pub config_path: Option<PathBuf>,
    /// `SERVER_HOST`
    pub server_host: Option<String>,
    /// `SERVER_PORT`
    pub server_port: Option<u16>,
    /// `DATABASE_URL`
    pub database_url: Option<String>,
    /// `DB_MAX_CONNECTIONS`
    pub database_max_connections: Option<u32>,
    /// `PERMISSIONS_URL`
    pub permissions_url: Option<String>,
    /// `PUBLIC_GROUP`
    pub public_group: Option<String>,
    /// `PERMISSIONS_TIMEOUT`
    pub permissions_timeout: Option<String>,
    /// `FAVORITES_GROUP_INDEX`
    pub favorites_group_index: Option<i32>,
    /// `RANKING_WINDOW`
    pub ranking_window: Option<String>,
    /// `SECTION_LIMIT`
    pub section_limit: Option<u64>,
    /// Numeric variables that were present but unparsable; reported by the
    /// loader instead of being silently dropped.
    pub malformed: Vec<MalformedVar>,
}

impl EnvConfig {
    /// Reads every variable the loader understands.
    pub fn gather() -> Self {
        let mut malformed = Vec::new();
        let server_port = numeric_var("SERVER_PORT", &mut malformed);
        let database_max_connections =
            numeric_var("DB_MAX_CONNECTIONS", &mut malformed);
        let favorites_group_index =
            numeric_var("FAVORITES_GROUP_INDEX", &mut malformed);
        let section_limit = numeric_var("SECTION_LIMIT", &mut malformed);

        Self {
            config_path: non_empty_var("LAUNCHPAD_CONFIG").map(PathBuf::from),
            server_host: non_empty_var("SERVER_HOST"),
            server_port,
            database_url: non_empty_var("DATABASE_URL"),
            database_max_connections,
            permissions_url: non_empty_var("PERMISSIONS_URL"),
            public_group: non_empty_var("PUBLIC_GROUP"),
            permissions_timeout: non_empty_var("PERMISSIONS_TIMEOUT"),
            favorites_group_index,
            ranking_window: non_empty_var("RANKING_WINDOW"),
            section_limit,
            malformed,
        }
    }
}

fn numeric_var<T: FromStr>(
    name: &'static str,
    malformed: &mut Vec<MalformedVar>,
) -> Option<T> {
    match parse_var(name)? {
        Ok(value) => Some(value),
        Err(value) => {
            malformed.push(MalformedVar { name, value });
            None
        }
    }
}
