//! Composes [`Config`] from file and environment sources.

pub mod error;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::{debug, info};
use url::Url;

use crate::models::{
    AppsConfig, Config, DatabaseConfig, LookbackWindow, PermissionsConfig,
    ServerConfig,
    sources::{EnvConfig, FileConfig},
};
use error::ConfigLoadError;

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] =
    ["launchpad.toml", "config/launchpad.toml"];

/// Listen host when none is configured.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Listen port when none is configured.
pub const DEFAULT_PORT: u16 = 3000;
/// Pool size when none is configured.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
/// Public group when none is configured.
pub const DEFAULT_PUBLIC_GROUP: &str = "de-public";
/// Permissions request timeout when none is configured.
pub const DEFAULT_PERMISSIONS_TIMEOUT: Duration = Duration::from_secs(30);
/// Favorites category index when none is configured.
pub const DEFAULT_FAVORITES_GROUP_INDEX: i32 = 0;
/// Rows per dashboard section when none is configured.
pub const DEFAULT_SECTION_LIMIT: u64 = 10;

/// Builder for loading a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Looks for `.env` and the TOML file in their default places.
    pub fn new() -> Self {
        Self::default()
    }

    /// TOML file that must exist.
    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// `.env` file to apply instead of `./.env`.
    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Applies `.env`, gathers the environment, reads the TOML file if one is
    /// found and composes the result.
    pub fn load(&self) -> Result<Config, ConfigLoadError> {
        let env_file_loaded = match &self.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        }
        .or_else(|err| match err {
            dotenvy::Error::Io(_) => Ok(false),
            _ => Err(err),
        })?;
        debug!(env_file_loaded, "environment gathered");

        let env = EnvConfig::gather();
        let file = self.load_file_config(&env)?;
        let config = compose(file.unwrap_or_default(), env)?;

        info!(
            bind = %config.server.bind_address(),
            permissions = %config.permissions.base_url,
            public_group = %config.permissions.public_group,
            ranking_window = %config.apps.ranking_window.to_pg_interval(),
            "configuration loaded"
        );
        Ok(config)
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<Option<FileConfig>, ConfigLoadError> {
        let explicit = self.config_path.as_ref().or(env.config_path.as_ref());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig {
                    path: path.clone(),
                });
            }
            Some(path) => path.clone(),
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(found) => found,
                None => return Ok(None),
            },
        };

        read_file_config(&path).map(Some)
    }
}

/// Reads and parses one TOML file.
pub fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Merges file and environment values; the environment wins.
pub fn compose(
    file: FileConfig,
    env: EnvConfig,
) -> Result<Config, ConfigLoadError> {
    if let Some(bad) = env.malformed.into_iter().next() {
        return Err(ConfigLoadError::InvalidNumber {
            name: bad.name,
            value: bad.value,
        });
    }

    let server = ServerConfig {
        host: env
            .server_host
            .or(file.server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: env.server_port.or(file.server.port).unwrap_or(DEFAULT_PORT),
    };

    let database = DatabaseConfig {
        url: env.database_url.or(file.database.url).ok_or(
            ConfigLoadError::MissingSetting {
                setting: "database.url",
                env: "DATABASE_URL",
            },
        )?,
        max_connections: env
            .database_max_connections
            .or(file.database.max_connections)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS),
    };

    let raw_url = env.permissions_url.or(file.permissions.base_url).ok_or(
        ConfigLoadError::MissingSetting {
            setting: "permissions.base_url",
            env: "PERMISSIONS_URL",
        },
    )?;
    let base_url = Url::parse(&raw_url).map_err(|source| {
        ConfigLoadError::InvalidPermissionsUrl {
            value: raw_url.clone(),
            source,
        }
    })?;
    let timeout = match env.permissions_timeout.or(file.permissions.timeout) {
        Some(raw) => humantime::parse_duration(raw.trim()).map_err(
            |source| ConfigLoadError::InvalidTimeout { value: raw, source },
        )?,
        None => DEFAULT_PERMISSIONS_TIMEOUT,
    };
    let permissions = PermissionsConfig {
        base_url,
        public_group: env
            .public_group
            .or(file.permissions.public_group)
            .unwrap_or_else(|| DEFAULT_PUBLIC_GROUP.to_string()),
        timeout,
    };

    let ranking_window = match env.ranking_window.or(file.apps.ranking_window)
    {
        Some(raw) => LookbackWindow::parse(&raw)?,
        None => LookbackWindow::default(),
    };
    // Zero switches the per-section limit off.
    let section_limit = match env.section_limit.or(file.apps.section_limit) {
        Some(0) => None,
        Some(limit) => Some(limit),
        None => Some(DEFAULT_SECTION_LIMIT),
    };
    let apps = AppsConfig {
        favorites_group_index: env
            .favorites_group_index
            .or(file.apps.favorites_group_index)
            .unwrap_or(DEFAULT_FAVORITES_GROUP_INDEX),
        ranking_window,
        section_limit,
    };

    Ok(Config {
        server,
        database,
        permissions,
        apps,
    })
}
