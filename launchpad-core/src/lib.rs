//! # Launchpad Core
//!
//! Answers "which apps are relevant to this user" by composing several
//! filtered, ranked listings of the app catalog and running them
//! concurrently.
//!
//! - [`database`]: the four listing queries (popular/featured, public,
//!   recently added, recently used), their execution options and the
//!   error-first fan-out dispatcher
//! - [`permissions`]: client for the service that resolves public apps
//! - [`dashboard`]: resolves the public set and assembles every listing
//! - [`error`]: error taxonomy shared by the above
//!
//! ```no_run
//! use launchpad_core::database::{
//!     AppsQueryConfig, AppsRepository, PostgresAppsRepository, with_limit,
//! };
//!
//! async fn popular(pool: sqlx::PgPool) -> launchpad_core::error::Result<()> {
//!     let repo = PostgresAppsRepository::new(pool);
//!     let cfg = AppsQueryConfig {
//!         username: "ipcdev".into(),
//!         groups_index: 0,
//!         app_ids: vec![],
//!         start_date_interval: "2592000 seconds".into(),
//!     };
//!     let apps = repo.popular_featured_apps(&cfg, &[with_limit(10)]).await?;
//!     println!("{} popular apps", apps.len());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod dashboard;
pub mod database;
pub mod error;
pub mod permissions;

/// Schema migrations for the catalog tables.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use dashboard::{DashboardService, DashboardSettings};
pub use error::{GatewayError, LaunchpadError, Result};
pub use permissions::{PermissionsClient, PermissionsGateway};
