//! Configuration loading for Launchpad.
//!
//! Values come from an optional TOML file and from the environment (after
//! `.env` is applied); the environment wins. The ranking window is parsed as
//! a duration here so the listing queries only ever see interval text this
//! crate rendered.

pub mod loader;
pub mod logging;
pub mod models;
pub mod util;

pub use loader::{ConfigLoader, error::ConfigLoadError};
pub use models::{
    AppsConfig, Config, DatabaseConfig, LookbackWindow, PermissionsConfig,
    ServerConfig,
};
