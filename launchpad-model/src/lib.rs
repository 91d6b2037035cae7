//! Core data model definitions shared across Launchpad crates.

pub mod app;
pub mod dashboard;

pub use app::{App, DE_SYSTEM_ID};
pub use dashboard::{DashboardApps, DashboardSection};
