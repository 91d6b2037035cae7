//! # Launchpad Server
//!
//! Thin axum front for [`launchpad_core::DashboardService`]. One route
//! assembles a user's dashboard; the other answers liveness probes.

pub mod errors;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
