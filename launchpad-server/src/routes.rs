use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use launchpad_model::DashboardApps;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::{
    errors::{AppError, AppResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub username: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/apps/dashboard", get(dashboard_handler))
        .route("/healthz", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dashboard_handler(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<DashboardApps>> {
    let username = query.username.trim();
    if username.is_empty() {
        return Err(AppError::bad_request("username is required"));
    }

    let cancel = state.shutdown.child_token();
    let dashboard = state.dashboard.load(username, &cancel).await?;
    debug!(username, "dashboard assembled");
    Ok(Json(dashboard))
}

async fn health_handler() -> &'static str {
    "ok"
}
