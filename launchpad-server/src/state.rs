use std::sync::Arc;

use launchpad_core::DashboardService;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct AppState {
    pub dashboard: Arc<DashboardService>,
    /// Cancelled on shutdown; requests derive their own child tokens.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(dashboard: DashboardService, shutdown: CancellationToken) -> Self {
        Self {
            dashboard: Arc::new(dashboard),
            shutdown,
        }
    }
}
