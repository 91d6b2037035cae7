//! Tracing subscriber bootstrap.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Quieter defaults; override with `RUST_LOG`.
pub const DEFAULT_FILTER: &str = "info,launchpad=debug,tower_http=warn";

/// Installs the global subscriber: `RUST_LOG` (or [`DEFAULT_FILTER`]) and
/// the fmt layer.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
