//! Error taxonomy for listings, fan-out and the permissions gateway.

use reqwest::StatusCode;
use thiserror::Error;

/// Failures resolving the public-identifier set.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Transport failure or timeout.
    #[error("permissions request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Any status other than 200.
    #[error("permissions service returned status {0}")]
    Status(StatusCode),

    /// Body did not match the expected shape.
    #[error("malformed permissions response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Base URL cannot carry path segments.
    #[error("invalid permissions url: {0}")]
    InvalidUrl(String),
}

/// Every failure a listing or dashboard call can report.
#[derive(Error, Debug)]
pub enum LaunchpadError {
    /// Store unreachable, pool exhausted or closed, IO or TLS failure.
    #[error("database unreachable: {0}")]
    Connectivity(#[source] sqlx::Error),

    /// The statement itself failed.
    #[error("query execution failed: {0}")]
    QueryExecution(#[source] sqlx::Error),

    /// A row did not map onto `App`.
    #[error("failed to scan app row: {0}")]
    Scan(#[source] sqlx::Error),

    /// Resolving the public set failed.
    #[error("permissions lookup failed: {0}")]
    Gateway(#[from] GatewayError),

    /// The dispatch token was cancelled first.
    #[error("query cancelled")]
    Cancelled,

    /// A dispatched task went away without reporting.
    #[error("query task ended without reporting an outcome")]
    Dispatch,
}

impl LaunchpadError {
    /// Whether the failure came from the permissions service.
    pub fn is_gateway(&self) -> bool {
        matches!(self, LaunchpadError::Gateway(_))
    }
}

impl From<sqlx::Error> for LaunchpadError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(
            err,
            sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed
        ) {
            return LaunchpadError::Connectivity(err);
        }

        if matches!(
            err,
            sqlx::Error::ColumnDecode { .. }
                | sqlx::Error::ColumnNotFound(_)
                | sqlx::Error::ColumnIndexOutOfBounds { .. }
                | sqlx::Error::Decode(_)
                | sqlx::Error::TypeNotFound { .. }
        ) {
            return LaunchpadError::Scan(err);
        }

        LaunchpadError::QueryExecution(err)
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, LaunchpadError>;
