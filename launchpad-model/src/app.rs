//! The catalog entry every listing returns.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tag identifying the catalog backend every listed app comes from.
pub const DE_SYSTEM_ID: &str = "de";

/// One catalog entry as projected by the listing queries.
///
/// Values are request-scoped views: `is_favorite` and `is_public` are
/// computed by the query for the requesting user and public-identifier set,
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct App {
    /// Catalog identifier.
    pub id: Uuid,
    /// Always [`DE_SYSTEM_ID`].
    pub system_id: String,
    /// Display name.
    pub name: String,
    /// Free-text description, empty when none was given.
    pub description: String,
    /// Link to the app's documentation page.
    pub wiki_url: Option<String>,
    /// When the app was integrated into the catalog.
    pub integration_date: Option<DateTime<Utc>>,
    /// Last edit of the catalog entry.
    pub edited_date: Option<DateTime<Utc>>,
    /// Username of the integrator.
    pub username: String,
    /// Number of qualifying job runs; only set by the popularity ranking.
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub job_count: Option<i64>,
    /// In the requesting user's favorites category.
    pub is_favorite: bool,
    /// In the resolved public-identifier set.
    pub is_public: bool,
    /// Latest job start by the requesting user; only set by the usage ranking.
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub most_recent_start_date: Option<DateTime<Utc>>,
}
