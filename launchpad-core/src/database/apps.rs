//! The four app listings: popular/featured, public, recently added and
//! recently used.
//!
//! Every listing projects the same [`App`] shape, computes `is_favorite`
//! through the shared favorites fragment and never returns deleted or
//! disabled apps. They differ in join set, visibility filter and ranking.

use std::sync::Arc;

use async_trait::async_trait;
use launchpad_model::App;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    database::{
        executor::fetch_apps,
        fan_out::{FanOutSender, dispatch},
        fragments::{
            APP_COLUMNS, APP_GROUP_BY, LISTABLE, push_in_app_ids,
            push_is_favorite, push_lookback_cutoff,
        },
        options::{QueryOption, QuerySettings},
    },
    error::Result,
};

/// Parameters for one listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppsQueryConfig {
    /// Requesting user; drives `is_favorite` and the per-user listings.
    pub username: String,
    /// Index of the favorites category under the user's workspace root.
    pub groups_index: i32,
    /// Public-identifier set resolved from the permissions service.
    pub app_ids: Vec<String>,
    /// PostgreSQL interval text bounding how far back job runs count, e.g.
    /// `"2592000 seconds"`. It is interpolated into the statement text, so
    /// only pass values rendered from a parsed duration.
    pub start_date_interval: String,
}

/// Synchronous forms of the four listings.
#[async_trait]
pub trait AppsRepository: Send + Sync {
    /// Public apps ranked by how many jobs ran them inside the lookback
    /// window. Apps that never ran are kept with a count of zero.
    async fn popular_featured_apps(
        &self,
        cfg: &AppsQueryConfig,
        opts: &[QueryOption],
    ) -> Result<Vec<App>>;

    /// Public apps, newest integration first.
    async fn public_apps(
        &self,
        username: &str,
        groups_index: i32,
        public_app_ids: &[String],
        opts: &[QueryOption],
    ) -> Result<Vec<App>>;

    /// Apps integrated by `username`, newest first. `public_app_ids` only
    /// feeds the `is_public` flag; it does not filter.
    async fn recently_added_apps(
        &self,
        username: &str,
        groups_index: i32,
        public_app_ids: &[String],
        opts: &[QueryOption],
    ) -> Result<Vec<App>>;

    /// Apps `username` ran inside the lookback window, most recent run
    /// first, one row per app.
    async fn recently_used_apps(
        &self,
        cfg: &AppsQueryConfig,
        opts: &[QueryOption],
    ) -> Result<Vec<App>>;
}

/// [`AppsRepository`] over a PostgreSQL pool.
#[derive(Clone, Debug)]
pub struct PostgresAppsRepository {
    pool: PgPool,
}

impl PostgresAppsRepository {
    /// Listings run on `pool` unless a transaction option is given.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppsRepository for PostgresAppsRepository {
    async fn popular_featured_apps(
        &self,
        cfg: &AppsQueryConfig,
        opts: &[QueryOption],
    ) -> Result<Vec<App>> {
        let settings = QuerySettings::from_options(opts);
        let qb = popular_featured_query(cfg);
        fetch_apps(&self.pool, qb, &settings, "popular featured apps").await
    }

    async fn public_apps(
        &self,
        username: &str,
        groups_index: i32,
        public_app_ids: &[String],
        opts: &[QueryOption],
    ) -> Result<Vec<App>> {
        let settings = QuerySettings::from_options(opts);
        let qb = public_query(username, groups_index, public_app_ids);
        fetch_apps(&self.pool, qb, &settings, "public apps").await
    }

    async fn recently_added_apps(
        &self,
        username: &str,
        groups_index: i32,
        public_app_ids: &[String],
        opts: &[QueryOption],
    ) -> Result<Vec<App>> {
        let settings = QuerySettings::from_options(opts);
        let qb = recently_added_query(username, groups_index, public_app_ids);
        fetch_apps(&self.pool, qb, &settings, "recently added apps").await
    }

    async fn recently_used_apps(
        &self,
        cfg: &AppsQueryConfig,
        opts: &[QueryOption],
    ) -> Result<Vec<App>> {
        let settings = QuerySettings::from_options(opts);
        let qb = recently_used_query(cfg);
        fetch_apps(&self.pool, qb, &settings, "recently used apps").await
    }
}

/// Fan-out forms of the listings.
///
/// Each call spawns the listing on its own task and reports through
/// `sender`: the error channel first (`Some(err)` or `None`), then, only on
/// success, the rows.
pub trait AppsFanOut {
    /// Dispatches [`AppsRepository::popular_featured_apps`].
    fn popular_featured_apps_async(
        &self,
        cfg: Arc<AppsQueryConfig>,
        opts: Vec<QueryOption>,
        cancel: CancellationToken,
        sender: FanOutSender,
    ) -> JoinHandle<()>;

    /// Dispatches [`AppsRepository::public_apps`] with `cfg.app_ids`.
    fn public_apps_async(
        &self,
        cfg: Arc<AppsQueryConfig>,
        opts: Vec<QueryOption>,
        cancel: CancellationToken,
        sender: FanOutSender,
    ) -> JoinHandle<()>;

    /// Dispatches [`AppsRepository::recently_added_apps`] with `cfg.app_ids`.
    fn recently_added_apps_async(
        &self,
        cfg: Arc<AppsQueryConfig>,
        opts: Vec<QueryOption>,
        cancel: CancellationToken,
        sender: FanOutSender,
    ) -> JoinHandle<()>;

    /// Dispatches [`AppsRepository::recently_used_apps`].
    fn recently_used_apps_async(
        &self,
        cfg: Arc<AppsQueryConfig>,
        opts: Vec<QueryOption>,
        cancel: CancellationToken,
        sender: FanOutSender,
    ) -> JoinHandle<()>;
}

impl<R> AppsFanOut for Arc<R>
where
    R: AppsRepository + ?Sized + 'static,
{
    fn popular_featured_apps_async(
        &self,
        cfg: Arc<AppsQueryConfig>,
        opts: Vec<QueryOption>,
        cancel: CancellationToken,
        sender: FanOutSender,
    ) -> JoinHandle<()> {
        let repo = Arc::clone(self);
        dispatch("popular featured apps", cancel, sender, async move {
            repo.popular_featured_apps(&cfg, &opts).await
        })
    }

    fn public_apps_async(
        &self,
        cfg: Arc<AppsQueryConfig>,
        opts: Vec<QueryOption>,
        cancel: CancellationToken,
        sender: FanOutSender,
    ) -> JoinHandle<()> {
        let repo = Arc::clone(self);
        dispatch("public apps", cancel, sender, async move {
            repo.public_apps(&cfg.username, cfg.groups_index, &cfg.app_ids, &opts)
                .await
        })
    }

    fn recently_added_apps_async(
        &self,
        cfg: Arc<AppsQueryConfig>,
        opts: Vec<QueryOption>,
        cancel: CancellationToken,
        sender: FanOutSender,
    ) -> JoinHandle<()> {
        let repo = Arc::clone(self);
        dispatch("recently added apps", cancel, sender, async move {
            repo.recently_added_apps(
                &cfg.username,
                cfg.groups_index,
                &cfg.app_ids,
                &opts,
            )
            .await
        })
    }

    fn recently_used_apps_async(
        &self,
        cfg: Arc<AppsQueryConfig>,
        opts: Vec<QueryOption>,
        cancel: CancellationToken,
        sender: FanOutSender,
    ) -> JoinHandle<()> {
        let repo = Arc::clone(self);
        dispatch("recently used apps", cancel, sender, async move {
            repo.recently_used_apps(&cfg, &opts).await
        })
    }
}

pub(crate) fn popular_featured_query(
    cfg: &AppsQueryConfig,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
    qb.push(APP_COLUMNS);
    qb.push(", COUNT(j.id) AS job_count, ");
    push_is_favorite(&mut qb, &cfg.username, cfg.groups_index, "a.id");
    qb.push(", true AS is_public");
    qb.push(
        " FROM app_listing a \
         LEFT JOIN jobs j ON j.app_id = CAST(a.id AS TEXT) \
         WHERE ",
    );
    push_in_app_ids(&mut qb, "a.id", &cfg.app_ids);
    qb.push(" AND ");
    qb.push(LISTABLE);
    qb.push(" AND a.integration_date IS NOT NULL AND (j.start_date >= ");
    push_lookback_cutoff(&mut qb, &cfg.start_date_interval);
    qb.push(" OR j.start_date IS NULL)");
    qb.push(APP_GROUP_BY);
    qb.push(" ORDER BY job_count DESC");
    qb
}

pub(crate) fn public_query(
    username: &str,
    groups_index: i32,
    public_app_ids: &[String],
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
    qb.push(APP_COLUMNS);
    qb.push(", ");
    push_is_favorite(&mut qb, username, groups_index, "a.id");
    qb.push(", true AS is_public FROM app_listing a WHERE ");
    push_in_app_ids(&mut qb, "a.id", public_app_ids);
    qb.push(" AND ");
    qb.push(LISTABLE);
    qb.push(" AND a.integration_date IS NOT NULL");
    qb.push(" ORDER BY a.integration_date DESC");
    qb
}

pub(crate) fn recently_added_query(
    username: &str,
    groups_index: i32,
    public_app_ids: &[String],
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
    qb.push(APP_COLUMNS);
    qb.push(", ");
    push_is_favorite(&mut qb, username, groups_index, "a.id");
    qb.push(", ");
    push_in_app_ids(&mut qb, "a.id", public_app_ids);
    qb.push(" AS is_public FROM app_listing a WHERE ");
    qb.push(LISTABLE);
    qb.push(" AND a.integrator_username = ");
    qb.push_bind(username.to_owned());
    qb.push(" ORDER BY a.integration_date DESC");
    qb
}

pub(crate) fn recently_used_query(
    cfg: &AppsQueryConfig,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
    qb.push(APP_COLUMNS);
    qb.push(", ");
    push_is_favorite(&mut qb, &cfg.username, cfg.groups_index, "a.id");
    qb.push(", ");
    push_in_app_ids(&mut qb, "a.id", &cfg.app_ids);
    qb.push(
        " AS is_public, MAX(j.start_date) AS most_recent_start_date \
         FROM jobs j \
         JOIN users u ON j.user_id = u.id \
         JOIN app_listing a ON CAST(a.id AS TEXT) = j.app_id \
         WHERE u.username = ",
    );
    qb.push_bind(cfg.username.clone());
    qb.push(" AND ");
    qb.push(LISTABLE);
    qb.push(" AND j.start_date > ");
    push_lookback_cutoff(&mut qb, &cfg.start_date_interval);
    qb.push(APP_GROUP_BY);
    qb.push(" ORDER BY most_recent_start_date DESC");
    qb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> AppsQueryConfig {
        AppsQueryConfig {
            username: "ipcdev".into(),
            groups_index: 0,
            app_ids: vec!["5bbb6a2c-3f5e-11ec-8a3b-008cfa5ae621".into()],
            start_date_interval: "2592000 seconds".into(),
        }
    }

    #[test]
    fn popular_featured_counts_recent_or_never_run_jobs() {
        let qb = popular_featured_query(&cfg());
        let sql = qb.sql();

        assert!(sql.contains("COUNT(j.id) AS job_count"));
        assert!(sql.contains("LEFT JOIN jobs j ON j.app_id = CAST(a.id AS TEXT)"));
        assert!(sql.contains("WHERE a.id = ANY(CAST($3 AS uuid[]))"));
        assert!(sql.contains("a.deleted = false AND a.disabled = false"));
        assert!(sql.contains("a.integration_date IS NOT NULL"));
        assert!(sql.contains(
            "(j.start_date >= now() - CAST('2592000 seconds' AS interval) \
             OR j.start_date IS NULL)"
        ));
        assert!(sql.contains("GROUP BY a.id"));
        assert!(sql.ends_with("ORDER BY job_count DESC"));
        assert!(sql.contains("true AS is_public"));
    }

    #[test]
    fn public_listing_filters_on_identifier_set() {
        let cfg = cfg();
        let qb = public_query(&cfg.username, cfg.groups_index, &cfg.app_ids);
        let sql = qb.sql();

        assert!(sql.contains("true AS is_public FROM app_listing a WHERE"));
        assert!(sql.contains("a.id = ANY(CAST($3 AS uuid[]))"));
        assert!(sql.contains("a.integration_date IS NOT NULL"));
        assert!(!sql.contains("GROUP BY"));
        assert!(!sql.contains("jobs"));
        assert!(sql.ends_with("ORDER BY a.integration_date DESC"));
    }

    #[test]
    fn recently_added_only_uses_identifier_set_for_flag() {
        let cfg = cfg();
        let qb =
            recently_added_query(&cfg.username, cfg.groups_index, &cfg.app_ids);
        let sql = qb.sql();

        assert!(sql.contains("a.id = ANY(CAST($3 AS uuid[])) AS is_public"));
        assert!(sql.contains("AND a.integrator_username = $4"));
        let where_clause = sql.split(" WHERE a.deleted").nth(1).unwrap();
        assert!(!where_clause.contains("ANY("));
        assert!(!sql.contains("integration_date IS NOT NULL"));
    }

    #[test]
    fn recently_used_ranks_by_latest_start() {
        let qb = recently_used_query(&cfg());
        let sql = qb.sql();

        assert!(sql.contains("MAX(j.start_date) AS most_recent_start_date"));
        assert!(sql.contains("FROM jobs j JOIN users u ON j.user_id = u.id"));
        assert!(sql.contains("JOIN app_listing a ON CAST(a.id AS TEXT) = j.app_id"));
        assert!(sql.contains("WHERE u.username = $4"));
        assert!(sql.contains(
            "j.start_date > now() - CAST('2592000 seconds' AS interval)"
        ));
        assert!(sql.contains("GROUP BY a.id"));
        assert!(sql.ends_with("ORDER BY most_recent_start_date DESC"));
    }

    #[test]
    fn every_listing_projects_the_same_columns() {
        let cfg = cfg();
        let queries = [
            popular_featured_query(&cfg),
            public_query(&cfg.username, cfg.groups_index, &cfg.app_ids),
            recently_added_query(&cfg.username, cfg.groups_index, &cfg.app_ids),
            recently_used_query(&cfg),
        ];

        for qb in &queries {
            let sql = qb.sql();
            assert!(sql.starts_with("SELECT a.id, 'de' AS system_id"));
            assert!(sql.contains("a.integrator_username AS username"));
            assert!(sql.contains(") AS is_favorite"));
            assert!(sql.contains("AS is_public"));
            assert!(sql.contains("a.deleted = false AND a.disabled = false"));
        }
    }
}
