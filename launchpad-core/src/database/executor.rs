use launchpad_model::App;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::{database::options::QuerySettings, error::Result};

/// Applies pagination, runs the statement and maps every row into an [`App`].
///
/// Goes through the caller's transaction when one is set, otherwise through
/// the shared pool. An empty result is `Ok(vec![])`; rows are never returned
/// alongside an error.
pub(crate) async fn fetch_apps(
    pool: &PgPool,
    mut qb: QueryBuilder<'_, Postgres>,
    settings: &QuerySettings,
    label: &'static str,
) -> Result<Vec<App>> {
    settings.push_pagination(&mut qb);
    debug!("done generating query for {label}");

    let query = qb.build_query_as::<App>();
    let apps = match settings.transaction() {
        Some(tx) => {
            let mut guard = tx.lock().await;
            query.fetch_all(&mut **guard).await?
        }
        None => query.fetch_all(pool).await?,
    };

    debug!(rows = apps.len(), "done running/scanning query for {label}");
    Ok(apps)
}
