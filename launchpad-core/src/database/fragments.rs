//! SQL fragments shared by the listing queries.

use sqlx::{Postgres, QueryBuilder};

/// Pushes `EXISTS(...) AS is_favorite`: whether `outer_id` sits in the
/// favorites category (`groups_index`) under `username`'s workspace root.
///
/// `outer_id` must be a `uuid` expression.
pub(crate) fn push_is_favorite(
    qb: &mut QueryBuilder<'_, Postgres>,
    username: &str,
    groups_index: i32,
    outer_id: &str,
) {
    qb.push(
        "EXISTS(SELECT 1 FROM users fav_u \
         JOIN workspace fav_w ON fav_u.id = fav_w.user_id \
         JOIN app_category_group fav_acg \
           ON fav_w.root_category_id = fav_acg.parent_category_id \
         JOIN app_category_app fav_aca \
           ON fav_acg.child_category_id = fav_aca.app_category_id \
         WHERE fav_u.username = ",
    );
    qb.push_bind(username.to_owned());
    qb.push(" AND fav_acg.child_index = ");
    qb.push_bind(groups_index);
    qb.push(" AND fav_aca.app_id = ");
    qb.push(outer_id);
    qb.push(") AS is_favorite");
}

/// Pushes `<id_expr> = ANY(CAST($n AS uuid[]))`.
///
/// Identifiers that are not UUIDs make the statement fail rather than being
/// silently dropped.
pub(crate) fn push_in_app_ids(
    qb: &mut QueryBuilder<'_, Postgres>,
    id_expr: &str,
    app_ids: &[String],
) {
    qb.push(id_expr);
    qb.push(" = ANY(CAST(");
    qb.push_bind(app_ids.to_vec());
    qb.push(" AS uuid[]))");
}

/// Pushes `now() - CAST('<interval>' AS interval)`.
///
/// The interval is written into the statement text verbatim, not bound.
/// Callers must only pass validated interval strings (the config loader
/// renders them from parsed durations).
pub(crate) fn push_lookback_cutoff(
    qb: &mut QueryBuilder<'_, Postgres>,
    interval: &str,
) {
    qb.push(format!("now() - CAST('{interval}' AS interval)"));
}

/// Projection columns every listing shares, minus the computed flags.
pub(crate) const APP_COLUMNS: &str = "a.id, \
    'de' AS system_id, \
    a.name, \
    a.description, \
    a.wiki_url, \
    a.integration_date, \
    a.edited_date, \
    a.integrator_username AS username";

/// Grouping key for the aggregating listings.
pub(crate) const APP_GROUP_BY: &str = " GROUP BY a.id, a.name, \
    a.description, a.wiki_url, a.integration_date, a.edited_date, \
    a.integrator_username";

/// Rows that are never listed, whatever else the query asks for.
pub(crate) const LISTABLE: &str = "a.deleted = false AND a.disabled = false";
