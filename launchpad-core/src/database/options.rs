//! Execution options shared by every listing query.
//!
//! Options fold into a [`QuerySettings`] in the order they are given; when the
//! same option appears twice the later value wins. Each field is an `Option`
//! so an explicit `LIMIT 0` stays distinguishable from "no limit".

use std::{fmt, sync::Arc};

use sqlx::{Postgres, QueryBuilder, Transaction};
use tokio::sync::{Mutex, MutexGuard};

/// Caller-owned transactional scope that concurrently dispatched queries may
/// share.
///
/// Queries hold the lock only while their statement runs. The core never
/// commits, rolls back or closes the transaction; take it back with
/// [`SharedTransaction::into_inner`] once every clone is gone.
#[derive(Clone)]
pub struct SharedTransaction {
    inner: Arc<Mutex<Transaction<'static, Postgres>>>,
}

impl fmt::Debug for SharedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedTransaction")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}

impl SharedTransaction {
    /// Wraps a transaction the caller started.
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tx)),
        }
    }

    pub(crate) async fn lock(
        &self,
    ) -> MutexGuard<'_, Transaction<'static, Postgres>> {
        self.inner.lock().await
    }

    /// Returns `None` while other clones (e.g. in-flight queries) still hold
    /// the handle.
    pub fn into_inner(self) -> Option<Transaction<'static, Postgres>> {
        Arc::try_unwrap(self.inner).ok().map(Mutex::into_inner)
    }
}

/// One execution option; see the free constructors below.
#[derive(Debug, Clone)]
pub enum QueryOption {
    /// Run through the given transaction instead of the shared pool.
    Transaction(SharedTransaction),
    /// Cap the number of returned rows.
    Limit(u64),
    /// Skip leading rows.
    Offset(u64),
}

/// Runs the listing inside `tx`.
pub fn with_transaction(tx: &SharedTransaction) -> QueryOption {
    QueryOption::Transaction(tx.clone())
}

/// Returns at most `limit` rows. Zero yields no rows.
pub fn with_limit(limit: u64) -> QueryOption {
    QueryOption::Limit(limit)
}

/// Skips the first `offset` rows of the ordering.
pub fn with_offset(offset: u64) -> QueryOption {
    QueryOption::Offset(offset)
}

/// Options folded in order, later values replacing earlier ones.
#[derive(Debug, Clone, Default)]
pub struct QuerySettings {
    tx: Option<SharedTransaction>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl QuerySettings {
    /// No transaction, limit or offset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds `options` left to right.
    pub fn from_options(options: &[QueryOption]) -> Self {
        options.iter().cloned().collect()
    }

    /// Folds one more option in.
    pub fn apply(&mut self, option: QueryOption) {
        match option {
            QueryOption::Transaction(tx) => self.tx = Some(tx),
            QueryOption::Limit(limit) => self.limit = Some(limit),
            QueryOption::Offset(offset) => self.offset = Some(offset),
        }
    }

    /// Builder form of [`with_transaction`].
    pub fn with_transaction(mut self, tx: &SharedTransaction) -> Self {
        self.apply(with_transaction(tx));
        self
    }

    /// Builder form of [`with_limit`].
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.apply(with_limit(limit));
        self
    }

    /// Builder form of [`with_offset`].
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.apply(with_offset(offset));
        self
    }

    /// Transaction to run through, if any.
    pub fn transaction(&self) -> Option<&SharedTransaction> {
        self.tx.as_ref()
    }

    /// Row cap, if one was set.
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Leading rows to skip, if set.
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Appends `LIMIT`/`OFFSET` for whichever of the two was set.
    pub(crate) fn push_pagination(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(limit) = self.limit {
            qb.push(" LIMIT ").push_bind(clamp_to_bigint(limit));
        }
        if let Some(offset) = self.offset {
            qb.push(" OFFSET ").push_bind(clamp_to_bigint(offset));
        }
    }
}

impl FromIterator<QueryOption> for QuerySettings {
    fn from_iter<I: IntoIterator<Item = QueryOption>>(iter: I) -> Self {
        let mut settings = QuerySettings::default();
        for option in iter {
            settings.apply(option);
        }
        settings
    }
}

fn clamp_to_bigint(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
