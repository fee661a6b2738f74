use std::time::Duration;

use super::{DbConnection, DbPool};
use crate::config::Config;
use crate::db::error::{StoreError, StoreResult};
use diesel::PgConnection;
use diesel::r2d2::ConnectionManager;

/// Builds the r2d2 pool described by `config`.
///
/// The pool connects eagerly, so an unreachable database fails here rather
/// than on the first query.
pub fn build_pool(config: &Config) -> StoreResult<DbPool> {
    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

    let pool = diesel::r2d2::Pool::builder()
        .max_size(config.pool_max_size)
        .connection_timeout(Duration::from_secs(config.pool_timeout_secs))
        .build(manager)
        .map_err(|e| StoreError::Pool(format!("Failed to create pool: {e}")))?;

    tracing::info!(max_size = config.pool_max_size, "Database pool ready");
    Ok(pool)
}

pub fn get_connection(pool: &DbPool) -> StoreResult<DbConnection> {
    pool.get().map_err(|e| {
        tracing::error!(error = %e, "Could not check out a database connection");
        StoreError::from(e)
    })
}
