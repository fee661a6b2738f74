use chrono::{DateTime, Utc};
use tracing::instrument;

use super::{AuthLoginStore, Clock, system_clock};
use crate::config::Config;
use crate::db::DbPool;
use crate::db::connection::{build_pool, get_connection};
use crate::db::error::StoreResult;
use crate::db::models::auth_login::{AuthLogin, NewAuthLogin, UpdateAuthLogin};
use crate::db::repositories::auth_login_repository::AuthLoginRepository;

/// Postgres-backed store: one pooled connection per operation.
#[derive(Clone)]
pub struct PgAuthLoginStore {
    pool: DbPool,
    clock: Clock,
}

impl PgAuthLoginStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            clock: system_clock(),
        }
    }

    pub fn from_config(config: &Config) -> StoreResult<Self> {
        build_pool(config).map(Self::new)
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

impl std::fmt::Debug for PgAuthLoginStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgAuthLoginStore")
            .field("max_size", &self.pool.max_size())
            .finish_non_exhaustive()
    }
}

impl AuthLoginStore for PgAuthLoginStore {
    #[instrument(skip_all, fields(user_id = %record.user_id))]
    fn create(&self, record: &NewAuthLogin) -> StoreResult<AuthLogin> {
        let mut conn = get_connection(&self.pool)?;
        let created = AuthLoginRepository::create(&mut conn, record, self.now())
            .inspect_err(|e| tracing::warn!(error = %e, "create rejected"))?;
        tracing::info!(id = created.id, "auth login created");
        Ok(created)
    }

    #[instrument(skip(self))]
    fn find_by_user_id(&self, user_id: &str) -> StoreResult<AuthLogin> {
        let mut conn = get_connection(&self.pool)?;
        AuthLoginRepository::find_by_user_id(&mut conn, user_id)
    }

    #[instrument(skip(self))]
    fn find_by_id(&self, id: i32) -> StoreResult<AuthLogin> {
        let mut conn = get_connection(&self.pool)?;
        AuthLoginRepository::find_by_id(&mut conn, id)
    }

    #[instrument(skip(self))]
    fn list(&self) -> StoreResult<Vec<AuthLogin>> {
        let mut conn = get_connection(&self.pool)?;
        AuthLoginRepository::list(&mut conn)
    }

    #[instrument(skip(self, changes))]
    fn update(&self, user_id: &str, changes: &UpdateAuthLogin) -> StoreResult<AuthLogin> {
        let mut conn = get_connection(&self.pool)?;
        let updated = AuthLoginRepository::update(&mut conn, user_id, changes, self.now())?;
        tracing::debug!(id = updated.id, "auth login updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    fn record_login(&self, user_id: &str, ip: &str, at: DateTime<Utc>) -> StoreResult<AuthLogin> {
        let mut conn = get_connection(&self.pool)?;
        let updated = AuthLoginRepository::record_login(&mut conn, user_id, ip, at, self.now())?;
        tracing::debug!(logins_count = updated.logins_count, "login recorded");
        Ok(updated)
    }

    #[instrument(skip_all, fields(user_id = %record.user_id))]
    fn upsert(&self, record: &NewAuthLogin) -> StoreResult<AuthLogin> {
        let mut conn = get_connection(&self.pool)?;
        AuthLoginRepository::upsert(&mut conn, record, self.now())
    }
}
