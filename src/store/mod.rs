//! The `auth_logins` store contract and its backends.
//!
//! | Backend | Use case | Persistence |
//! |---------|----------|-------------|
//! | [`PgAuthLoginStore`] | Production | Postgres |
//! | [`MemoryAuthLoginStore`] | Tests, development | No |
//!
//! Every operation is atomic: a single statement (or upsert) in Postgres,
//! a single write guard in memory.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::db::error::StoreResult;
use crate::db::models::auth_login::{AuthLogin, NewAuthLogin, UpdateAuthLogin};

#[cfg(any(test, feature = "testutil"))]
pub mod conformance;
pub mod memory;
pub mod postgres;

pub use memory::MemoryAuthLoginStore;
pub use postgres::PgAuthLoginStore;

/// Source of "now" for `created_at` / `updated_at`. Stores cut its readings
/// to microseconds before writing them.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Persistence and lookup of [`AuthLogin`] records, keyed by the external
/// `user_id`.
pub trait AuthLoginStore: Send + Sync {
    /// Inserts a new record and assigns its `id`.
    ///
    /// Fails with `DuplicateKey` when `user_id` is taken and with
    /// `ConstraintViolation` when a required value is blank.
    fn create(&self, record: &NewAuthLogin) -> StoreResult<AuthLogin>;

    fn find_by_user_id(&self, user_id: &str) -> StoreResult<AuthLogin>;

    fn find_by_id(&self, id: i32) -> StoreResult<AuthLogin>;

    /// All records, ordered by `id`.
    fn list(&self) -> StoreResult<Vec<AuthLogin>>;

    /// Applies the present fields of `changes` and sets `updated_at`, even
    /// when `changes` is empty.
    fn update(&self, user_id: &str, changes: &UpdateAuthLogin) -> StoreResult<AuthLogin>;

    /// Counts one more login from `ip` at `at`. Nothing but `logins_count`,
    /// `last_login`, `last_ip` and `updated_at` changes.
    ///
    /// `last_login` is stored at microsecond precision. A count already at
    /// `i32::MAX` fails with `Database`, as the Postgres integer column does.
    fn record_login(&self, user_id: &str, ip: &str, at: DateTime<Utc>) -> StoreResult<AuthLogin>;

    /// Creates the record, or overwrites every profile field of the existing
    /// one while keeping its `id` and `created_at`.
    fn upsert(&self, record: &NewAuthLogin) -> StoreResult<AuthLogin>;
}
