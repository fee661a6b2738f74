//! In-memory store for tests and development.
//!
//! Records live in a [`BTreeMap`] keyed by `id` behind a single
//! [`parking_lot::RwLock`]; every mutating operation holds the write guard
//! for its whole read-check-write sequence, which makes it atomic. Clones
//! share the same data.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::instrument;

use super::{AuthLoginStore, Clock, system_clock};
use crate::db::error::{StoreError, StoreResult};
use crate::db::models::auth_login::{AuthLogin, NewAuthLogin, UpdateAuthLogin, column_precision};

#[derive(Default)]
struct Tables {
    last_id: i32,
    records: BTreeMap<i32, AuthLogin>,
    by_user_id: HashMap<String, i32>,
}

impl Tables {
    /// Ids behave like a SERIAL sequence: never reused, even after a failed insert.
    fn next_id(&mut self) -> StoreResult<i32> {
        self.last_id = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Database("auth_logins id sequence exhausted".to_string()))?;
        Ok(self.last_id)
    }

    fn get_mut(&mut self, user_id: &str) -> StoreResult<&mut AuthLogin> {
        self.by_user_id
            .get(user_id)
            .and_then(|id| self.records.get_mut(id))
            .ok_or_else(|| StoreError::not_found(format!("auth login {user_id}")))
    }

    fn insert(&mut self, record: &NewAuthLogin, now: DateTime<Utc>) -> StoreResult<AuthLogin> {
        let id = self.next_id()?;
        if self.by_user_id.contains_key(&record.user_id) {
            return Err(StoreError::duplicate_key(format!(
                "user_id {} already exists",
                record.user_id
            )));
        }

        let created = record.clone().into_record(id, now);
        self.by_user_id.insert(created.user_id.clone(), id);
        self.records.insert(id, created.clone());
        Ok(created)
    }
}

#[derive(Clone)]
pub struct MemoryAuthLoginStore {
    tables: Arc<RwLock<Tables>>,
    clock: Clock,
}

impl MemoryAuthLoginStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            clock: system_clock(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn len(&self) -> usize {
        self.tables.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn now(&self) -> DateTime<Utc> {
        column_precision((self.clock)())
    }
}

impl Default for MemoryAuthLoginStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryAuthLoginStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAuthLoginStore")
            .field("records", &self.len())
            .finish_non_exhaustive()
    }
}

impl AuthLoginStore for MemoryAuthLoginStore {
    #[instrument(skip_all, fields(user_id = %record.user_id))]
    fn create(&self, record: &NewAuthLogin) -> StoreResult<AuthLogin> {
        record.validate()?;
        let now = self.now();
        let created = self.tables.write().insert(record, now)?;
        tracing::debug!(id = created.id, "auth login created");
        Ok(created)
    }

    #[instrument(skip(self))]
    fn find_by_user_id(&self, user_id: &str) -> StoreResult<AuthLogin> {
        let tables = self.tables.read();
        tables
            .by_user_id
            .get(user_id)
            .and_then(|id| tables.records.get(id))
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("auth login {user_id}")))
    }

    #[instrument(skip(self))]
    fn find_by_id(&self, id: i32) -> StoreResult<AuthLogin> {
        self.tables
            .read()
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("auth login #{id}")))
    }

    #[instrument(skip(self))]
    fn list(&self) -> StoreResult<Vec<AuthLogin>> {
        Ok(self.tables.read().records.values().cloned().collect())
    }

    #[instrument(skip(self, changes))]
    fn update(&self, user_id: &str, changes: &UpdateAuthLogin) -> StoreResult<AuthLogin> {
        changes.validate()?;
        let now = self.now();
        let mut tables = self.tables.write();
        let record = tables.get_mut(user_id)?;
        changes.apply_to(record);
        record.updated_at = now;
        Ok(record.clone())
    }

    #[instrument(skip(self))]
    fn record_login(&self, user_id: &str, ip: &str, at: DateTime<Utc>) -> StoreResult<AuthLogin> {
        let now = self.now();
        let mut tables = self.tables.write();
        let record = tables.get_mut(user_id)?;
        record.logins_count = record
            .logins_count
            .checked_add(1)
            .ok_or_else(|| StoreError::Database("integer out of range".to_string()))?;
        record.last_login = column_precision(at);
        ip.clone_into(&mut record.last_ip);
        record.updated_at = now;
        Ok(record.clone())
    }

    #[instrument(skip_all, fields(user_id = %record.user_id))]
    fn upsert(&self, record: &NewAuthLogin) -> StoreResult<AuthLogin> {
        record.validate()?;
        let now = self.now();
        let mut tables = self.tables.write();
        if let Ok(existing) = tables.get_mut(&record.user_id) {
            UpdateAuthLogin::from(record).apply_to(existing);
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        tables.insert(record, now)
    }
}
