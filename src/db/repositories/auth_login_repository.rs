use crate::db::error::{StoreError, StoreResult};
use crate::db::models::auth_login::{
    AuthLogin, NewAuthLogin, NewAuthLoginRow, UpdateAuthLogin, column_precision,
};
use crate::db::schema::auth_logins;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Queries over `auth_logins`.
///
/// Every function works on a borrowed connection, so callers can run them
/// inside their own transaction. Each one is a single statement.
pub struct AuthLoginRepository;

impl AuthLoginRepository {
    /// Insère un nouvel enregistrement; `created_at` et `updated_at` valent `now`
    pub fn create(
        conn: &mut PgConnection,
        record: &NewAuthLogin,
        now: DateTime<Utc>,
    ) -> StoreResult<AuthLogin> {
        record.validate()?;

        diesel::insert_into(auth_logins::table)
            .values(NewAuthLoginRow::new(record, now))
            .get_result::<AuthLogin>(conn)
            .map_err(|e| match StoreError::from(e) {
                StoreError::DuplicateKey(_) => StoreError::duplicate_key(format!(
                    "user_id {} already exists",
                    record.user_id
                )),
                other => other,
            })
    }

    pub fn find_by_user_id(conn: &mut PgConnection, user_id: &str) -> StoreResult<AuthLogin> {
        auth_logins::table
            .filter(auth_logins::user_id.eq(user_id))
            .first::<AuthLogin>(conn)
            .optional()?
            .ok_or_else(|| not_found(user_id))
    }

    pub fn find_by_id(conn: &mut PgConnection, id: i32) -> StoreResult<AuthLogin> {
        auth_logins::table
            .find(id)
            .first::<AuthLogin>(conn)
            .optional()?
            .ok_or_else(|| StoreError::not_found(format!("auth login #{id}")))
    }

    pub fn list(conn: &mut PgConnection) -> StoreResult<Vec<AuthLogin>> {
        auth_logins::table
            .order_by(auth_logins::id.asc())
            .load::<AuthLogin>(conn)
            .map_err(Into::into)
    }

    /// Mise à jour partielle; `updated_at` est toujours réécrit
    pub fn update(
        conn: &mut PgConnection,
        user_id: &str,
        changes: &UpdateAuthLogin,
        now: DateTime<Utc>,
    ) -> StoreResult<AuthLogin> {
        changes.validate()?;
        let changes = changes.at_column_precision();

        diesel::update(auth_logins::table.filter(auth_logins::user_id.eq(user_id)))
            .set((&changes, auth_logins::updated_at.eq(column_precision(now))))
            .get_result::<AuthLogin>(conn)
            .optional()?
            .ok_or_else(|| not_found(user_id))
    }

    /// Enregistre une connexion: compteur, `last_login`, `last_ip`
    pub fn record_login(
        conn: &mut PgConnection,
        user_id: &str,
        ip: &str,
        at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> StoreResult<AuthLogin> {
        diesel::update(auth_logins::table.filter(auth_logins::user_id.eq(user_id)))
            .set((
                auth_logins::logins_count.eq(auth_logins::logins_count + 1),
                auth_logins::last_login.eq(column_precision(at)),
                auth_logins::last_ip.eq(ip),
                auth_logins::updated_at.eq(column_precision(now)),
            ))
            .get_result::<AuthLogin>(conn)
            .optional()?
            .ok_or_else(|| not_found(user_id))
    }

    /// Crée ou écrase le profil identifié par `user_id`, en une seule requête.
    /// `id` et `created_at` d'une ligne existante sont conservés.
    pub fn upsert(
        conn: &mut PgConnection,
        record: &NewAuthLogin,
        now: DateTime<Utc>,
    ) -> StoreResult<AuthLogin> {
        record.validate()?;
        let overwrite = UpdateAuthLogin::from(record);

        diesel::insert_into(auth_logins::table)
            .values(NewAuthLoginRow::new(record, now))
            .on_conflict(auth_logins::user_id)
            .do_update()
            .set((&overwrite, auth_logins::updated_at.eq(column_precision(now))))
            .get_result::<AuthLogin>(conn)
            .map_err(Into::into)
    }
}

fn not_found(user_id: &str) -> StoreError {
    StoreError::not_found(format!("auth login {user_id}"))
}
