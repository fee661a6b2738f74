use crate::db::error::{StoreError, StoreResult};
use crate::db::schema::auth_logins;
use chrono::{DateTime, SubsecRound, Utc};
use diesel::{AsChangeset, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};

/// One row of `auth_logins`: the authentication/profile state of a single user.
///
/// Field order matches the table definition, which `Queryable` relies on.
#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = auth_logins)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuthLogin {
    pub id: i32,
    pub user_id: String,
    pub name: String,
    pub nickname: String,
    pub username: String,
    pub email: String,
    pub email_verified: bool,
    pub picture: String,
    pub company: String,
    pub blog: String,
    pub phone: String,
    pub phone_verified: bool,
    pub locale: String,
    pub login_provider: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub last_ip: String,
    pub logins_count: i32,
}

/// Cuts `at` to the microsecond resolution of a `TIMESTAMPTZ` column.
///
/// Every timestamp goes through this before it is stored, so a record reads
/// back exactly as it was returned, whichever backend holds it.
pub fn column_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(6)
}

/// Profile data for a record that does not exist yet.
///
/// Deserializes from an identity provider profile document: missing keys
/// become blank values, which [`NewAuthLogin::validate`] then rejects where
/// the column must carry a value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct NewAuthLogin {
    pub user_id: String,
    pub name: String,
    pub nickname: String,
    pub username: String,
    pub email: String,
    pub email_verified: bool,
    pub picture: String,
    pub company: String,
    pub blog: String,
    pub phone: String,
    pub phone_verified: bool,
    pub locale: String,
    pub login_provider: String,
    pub last_login: DateTime<Utc>,
    pub last_ip: String,
    pub logins_count: i32,
}

impl NewAuthLogin {
    pub fn validate(&self) -> StoreResult<()> {
        require("user_id", &self.user_id)?;
        require("email", &self.email)?;
        require("login_provider", &self.login_provider)?;
        require_non_negative(self.logins_count)
    }

    /// Builds the full record the store persists for this profile.
    pub fn into_record(self, id: i32, now: DateTime<Utc>) -> AuthLogin {
        let now = column_precision(now);
        AuthLogin {
            id,
            user_id: self.user_id,
            name: self.name,
            nickname: self.nickname,
            username: self.username,
            email: self.email,
            email_verified: self.email_verified,
            picture: self.picture,
            company: self.company,
            blog: self.blog,
            phone: self.phone,
            phone_verified: self.phone_verified,
            locale: self.locale,
            login_provider: self.login_provider,
            created_at: now,
            updated_at: now,
            last_login: column_precision(self.last_login),
            last_ip: self.last_ip,
            logins_count: self.logins_count,
        }
    }
}

/// Insert row: the profile plus the store-assigned timestamps.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = auth_logins)]
pub(crate) struct NewAuthLoginRow<'a> {
    pub user_id: &'a str,
    pub name: &'a str,
    pub nickname: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub email_verified: bool,
    pub picture: &'a str,
    pub company: &'a str,
    pub blog: &'a str,
    pub phone: &'a str,
    pub phone_verified: bool,
    pub locale: &'a str,
    pub login_provider: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub last_ip: &'a str,
    pub logins_count: i32,
}

impl<'a> NewAuthLoginRow<'a> {
    pub(crate) fn new(record: &'a NewAuthLogin, now: DateTime<Utc>) -> Self {
        let now = column_precision(now);
        Self {
            user_id: &record.user_id,
            name: &record.name,
            nickname: &record.nickname,
            username: &record.username,
            email: &record.email,
            email_verified: record.email_verified,
            picture: &record.picture,
            company: &record.company,
            blog: &record.blog,
            phone: &record.phone,
            phone_verified: record.phone_verified,
            locale: &record.locale,
            login_provider: &record.login_provider,
            created_at: now,
            updated_at: now,
            last_login: column_precision(record.last_login),
            last_ip: &record.last_ip,
            logins_count: record.logins_count,
        }
    }
}

/// Partial update: `None` leaves the column untouched.
///
/// `id`, `user_id` and `created_at` are not updatable; `updated_at` is always
/// written by the store.
#[derive(AsChangeset, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[diesel(table_name = auth_logins)]
#[serde(default)]
pub struct UpdateAuthLogin {
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub picture: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub phone: Option<String>,
    pub phone_verified: Option<bool>,
    pub locale: Option<String>,
    pub login_provider: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub last_ip: Option<String>,
    pub logins_count: Option<i32>,
}

impl UpdateAuthLogin {
    pub fn validate(&self) -> StoreResult<()> {
        if let Some(email) = &self.email {
            require("email", email)?;
        }
        if let Some(provider) = &self.login_provider {
            require("login_provider", provider)?;
        }
        if let Some(count) = self.logins_count {
            require_non_negative(count)?;
        }
        Ok(())
    }

    /// The same changes with `last_login` at column precision.
    #[must_use]
    pub fn at_column_precision(&self) -> Self {
        Self {
            last_login: self.last_login.map(column_precision),
            ..self.clone()
        }
    }

    /// Applies the present fields to `record`. Timestamps are the caller's job.
    pub fn apply_to(&self, record: &mut AuthLogin) {
        fn set<T: Clone>(target: &mut T, value: Option<&T>) {
            if let Some(v) = value {
                target.clone_from(v);
            }
        }

        set(&mut record.name, self.name.as_ref());
        set(&mut record.nickname, self.nickname.as_ref());
        set(&mut record.username, self.username.as_ref());
        set(&mut record.email, self.email.as_ref());
        set(&mut record.email_verified, self.email_verified.as_ref());
        set(&mut record.picture, self.picture.as_ref());
        set(&mut record.company, self.company.as_ref());
        set(&mut record.blog, self.blog.as_ref());
        set(&mut record.phone, self.phone.as_ref());
        set(&mut record.phone_verified, self.phone_verified.as_ref());
        set(&mut record.locale, self.locale.as_ref());
        set(&mut record.login_provider, self.login_provider.as_ref());
        set(&mut record.last_login, self.last_login.map(column_precision).as_ref());
        set(&mut record.last_ip, self.last_ip.as_ref());
        set(&mut record.logins_count, self.logins_count.as_ref());
    }
}

/// Overwrites every profile column, as an upsert of a known user does.
impl From<&NewAuthLogin> for UpdateAuthLogin {
    fn from(record: &NewAuthLogin) -> Self {
        Self {
            name: Some(record.name.clone()),
            nickname: Some(record.nickname.clone()),
            username: Some(record.username.clone()),
            email: Some(record.email.clone()),
            email_verified: Some(record.email_verified),
            picture: Some(record.picture.clone()),
            company: Some(record.company.clone()),
            blog: Some(record.blog.clone()),
            phone: Some(record.phone.clone()),
            phone_verified: Some(record.phone_verified),
            locale: Some(record.locale.clone()),
            login_provider: Some(record.login_provider.clone()),
            last_login: Some(column_precision(record.last_login)),
            last_ip: Some(record.last_ip.clone()),
            logins_count: Some(record.logins_count),
        }
    }
}

fn require(column: &str, value: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::constraint(format!("{column} must not be empty")));
    }
    Ok(())
}

fn require_non_negative(logins_count: i32) -> StoreResult<()> {
    if logins_count < 0 {
        return Err(StoreError::constraint(format!(
            "logins_count must not be negative (got {logins_count})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn profile() -> NewAuthLogin {
        NewAuthLogin {
            user_id: "auth0|123".to_string(),
            name: "Ada Lovelace".to_string(),
            email: "a@b.com".to_string(),
            login_provider: "google-oauth2".to_string(),
            last_login: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_profile_passes() {
        assert!(profile().validate().is_ok());
    }

    #[test]
    fn blank_email_is_a_constraint_violation() {
        let record = NewAuthLogin {
            email: "   ".to_string(),
            ..profile()
        };
        let err = record.validate().unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn missing_user_id_is_a_constraint_violation() {
        let record = NewAuthLogin {
            user_id: String::new(),
            ..profile()
        };
        assert!(record.validate().unwrap_err().is_constraint_violation());
    }

    #[test]
    fn negative_logins_count_is_rejected() {
        let record = NewAuthLogin {
            logins_count: -1,
            ..profile()
        };
        assert!(record.validate().unwrap_err().is_constraint_violation());
    }

    #[test]
    fn optional_profile_fields_may_be_empty() {
        let record = NewAuthLogin {
            company: String::new(),
            blog: String::new(),
            phone: String::new(),
            ..profile()
        };
        assert!(record.validate().is_ok());
    }

    #[test]
    fn provider_profile_json_maps_onto_new_record() {
        let json = r#"{
            "user_id": "github|42",
            "name": "Octo Cat",
            "nickname": "octocat",
            "email": "octo@example.com",
            "email_verified": true,
            "picture": "https://avatars.example.com/42",
            "login_provider": "github",
            "last_login": "2024-05-01T12:00:00Z",
            "last_ip": "10.0.0.1",
            "logins_count": 3
        }"#;
        let record: NewAuthLogin = serde_json::from_str(json).expect("profile json");
        assert_eq!(record.user_id, "github|42");
        assert!(record.email_verified);
        assert!(!record.phone_verified);
        assert_eq!(record.company, "");
        assert_eq!(record.logins_count, 3);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn profile_json_without_email_fails_validation() {
        let record: NewAuthLogin =
            serde_json::from_str(r#"{"user_id": "auth0|9", "login_provider": "auth0"}"#)
                .expect("profile json");
        assert!(record.validate().unwrap_err().is_constraint_violation());
    }

    #[test]
    fn into_record_sets_both_timestamps() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let record = profile().into_record(7, now);
        assert_eq!(record.id, 7);
        assert_eq!(record.created_at, now);
        assert_eq!(record.updated_at, now);
        assert_eq!(record.user_id, "auth0|123");
    }

    #[test]
    fn update_applies_only_present_fields() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut record = profile().into_record(1, now);
        let changes = UpdateAuthLogin {
            nickname: Some("ada".to_string()),
            phone_verified: Some(true),
            ..Default::default()
        };
        changes.apply_to(&mut record);
        assert_eq!(record.nickname, "ada");
        assert!(record.phone_verified);
        assert_eq!(record.name, "Ada Lovelace");
        assert_eq!(record.email, "a@b.com");
    }

    #[test]
    fn update_rejects_blank_login_provider() {
        let changes = UpdateAuthLogin {
            login_provider: Some(String::new()),
            ..Default::default()
        };
        assert!(changes.validate().unwrap_err().is_constraint_violation());
    }

    #[test]
    fn stored_timestamps_drop_sub_microsecond_digits() {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let nanos = base + chrono::Duration::nanoseconds(123_456_789);
        let micros = base + chrono::Duration::microseconds(123_456);

        let record = NewAuthLogin {
            last_login: nanos,
            ..profile()
        }
        .into_record(1, nanos);
        assert_eq!(record.last_login, micros);
        assert_eq!(record.created_at, micros);
        assert_eq!(record.updated_at, micros);

        let changes = UpdateAuthLogin {
            last_login: Some(nanos),
            ..Default::default()
        };
        assert_eq!(changes.at_column_precision().last_login, Some(micros));
        assert_eq!(column_precision(micros), micros);
    }

    #[test]
    fn full_update_from_profile_sets_every_field() {
        let changes = UpdateAuthLogin::from(&profile());
        assert_eq!(changes.email.as_deref(), Some("a@b.com"));
        assert_eq!(changes.logins_count, Some(0));
        assert!(changes.company.is_some());
    }
}
