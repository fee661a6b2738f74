//! Persistent store of per-user authentication/profile records (`auth_logins`).
//!
//! A record is created the first time a user signs in through an identity
//! provider, then updated on every later login and on profile changes. Records
//! are never deleted.
//!
//! ```no_run
//! use auth_logins::{AuthLoginStore, Config, NewAuthLogin, PgAuthLoginStore};
//!
//! # fn main() -> anyhow::Result<()> {
//! auth_logins::telemetry::setup_logging();
//! let store = PgAuthLoginStore::from_config(&Config::from_env()?)?;
//!
//! let profile: NewAuthLogin = serde_json::from_str(
//!     r#"{"user_id": "auth0|123", "email": "a@b.com", "login_provider": "auth0"}"#,
//! )?;
//! let record = store.upsert(&profile)?;
//! store.record_login(&record.user_id, "1.2.3.4", chrono::Utc::now())?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod store;
pub mod telemetry;

pub use config::{Config, Environment};
pub use db::error::{StoreError, StoreResult};
pub use db::models::auth_login::{AuthLogin, NewAuthLogin, UpdateAuthLogin};
pub use store::{AuthLoginStore, Clock, MemoryAuthLoginStore, PgAuthLoginStore};
