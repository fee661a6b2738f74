pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;
pub mod schema;

use diesel::PgConnection;
use diesel::r2d2::{self, ConnectionManager};

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// DDL of the `auth_logins` table, for test fixtures and fresh databases.
pub const AUTH_LOGINS_DDL: &str = r"
CREATE TABLE IF NOT EXISTS auth_logins (
    id SERIAL PRIMARY KEY,
    user_id VARCHAR NOT NULL UNIQUE,
    name VARCHAR NOT NULL,
    nickname VARCHAR NOT NULL,
    username VARCHAR NOT NULL,
    email VARCHAR NOT NULL,
    email_verified BOOLEAN NOT NULL DEFAULT false,
    picture VARCHAR NOT NULL,
    company VARCHAR NOT NULL,
    blog VARCHAR NOT NULL,
    phone VARCHAR NOT NULL,
    phone_verified BOOLEAN NOT NULL DEFAULT false,
    locale VARCHAR NOT NULL,
    login_provider VARCHAR NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    last_login TIMESTAMPTZ NOT NULL,
    last_ip VARCHAR NOT NULL,
    logins_count INTEGER NOT NULL
)";
