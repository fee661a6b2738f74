pub mod auth_login;
