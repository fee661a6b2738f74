pub mod auth_login_repository;
