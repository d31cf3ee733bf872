//! Shared fixtures for the integration tests.
#![allow(dead_code)]

pub mod mocks;

use recuperajud::{
    auth::{password::PasswordHasher, token::TokenService},
    db::{DatabaseClient, TursoClient},
    email::EmailSender,
    types::{Account, AccountStatus, JobTitle, NewAccount, Permission},
    utils::toml_config::PasswordConfig,
    AuthFlows,
};
use std::sync::Arc;
use std::time::Duration;

pub const ACCESS_SECRET: &str = "test-access-secret";
pub const REFRESH_SECRET: &str = "test-refresh-secret";
pub const FRONTEND_URL: &str = "https://app.recuperajud.test";
pub const PASSWORD: &str = "senha-forte";

/// Cheapest Argon2 parameters the library accepts.
pub fn fast_password_config() -> PasswordConfig {
    PasswordConfig {
        memory_kib: 4096,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn hasher() -> PasswordHasher {
    PasswordHasher::new(&fast_password_config()).expect("password hasher")
}

pub fn token_service() -> TokenService {
    TokenService::new(
        ACCESS_SECRET.to_string(),
        REFRESH_SECRET.to_string(),
        900,
        604800,
    )
}

pub async fn memory_db() -> Arc<dyn DatabaseClient> {
    Arc::new(
        TursoClient::new_memory()
            .await
            .expect("Failed to create in-memory database"),
    )
}

pub fn flows_with_timeout(
    db: Arc<dyn DatabaseClient>,
    email: Arc<dyn EmailSender>,
    email_timeout: Duration,
) -> AuthFlows {
    AuthFlows::new(
        db,
        Arc::new(token_service()),
        Arc::new(hasher()),
        email,
        FRONTEND_URL.to_string(),
        email_timeout,
    )
}

pub fn flows(db: Arc<dyn DatabaseClient>, email: Arc<dyn EmailSender>) -> AuthFlows {
    flows_with_timeout(db, email, Duration::from_secs(5))
}

/// An active account description with the shared test password.
pub fn new_account(email: &str, name: &str, permission: Permission) -> NewAccount {
    NewAccount {
        email: email.to_string(),
        password_hash: hasher().hash(PASSWORD).expect("hash password"),
        name: name.to_string(),
        job_title: JobTitle::Servidor,
        permission,
        status: AccountStatus::Active,
        court_id: None,
        region_id: None,
    }
}

pub async fn seed(db: &dyn DatabaseClient, account: NewAccount) -> Account {
    db.create_account(&account).await.expect("seed account")
}
