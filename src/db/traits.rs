//! Database abstraction traits
//!
//! This module provides the `DatabaseClient` trait that abstracts over the
//! database backends (in-memory SQLite, file-based SQLite, remote Turso).
//!
//! # Example
//!
//! ```rust,ignore
//! use recuperajud::db::{DatabaseClient, DatabaseProvider};
//!
//! // Use in-memory database (default for development/testing)
//! let db = DatabaseProvider::Memory.create_client().await?;
//!
//! // Use file-based SQLite
//! let db = DatabaseProvider::SQLite { path: "data.db".into() }.create_client().await?;
//! ```

use crate::types::{
    Account, AccountFilter, AccountPage, AccountPatch, ActivityLogEntry, AppError, Court,
    NewAccount, NewActivityLog, Result,
};
use crate::utils::toml_config::AppConfig;
use async_trait::async_trait;
use std::sync::Arc;

/// Database provider configuration
#[derive(Debug, Clone, Default)]
pub enum DatabaseProvider {
    /// In-memory SQLite database (ephemeral, lost on restart)
    #[default]
    Memory,
    /// File-based SQLite database
    SQLite {
        /// Path to the SQLite database file
        path: String,
    },
    /// Remote Turso database (requires network access)
    #[cfg(feature = "turso")]
    Turso {
        /// The Turso database URL (e.g., `libsql://your-db.turso.io`)
        url: String,
        /// Authentication token for the Turso database
        auth_token: String,
    },
}

impl DatabaseProvider {
    /// Create a database client from this provider configuration
    pub async fn create_client(&self) -> Result<Arc<dyn DatabaseClient>> {
        match self {
            DatabaseProvider::Memory => {
                let client = super::turso::TursoClient::new_memory().await?;
                Ok(Arc::new(client))
            }
            DatabaseProvider::SQLite { path } => {
                let client = super::turso::TursoClient::new_local(path).await?;
                Ok(Arc::new(client))
            }
            #[cfg(feature = "turso")]
            DatabaseProvider::Turso { url, auth_token } => {
                let client =
                    super::turso::TursoClient::new_remote(url.clone(), auth_token.clone()).await?;
                Ok(Arc::new(client))
            }
        }
    }

    /// Pick the provider described by the `[database]` section.
    ///
    /// Remote Turso wins when both of its env vars resolve; otherwise `url`
    /// is a local path, with `:memory:` meaning an ephemeral database.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        #[cfg(feature = "turso")]
        {
            if let (Some(url_env), Some(token_env)) = (
                config.database.turso_url_env.as_deref(),
                config.database.turso_token_env.as_deref(),
            ) {
                let url = config.resolve_env(url_env).ok_or_else(|| {
                    AppError::Internal(format!("Environment variable '{}' is not set", url_env))
                })?;
                let auth_token = config.resolve_env(token_env).ok_or_else(|| {
                    AppError::Internal(format!("Environment variable '{}' is not set", token_env))
                })?;
                return Ok(DatabaseProvider::Turso { url, auth_token });
            }
        }

        let url = config.database.url.trim();
        if url.is_empty() {
            return Err(AppError::Internal("database.url must not be empty".to_string()));
        }
        if url == ":memory:" {
            return Ok(DatabaseProvider::Memory);
        }
        Ok(DatabaseProvider::SQLite {
            path: url.to_string(),
        })
    }
}

/// Abstract trait for database operations
///
/// Every method that changes more than one column does so in a single
/// statement, so a concurrent reader never observes half of an update.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    // ============== Account Operations ==============

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    async fn find_account_by_id(&self, id: i64) -> Result<Option<Account>>;

    /// Account holding an unexpired reset token with this hash
    async fn find_account_by_reset_token_hash(
        &self,
        hash: &str,
        now: i64,
    ) -> Result<Option<Account>>;

    /// Insert an account. A duplicate email is `AppError::Conflict`.
    async fn create_account(&self, account: &NewAccount) -> Result<Account>;

    /// Apply a partial update; `None` if no such account exists.
    async fn update_account(&self, id: i64, patch: &AccountPatch) -> Result<Option<Account>>;

    /// Swap in a new password hash and clear the reset fields, provided the
    /// reset token hash matches and is unexpired. At most one caller wins.
    async fn redeem_reset_token(
        &self,
        hash: &str,
        now: i64,
        new_password_hash: &str,
    ) -> Result<Option<Account>>;

    /// Clear the reset fields only if they still hold `hash`
    async fn clear_reset_token_if_matches(&self, account_id: i64, hash: &str) -> Result<bool>;

    async fn touch_last_access(&self, account_id: i64, at: i64) -> Result<()>;

    async fn list_accounts(&self, filter: &AccountFilter) -> Result<AccountPage>;

    async fn delete_account(&self, id: i64) -> Result<bool>;

    // ============== Activity Log Operations ==============

    async fn append_activity_log(&self, entry: &NewActivityLog) -> Result<()>;

    /// Most recent entries first
    async fn list_activity_logs(&self, account_id: i64, limit: u32)
        -> Result<Vec<ActivityLogEntry>>;

    // ============== Court Operations ==============

    async fn create_court(&self, name: &str, acronym: &str, region_id: Option<i64>)
        -> Result<Court>;

    async fn find_court_by_id(&self, id: i64) -> Result<Option<Court>>;

    async fn list_courts(&self, region_id: Option<i64>) -> Result<Vec<Court>>;
}

// ============== Implement DatabaseClient for TursoClient ==============

#[async_trait]
impl DatabaseClient for super::turso::TursoClient {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        super::turso::TursoClient::find_account_by_email(self, email).await
    }

    async fn find_account_by_id(&self, id: i64) -> Result<Option<Account>> {
        super::turso::TursoClient::find_account_by_id(self, id).await
    }

    async fn find_account_by_reset_token_hash(
        &self,
        hash: &str,
        now: i64,
    ) -> Result<Option<Account>> {
        super::turso::TursoClient::find_account_by_reset_token_hash(self, hash, now).await
    }

    async fn create_account(&self, account: &NewAccount) -> Result<Account> {
        super::turso::TursoClient::create_account(self, account).await
    }

    async fn update_account(&self, id: i64, patch: &AccountPatch) -> Result<Option<Account>> {
        super::turso::TursoClient::update_account(self, id, patch).await
    }

    async fn redeem_reset_token(
        &self,
        hash: &str,
        now: i64,
        new_password_hash: &str,
    ) -> Result<Option<Account>> {
        super::turso::TursoClient::redeem_reset_token(self, hash, now, new_password_hash).await
    }

    async fn clear_reset_token_if_matches(&self, account_id: i64, hash: &str) -> Result<bool> {
        super::turso::TursoClient::clear_reset_token_if_matches(self, account_id, hash).await
    }

    async fn touch_last_access(&self, account_id: i64, at: i64) -> Result<()> {
        super::turso::TursoClient::touch_last_access(self, account_id, at).await
    }

    async fn list_accounts(&self, filter: &AccountFilter) -> Result<AccountPage> {
        super::turso::TursoClient::list_accounts(self, filter).await
    }

    async fn delete_account(&self, id: i64) -> Result<bool> {
        super::turso::TursoClient::delete_account(self, id).await
    }

    async fn append_activity_log(&self, entry: &NewActivityLog) -> Result<()> {
        super::turso::TursoClient::append_activity_log(self, entry).await
    }

    async fn list_activity_logs(
        &self,
        account_id: i64,
        limit: u32,
    ) -> Result<Vec<ActivityLogEntry>> {
        super::turso::TursoClient::list_activity_logs(self, account_id, limit).await
    }

    async fn create_court(
        &self,
        name: &str,
        acronym: &str,
        region_id: Option<i64>,
    ) -> Result<Court> {
        super::turso::TursoClient::create_court(self, name, acronym, region_id).await
    }

    async fn find_court_by_id(&self, id: i64) -> Result<Option<Court>> {
        super::turso::TursoClient::find_court_by_id(self, id).await
    }

    async fn list_courts(&self, region_id: Option<i64>) -> Result<Vec<Court>> {
        super::turso::TursoClient::list_courts(self, region_id).await
    }
}
