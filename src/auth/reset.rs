use crate::auth::password::PasswordHasher;
use crate::db::DatabaseClient;
use crate::types::{Account, AccountPatch, AppError, ResetTokenRecord, Result};
use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

/// How long a reset token stays redeemable, in seconds.
pub const RESET_TOKEN_TTL_SECS: i64 = 60 * 60;

const RESET_TOKEN_BYTES: usize = 32;

/// Generates a raw reset token: 32 random bytes, hex encoded.
pub fn generate_raw_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hashes a token using SHA256 for storage.
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// A freshly stored reset token. `raw` is never persisted.
#[derive(Debug, Clone)]
pub struct IssuedResetToken {
    pub raw: String,
    pub record: ResetTokenRecord,
}

/// One-time password-reset tokens: issue, roll back, redeem.
pub struct ResetTokenManager {
    db: Arc<dyn DatabaseClient>,
    passwords: Arc<PasswordHasher>,
}

impl ResetTokenManager {
    pub fn new(db: Arc<dyn DatabaseClient>, passwords: Arc<PasswordHasher>) -> Self {
        Self { db, passwords }
    }

    /// Stores the hash of a new token on the account, replacing any earlier
    /// one, and returns the raw token.
    pub async fn create(&self, account: &Account) -> Result<IssuedResetToken> {
        let raw = generate_raw_token();
        let record = ResetTokenRecord {
            hash: hash_token(&raw),
            expires_at: Utc::now().timestamp() + RESET_TOKEN_TTL_SECS,
        };

        let patch = AccountPatch {
            reset_token: Some(Some(record.clone())),
            ..Default::default()
        };
        self.db
            .update_account(account.id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário não encontrado".to_string()))?;

        Ok(IssuedResetToken { raw, record })
    }

    /// Removes a token the user never received. A newer token issued in the
    /// meantime is left alone.
    pub async fn rollback(&self, account_id: i64, record: &ResetTokenRecord) -> Result<()> {
        let cleared = self
            .db
            .clear_reset_token_if_matches(account_id, &record.hash)
            .await?;
        if !cleared {
            info!(account_id, "reset token already superseded, nothing to roll back");
        }
        Ok(())
    }

    /// Issues a token and hands the raw value to `deliver`. If delivery
    /// fails the token is rolled back before `EmailDeliveryFailed` is returned.
    pub async fn create_and_deliver<F, Fut>(&self, account: &Account, deliver: F) -> Result<()>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let issued = self.create(account).await?;

        if let Err(e) = deliver(issued.raw).await {
            warn!(account_id = account.id, error = %e, "reset token delivery failed");
            if let Err(rollback_err) = self.rollback(account.id, &issued.record).await {
                error!(
                    account_id = account.id,
                    error = %rollback_err,
                    "failed to roll back undelivered reset token"
                );
                return Err(rollback_err);
            }
            return Err(AppError::EmailDeliveryFailed);
        }

        Ok(())
    }

    /// Sets a new password for the holder of `raw`. The token is consumed in
    /// the same statement, so replays and concurrent duplicates fail.
    pub async fn redeem(&self, raw: &str, new_password: &str) -> Result<Account> {
        let hash = hash_token(raw);
        let now = Utc::now().timestamp();

        // cheap check before paying for the password hash
        if self
            .db
            .find_account_by_reset_token_hash(&hash, now)
            .await?
            .is_none()
        {
            return Err(AppError::InvalidOrExpiredResetToken);
        }

        let new_hash = self.passwords.hash(new_password)?;

        self.db
            .redeem_reset_token(&hash, Utc::now().timestamp(), &new_hash)
            .await?
            .ok_or(AppError::InvalidOrExpiredResetToken)
    }
}
