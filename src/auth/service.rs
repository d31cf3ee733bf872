//! The auth flows exposed to clients: login, refresh, forgot and reset
//! password, token validation and password change.

use crate::auth::middleware::AuthGate;
use crate::auth::password::PasswordHasher;
use crate::auth::reset::ResetTokenManager;
use crate::auth::token::TokenService;
use crate::db::DatabaseClient;
use crate::email::{password_reset_message, EmailSender};
use crate::types::{
    Account, AccountPatch, ActivityAction, AppError, Identity, LoginData, NewActivityLog,
    RequestMeta, Result, TokenPair,
};
use crate::utils::toml_config::AppConfig;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Appends an activity log entry. A failed write is logged and dropped.
pub async fn record_activity(db: &dyn DatabaseClient, entry: NewActivityLog) {
    let action = entry.action;
    let account_id = entry.account_id;
    if let Err(e) = db.append_activity_log(&entry).await {
        warn!(
            account_id,
            action = action.as_str(),
            error = %e,
            "failed to write activity log"
        );
    }
}

pub struct AuthFlows {
    db: Arc<dyn DatabaseClient>,
    tokens: Arc<TokenService>,
    passwords: Arc<PasswordHasher>,
    resets: ResetTokenManager,
    gate: Arc<AuthGate>,
    email: Arc<dyn EmailSender>,
    frontend_url: String,
    email_timeout: Duration,
}

impl AuthFlows {
    pub fn new(
        db: Arc<dyn DatabaseClient>,
        tokens: Arc<TokenService>,
        passwords: Arc<PasswordHasher>,
        email: Arc<dyn EmailSender>,
        frontend_url: String,
        email_timeout: Duration,
    ) -> Self {
        Self {
            resets: ResetTokenManager::new(db.clone(), passwords.clone()),
            gate: Arc::new(AuthGate::new(tokens.clone(), db.clone())),
            db,
            tokens,
            passwords,
            email,
            frontend_url,
            email_timeout,
        }
    }

    /// Wires the flows from a validated configuration.
    pub fn from_config(
        config: &AppConfig,
        db: Arc<dyn DatabaseClient>,
        email: Arc<dyn EmailSender>,
    ) -> anyhow::Result<Self> {
        let tokens = TokenService::new(
            config.jwt_secret()?,
            config.jwt_refresh_secret()?,
            config.auth.jwt_access_expiry,
            config.auth.jwt_refresh_expiry,
        );
        let passwords = PasswordHasher::new(&config.auth.password)
            .context("failed to set up password hashing")?;

        Ok(Self::new(
            db,
            Arc::new(tokens),
            Arc::new(passwords),
            email,
            config.auth.frontend_url.clone(),
            Duration::from_secs(config.email.timeout_secs),
        ))
    }

    pub fn gate(&self) -> Arc<AuthGate> {
        self.gate.clone()
    }

    pub fn passwords(&self) -> &PasswordHasher {
        &self.passwords
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Checks credentials and issues a token pair.
    ///
    /// An unknown email and a wrong password fail identically, and both
    /// pay for one password verification. Status is checked only after the
    /// password, so a disabled account is not revealed to a guesser.
    pub async fn login(&self, email: &str, password: &str, meta: &RequestMeta) -> Result<LoginData> {
        let account = self.db.find_account_by_email(email).await?;
        let verified = self
            .passwords
            .verify_or_dummy(password, account.as_ref().map(|a| a.password_hash.as_str()))?;

        let account = match account {
            Some(account) if verified => account,
            _ => {
                info!("login rejected: invalid credentials");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !account.is_active() {
            warn!(account_id = account.id, "login rejected: inactive account");
            return Err(AppError::InactiveAccount);
        }

        let pair = self.tokens.issue_pair(&account)?;

        if let Err(e) = self
            .db
            .touch_last_access(account.id, Utc::now().timestamp())
            .await
        {
            warn!(account_id = account.id, error = %e, "failed to update last access");
        }
        record_activity(
            self.db.as_ref(),
            NewActivityLog::on_account(
                account.id,
                ActivityAction::Login,
                account.id,
                "Login no sistema",
                meta,
            ),
        )
        .await;

        info!(account_id = account.id, "login succeeded");
        Ok(LoginData {
            user: account.summary(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }

    /// Exchanges a refresh token for a new pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self.tokens.verify_refresh(refresh_token).map_err(|e| {
            info!(reason = %e, "refresh token rejected");
            AppError::InvalidOrExpiredToken
        })?;

        let account = self
            .db
            .find_account_by_id(claims.payload.id)
            .await?
            .filter(Account::is_active)
            .ok_or(AppError::InvalidOrExpiredToken)?;

        Ok(self.tokens.issue_pair(&account)?)
    }

    /// Emails a reset link if the address belongs to an account.
    ///
    /// Unknown addresses return `Ok` so callers answer the same either way.
    /// A send that fails or outlives the email timeout rolls the token back
    /// and yields `EmailDeliveryFailed`.
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let Some(account) = self.db.find_account_by_email(email).await? else {
            info!("password reset requested for unknown email");
            return Ok(());
        };

        let sender = self.email.clone();
        let timeout = self.email_timeout;
        let base_url = self.frontend_url.trim_end_matches('/').to_string();
        let to = account.email.clone();
        let name = account.name.clone();

        self.resets
            .create_and_deliver(&account, move |raw| async move {
                let reset_url = format!("{}/reset-password?token={}", base_url, raw);
                let message = password_reset_message(&to, &name, &reset_url);
                match tokio::time::timeout(timeout, sender.send(&message)).await {
                    Ok(sent) => sent,
                    Err(_) => Err(anyhow::anyhow!(
                        "email delivery timed out after {}s",
                        timeout.as_secs()
                    )),
                }
            })
            .await?;

        info!(account_id = account.id, "password reset email sent");
        Ok(())
    }

    /// Redeems a reset token and sets the new password.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        meta: &RequestMeta,
    ) -> Result<()> {
        let account = self.resets.redeem(token, new_password).await?;

        record_activity(
            self.db.as_ref(),
            NewActivityLog::on_account(
                account.id,
                ActivityAction::PasswordReset,
                account.id,
                "Redefinição de senha",
                meta,
            ),
        )
        .await;

        info!(account_id = account.id, "password reset completed");
        Ok(())
    }

    /// Resolves an access token to its active account.
    pub async fn validate_token(&self, access_token: &str) -> Result<Account> {
        let claims = self
            .tokens
            .verify_access(access_token)
            .map_err(|_| AppError::InvalidOrExpiredToken)?;

        self.db
            .find_account_by_id(claims.payload.id)
            .await?
            .filter(Account::is_active)
            .ok_or(AppError::InvalidOrExpiredToken)
    }

    /// Changes the caller's password after checking the current one. Any
    /// pending reset token is discarded in the same update.
    pub async fn change_password(
        &self,
        identity: &Identity,
        current_password: &str,
        new_password: &str,
        meta: &RequestMeta,
    ) -> Result<()> {
        let account = self
            .db
            .find_account_by_id(identity.id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Usuário não encontrado".to_string()))?;

        if !self
            .passwords
            .verify(current_password, &account.password_hash)?
        {
            return Err(AppError::Unauthorized("Senha atual incorreta".to_string()));
        }

        let patch = AccountPatch {
            password_hash: Some(self.passwords.hash(new_password)?),
            reset_token: Some(None),
            ..Default::default()
        };
        self.db
            .update_account(account.id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário não encontrado".to_string()))?;

        record_activity(
            self.db.as_ref(),
            NewActivityLog::on_account(
                account.id,
                ActivityAction::PasswordChange,
                account.id,
                "Alteração de senha",
                meta,
            ),
        )
        .await;

        Ok(())
    }
}
