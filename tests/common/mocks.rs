//! Mock email senders and a database wrapper with failing side writes.
//!
//! The recording sender keeps every message so tests can pull the raw reset
//! token back out of the link, the way a user would from their inbox.

use async_trait::async_trait;
use recuperajud::db::DatabaseClient;
use recuperajud::email::{EmailMessage, EmailSender};
use recuperajud::types::{
    Account, AccountFilter, AccountPage, AccountPatch, ActivityLogEntry, AppError, Court,
    NewAccount, NewActivityLog, Result,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Keeps every message it is asked to send.
#[derive(Clone, Default)]
pub struct RecordingEmailSender {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("mailbox lock").clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().expect("mailbox lock").len()
    }

    /// Raw token from the `token=` query parameter of the latest message.
    pub fn last_reset_token(&self) -> Option<String> {
        let sent = self.sent.lock().expect("mailbox lock");
        let text = &sent.last()?.text;
        let start = text.find("token=")? + "token=".len();
        let token: String = text[start..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        (!token.is_empty()).then_some(token)
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        self.sent.lock().expect("mailbox lock").push(message.clone());
        Ok(())
    }
}

/// Rejects every message, like an unreachable relay.
#[derive(Clone, Default)]
pub struct FailingEmailSender;

#[async_trait]
impl EmailSender for FailingEmailSender {
    async fn send(&self, _message: &EmailMessage) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }
}

/// Accepts messages only after `delay`.
#[derive(Clone)]
pub struct SlowEmailSender {
    pub delay: Duration,
}

#[async_trait]
impl EmailSender for SlowEmailSender {
    async fn send(&self, _message: &EmailMessage) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Delegates to an inner database but fails every activity-log append and
/// last-access update.
pub struct BrokenAuditDb {
    inner: Arc<dyn DatabaseClient>,
}

impl BrokenAuditDb {
    pub fn new(inner: Arc<dyn DatabaseClient>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl DatabaseClient for BrokenAuditDb {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.inner.find_account_by_email(email).await
    }

    async fn find_account_by_id(&self, id: i64) -> Result<Option<Account>> {
        self.inner.find_account_by_id(id).await
    }

    async fn find_account_by_reset_token_hash(
        &self,
        hash: &str,
        now: i64,
    ) -> Result<Option<Account>> {
        self.inner.find_account_by_reset_token_hash(hash, now).await
    }

    async fn create_account(&self, account: &NewAccount) -> Result<Account> {
        self.inner.create_account(account).await
    }

    async fn update_account(&self, id: i64, patch: &AccountPatch) -> Result<Option<Account>> {
        self.inner.update_account(id, patch).await
    }

    async fn redeem_reset_token(
        &self,
        hash: &str,
        now: i64,
        new_password_hash: &str,
    ) -> Result<Option<Account>> {
        self.inner.redeem_reset_token(hash, now, new_password_hash).await
    }

    async fn clear_reset_token_if_matches(&self, account_id: i64, hash: &str) -> Result<bool> {
        self.inner.clear_reset_token_if_matches(account_id, hash).await
    }

    async fn touch_last_access(&self, _account_id: i64, _at: i64) -> Result<()> {
        Err(AppError::Database("disk I/O error".to_string()))
    }

    async fn list_accounts(&self, filter: &AccountFilter) -> Result<AccountPage> {
        self.inner.list_accounts(filter).await
    }

    async fn delete_account(&self, id: i64) -> Result<bool> {
        self.inner.delete_account(id).await
    }

    async fn append_activity_log(&self, _entry: &NewActivityLog) -> Result<()> {
        Err(AppError::Database("disk I/O error".to_string()))
    }

    async fn list_activity_logs(
        &self,
        account_id: i64,
        limit: u32,
    ) -> Result<Vec<ActivityLogEntry>> {
        self.inner.list_activity_logs(account_id, limit).await
    }

    async fn create_court(
        &self,
        name: &str,
        acronym: &str,
        region_id: Option<i64>,
    ) -> Result<Court> {
        self.inner.create_court(name, acronym, region_id).await
    }

    async fn find_court_by_id(&self, id: i64) -> Result<Option<Court>> {
        self.inner.find_court_by_id(id).await
    }

    async fn list_courts(&self, region_id: Option<i64>) -> Result<Vec<Court>> {
        self.inner.list_courts(region_id).await
    }
}
