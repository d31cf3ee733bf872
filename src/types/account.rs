//! Account, role and audit types.
//!
//! `Permission` is the flat wire form of a role as it travels in request bodies,
//! token claims and route role-sets. `Role` is the scoped form used by the
//! authorization policy: each variant carries the association that limits it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

// ============= Roles =============

/// Permission level as stored and transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Permission {
    #[serde(rename = "administrador_nacional")]
    NationalAdmin,
    #[serde(rename = "administrador_regional")]
    RegionalAdmin,
    #[serde(rename = "operador")]
    Operator,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::NationalAdmin => "administrador_nacional",
            Permission::RegionalAdmin => "administrador_regional",
            Permission::Operator => "operador",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "administrador_nacional" => Ok(Permission::NationalAdmin),
            "administrador_regional" => Ok(Permission::RegionalAdmin),
            "operador" => Ok(Permission::Operator),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// A role together with the scope it is confined to.
///
/// A regional admin without a region, or an operator without a court, is
/// representable: accounts can be persisted that way. Such identities are
/// denied by any path that names a region or court.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    NationalAdmin,
    RegionalAdmin { region_id: Option<i64> },
    Operator { court_id: Option<i64> },
}

impl Role {
    pub fn permission(&self) -> Permission {
        match self {
            Role::NationalAdmin => Permission::NationalAdmin,
            Role::RegionalAdmin { .. } => Permission::RegionalAdmin,
            Role::Operator { .. } => Permission::Operator,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobTitle {
    Magistrado,
    Servidor,
}

impl JobTitle {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobTitle::Magistrado => "magistrado",
            JobTitle::Servidor => "servidor",
        }
    }
}

impl FromStr for JobTitle {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "magistrado" => Ok(JobTitle::Magistrado),
            "servidor" => Ok(JobTitle::Servidor),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum AccountStatus {
    #[default]
    #[serde(rename = "ativo")]
    Active,
    #[serde(rename = "inativo")]
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ativo",
            AccountStatus::Inactive => "inativo",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ativo" => Ok(AccountStatus::Active),
            "inativo" => Ok(AccountStatus::Inactive),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// A stored enum column held a value outside its closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant '{0}'")]
pub struct UnknownVariant(pub String);

// ============= Accounts =============

/// The persisted half of a password-reset token.
///
/// Hash and expiry only ever exist together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetTokenRecord {
    /// Hex SHA-256 of the raw token
    pub hash: String,
    /// Unix timestamp after which the token is dead
    pub expires_at: i64,
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub job_title: JobTitle,
    pub permission: Permission,
    pub status: AccountStatus,
    pub court_id: Option<i64>,
    pub region_id: Option<i64>,
    pub last_access_at: Option<i64>,
    pub reset_token: Option<ResetTokenRecord>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn role(&self) -> Role {
        match self.permission {
            Permission::NationalAdmin => Role::NationalAdmin,
            Permission::RegionalAdmin => Role::RegionalAdmin {
                region_id: self.region_id,
            },
            Permission::Operator => Role::Operator {
                court_id: self.court_id,
            },
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            nome: self.name.clone(),
            email: self.email.clone(),
            cargo: self.job_title,
            permissao: self.permission,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            nome: self.name.clone(),
            email: self.email.clone(),
            cargo: self.job_title,
            permissao: self.permission,
            status: self.status,
            tribunal_id: self.court_id,
            regiao_id: self.region_id,
            ultimo_acesso: self
                .last_access_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            created_at: DateTime::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}

/// Fields for a new account row.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub job_title: JobTitle,
    pub permission: Permission,
    pub status: AccountStatus,
    pub court_id: Option<i64>,
    pub region_id: Option<i64>,
}

/// Partial update applied as a single statement.
///
/// `None` leaves a column untouched. For the nullable associations the inner
/// `Option` is the new value, so `Some(None)` clears the column.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub job_title: Option<JobTitle>,
    pub permission: Option<Permission>,
    pub status: Option<AccountStatus>,
    pub court_id: Option<Option<i64>>,
    pub region_id: Option<Option<i64>>,
    /// Set both reset fields, or clear both with `Some(None)`
    pub reset_token: Option<Option<ResetTokenRecord>>,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.name.is_none()
            && self.password_hash.is_none()
            && self.job_title.is_none()
            && self.permission.is_none()
            && self.status.is_none()
            && self.court_id.is_none()
            && self.region_id.is_none()
            && self.reset_token.is_none()
    }
}

/// Listing filter; `page` is 1-based.
#[derive(Debug, Clone)]
pub struct AccountFilter {
    pub search: Option<String>,
    pub permission: Option<Permission>,
    pub status: Option<AccountStatus>,
    pub court_id: Option<i64>,
    pub region_id: Option<i64>,
    pub page: u32,
    pub limit: u32,
}

impl Default for AccountFilter {
    fn default() -> Self {
        Self {
            search: None,
            permission: None,
            status: None,
            court_id: None,
            region_id: None,
            page: 1,
            limit: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccountPage {
    pub accounts: Vec<Account>,
    pub total: u64,
}

// ============= Identity =============

/// The authenticated caller, attached to the request by the auth gate.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub job_title: JobTitle,
    pub role: Role,
}

impl Identity {
    pub fn permission(&self) -> Permission {
        self.role.permission()
    }
}

impl From<&Account> for Identity {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            name: account.name.clone(),
            job_title: account.job_title,
            role: account.role(),
        }
    }
}

// ============= API views =============

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: i64,
    pub nome: String,
    pub email: String,
    pub cargo: JobTitle,
    pub permissao: Permission,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub nome: String,
    pub email: String,
    pub cargo: JobTitle,
    pub permissao: Permission,
    pub status: AccountStatus,
    pub tribunal_id: Option<i64>,
    pub regiao_id: Option<i64>,
    pub ultimo_acesso: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============= Activity log =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ActivityAction {
    #[serde(rename = "login")]
    Login,
    #[serde(rename = "acesso")]
    Access,
    #[serde(rename = "redefinir_senha")]
    PasswordReset,
    #[serde(rename = "alterar_senha")]
    PasswordChange,
    #[serde(rename = "criar")]
    Create,
    #[serde(rename = "atualizar")]
    Update,
    #[serde(rename = "excluir")]
    Delete,
    #[serde(rename = "atualizar_perfil")]
    ProfileUpdate,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Login => "login",
            ActivityAction::Access => "acesso",
            ActivityAction::PasswordReset => "redefinir_senha",
            ActivityAction::PasswordChange => "alterar_senha",
            ActivityAction::Create => "criar",
            ActivityAction::Update => "atualizar",
            ActivityAction::Delete => "excluir",
            ActivityAction::ProfileUpdate => "atualizar_perfil",
        }
    }
}

impl FromStr for ActivityAction {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(ActivityAction::Login),
            "acesso" => Ok(ActivityAction::Access),
            "redefinir_senha" => Ok(ActivityAction::PasswordReset),
            "alterar_senha" => Ok(ActivityAction::PasswordChange),
            "criar" => Ok(ActivityAction::Create),
            "atualizar" => Ok(ActivityAction::Update),
            "excluir" => Ok(ActivityAction::Delete),
            "atualizar_perfil" => Ok(ActivityAction::ProfileUpdate),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Requester details stamped on every audit entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewActivityLog {
    pub account_id: i64,
    pub action: ActivityAction,
    /// Target entity type, e.g. `usuario` or `sistema`
    pub entity: String,
    pub entity_id: Option<i64>,
    pub description: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl NewActivityLog {
    /// An entry about a user account, stamped with the requester's details.
    pub fn on_account(
        actor_id: i64,
        action: ActivityAction,
        target_id: i64,
        description: impl Into<String>,
        meta: &RequestMeta,
    ) -> Self {
        Self {
            account_id: actor_id,
            action,
            entity: "usuario".to_string(),
            entity_id: Some(target_id),
            description: description.into(),
            ip: meta.ip.clone(),
            user_agent: meta.user_agent.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: i64,
    pub usuario_id: i64,
    pub acao: ActivityAction,
    pub entidade: String,
    pub entidade_id: Option<i64>,
    pub descricao: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: i64,
}

// ============= Courts =============

/// A tribunal, with the region it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Court {
    pub id: i64,
    pub nome: String,
    pub sigla: String,
    pub regiao_id: Option<i64>,
}
