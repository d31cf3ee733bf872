use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod account;

pub use account::{
    Account, AccountFilter, AccountPage, AccountPatch, AccountStatus, ActivityAction,
    ActivityLogEntry, Court, Identity, JobTitle, NewAccount, NewActivityLog, Permission,
    RequestMeta, ResetTokenRecord, Role, UserProfile, UserSummary,
};

// ============= Authentication Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub senha: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub senha: String,
    #[serde(default)]
    pub confirmar_senha: String,
}

/// Access and refresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: UserSummary,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserData<T> {
    pub user: T,
}

// ============= Account Management Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub senha_atual: String,
    #[serde(default)]
    pub nova_senha: String,
    #[serde(default)]
    pub confirmar_senha: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub senha: String,
    pub cargo: JobTitle,
    pub permissao: Permission,
    pub tribunal_id: Option<i64>,
    pub regiao_id: Option<i64>,
    pub status: Option<AccountStatus>,
}

/// Partial account update. Absent keys are left unchanged; an explicit
/// `null` on `tribunalId`/`regiaoId` clears the association.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub nome: Option<String>,
    pub email: Option<String>,
    pub cargo: Option<JobTitle>,
    pub permissao: Option<Permission>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub tribunal_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub regiao_id: Option<Option<i64>>,
    pub status: Option<AccountStatus>,
}

fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    pub permissao: Option<Permission>,
    pub status: Option<AccountStatus>,
    pub tribunal: Option<i64>,
    pub regiao: Option<i64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserList {
    pub users: Vec<UserProfile>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    pub status: String,
    pub results: usize,
    pub pagination: Pagination,
    pub data: UserList,
}

// ============= Court Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourtRequest {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub sigla: String,
    pub regiao_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourtData {
    pub tribunal: Court,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourtList {
    pub tribunais: Vec<Court>,
}

// ============= Response Envelopes =============

/// `{status: "success", data}` envelope used by every data-bearing response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub status: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub status: String,
    pub message: String,
}

impl MessageResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}

// ============= Error Types =============

/// Every failure a request can end in.
///
/// The `Display` text of the client-facing variants is the message sent in
/// the response body. `Database` and `Internal` carry operator detail that is
/// logged and replaced with a generic message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Email ou senha incorretos")]
    InvalidCredentials,

    #[error("Usuário inativo. Entre em contato com o administrador.")]
    InactiveAccount,

    #[error("Token inválido ou expirado")]
    InvalidOrExpiredToken,

    /// The reset-password face of an unusable token; answered with 400.
    #[error("Token inválido ou expirado")]
    InvalidOrExpiredResetToken,

    #[error("Erro ao enviar email de redefinição de senha. Tente novamente mais tarde.")]
    EmailDeliveryFailed,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::InactiveAccount => StatusCode::FORBIDDEN,
            AppError::InvalidOrExpiredToken => StatusCode::UNAUTHORIZED,
            AppError::InvalidOrExpiredResetToken => StatusCode::BAD_REQUEST,
            AppError::EmailDeliveryFailed => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message that is safe to show the caller.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) => {
                "Erro interno do servidor".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({
            "status": "error",
            "message": self.client_message(),
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::InvalidInput(format!("Corpo da requisição inválido: {}", rejection.body_text()))
    }
}

impl From<axum::extract::rejection::QueryRejection> for AppError {
    fn from(rejection: axum::extract::rejection::QueryRejection) -> Self {
        AppError::InvalidInput(format!("Parâmetros inválidos: {}", rejection.body_text()))
    }
}

impl From<axum::extract::rejection::PathRejection> for AppError {
    fn from(rejection: axum::extract::rejection::PathRejection) -> Self {
        AppError::InvalidInput(format!("Parâmetro de rota inválido: {}", rejection.body_text()))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
