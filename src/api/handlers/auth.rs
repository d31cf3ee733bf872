use crate::{
    api::{extract::AppJson, validation},
    auth::middleware::bearer_token,
    types::{
        ApiResponse, AppError, ForgotPasswordRequest, LoginData, LoginRequest, MessageResponse,
        RefreshTokenRequest, RequestMeta, ResetPasswordRequest, Result, TokenPair, UserData,
        UserProfile,
    },
    AppState,
};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};

/// Answer for every forgot-password request, whether or not the email exists.
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "Se o email estiver cadastrado, você receberá um link para redefinir sua senha.";

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginData>),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Inactive account")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    meta: RequestMeta,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginData>>> {
    validation::login(&payload)?;

    let data = state
        .auth
        .login(&payload.email, &payload.senha, &meta)
        .await?;

    Ok(Json(ApiResponse::success(data)))
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/api/auth/refresh-token",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = ApiResponse<TokenPair>),
        (status = 401, description = "Invalid or expired refresh token")
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshTokenRequest>,
) -> Result<Json<ApiResponse<TokenPair>>> {
    validation::refresh_token(&payload)?;

    let tokens = state.auth.refresh(&payload.refresh_token).await?;

    Ok(Json(ApiResponse::success(tokens)))
}

/// Request a password reset link
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Request accepted", body = MessageResponse),
        (status = 500, description = "Reset email could not be delivered")
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    validation::forgot_password(&payload)?;

    state.auth.forgot_password(&payload.email).await?;

    Ok(Json(MessageResponse::success(FORGOT_PASSWORD_MESSAGE)))
}

/// Set a new password using a reset token
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid input or invalid/expired token")
    ),
    tag = "auth"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    meta: RequestMeta,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    validation::reset_password(&payload)?;

    state
        .auth
        .reset_password(&payload.token, &payload.senha, &meta)
        .await?;

    Ok(Json(MessageResponse::success("Senha redefinida com sucesso.")))
}

/// Check an access token and return its account
#[utoipa::path(
    get,
    path = "/api/auth/validate-token",
    responses(
        (status = 200, description = "Token is valid", body = ApiResponse<UserData<UserProfile>>),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn validate_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<UserData<UserProfile>>>> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| AppError::Unauthorized("Token não fornecido".to_string()))?;

    let account = state.auth.validate_token(token).await?;

    Ok(Json(ApiResponse::success(UserData {
        user: account.profile(),
    })))
}
