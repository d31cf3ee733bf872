use crate::auth::service::record_activity;
use crate::auth::token::TokenService;
use crate::db::DatabaseClient;
use crate::types::{ActivityAction, AppError, Identity, NewActivityLog, RequestMeta, Result};
use axum::{
    extract::{ConnectInfo, FromRequestParts, Request},
    http::{header, request::Parts, Extensions, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves a bearer token to an active account.
///
/// `NoToken` and a bad or expired token answer 401, as does a token whose
/// account no longer exists. A disabled account answers 403. On success
/// the last-access time and an `acesso` log entry are written; failures of
/// those writes are logged and do not affect the outcome.
pub struct AuthGate {
    tokens: Arc<TokenService>,
    db: Arc<dyn DatabaseClient>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>, db: Arc<dyn DatabaseClient>) -> Self {
        Self { tokens, db }
    }

    pub async fn admit(&self, authorization: Option<&str>, meta: &RequestMeta) -> Result<Identity> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or_else(|| {
                AppError::Unauthorized("Token de autenticação não fornecido".to_string())
            })?;

        let claims = self.tokens.verify_access(token).map_err(|e| {
            debug!(reason = %e, "access token rejected");
            AppError::from(e)
        })?;

        let account = self
            .db
            .find_account_by_id(claims.payload.id)
            .await?
            .ok_or_else(|| {
                warn!(account_id = claims.payload.id, "token for missing account");
                AppError::Unauthorized("Usuário não encontrado".to_string())
            })?;

        if !account.is_active() {
            warn!(account_id = account.id, "inactive account presented a token");
            return Err(AppError::InactiveAccount);
        }

        if let Err(e) = self
            .db
            .touch_last_access(account.id, Utc::now().timestamp())
            .await
        {
            warn!(account_id = account.id, error = %e, "failed to update last access");
        }

        record_activity(
            self.db.as_ref(),
            NewActivityLog {
                account_id: account.id,
                action: ActivityAction::Access,
                entity: "sistema".to_string(),
                entity_id: None,
                description: "Acesso ao sistema".to_string(),
                ip: meta.ip.clone(),
                user_agent: meta.user_agent.clone(),
            },
        )
        .await;

        Ok(Identity::from(&account))
    }
}

/// Token part of an `Authorization: Bearer <token>` value.
pub fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware running the auth gate and attaching the `Identity`.
pub async fn authenticate(gate: Arc<AuthGate>, mut req: Request, next: Next) -> Result<Response> {
    let meta = request_meta(req.headers(), req.extensions());
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let identity = gate.admit(authorization, &meta).await?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Requester IP and user agent.
///
/// The IP is the first `X-Forwarded-For` hop when present, otherwise the
/// peer address if the server was started with connect info.
pub fn request_meta(headers: &HeaderMap, extensions: &Extensions) -> RequestMeta {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string);

    let ip = forwarded.or_else(|| {
        extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    });

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    RequestMeta { ip, user_agent }
}

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(request_meta(&parts.headers, &parts.extensions))
    }
}

/// Extractor for the identity attached by [`authenticate`].
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("Acesso não autorizado".to_string()))
    }
}
