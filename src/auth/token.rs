use crate::types::{Account, AppError, Permission, TokenPair};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Why a token was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token signature or format is invalid")]
    Invalid,
    #[error("token has expired")]
    Expired,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid | TokenError::Expired => AppError::InvalidOrExpiredToken,
            TokenError::Signing(msg) => AppError::Internal(msg),
        }
    }
}

/// A verified payload together with its registered time claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims<P> {
    #[serde(flatten)]
    pub payload: P,
    pub iat: i64,
    pub exp: i64,
}

/// Access token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPayload {
    pub id: i64,
    pub email: String,
    pub permissao: Permission,
}

/// Refresh token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshPayload {
    pub id: i64,
}

/// Issues and verifies HS256 tokens.
///
/// Access and refresh tokens are signed with different secrets, so neither
/// kind verifies as the other.
pub struct TokenService {
    access_secret: String,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// # Arguments
    /// * `access_secret` - Secret for access tokens
    /// * `refresh_secret` - Secret for refresh tokens, distinct from the access secret
    /// * `access_expiry` - Access token validity in seconds
    /// * `refresh_expiry` - Refresh token validity in seconds
    pub fn new(
        access_secret: String,
        refresh_secret: String,
        access_expiry: i64,
        refresh_expiry: i64,
    ) -> Self {
        Self {
            access_secret,
            refresh_secret,
            access_ttl: Duration::seconds(access_expiry),
            refresh_ttl: Duration::seconds(refresh_expiry),
        }
    }

    /// Signs `payload` with `secret`, adding `iat` and `exp = iat + ttl`.
    pub fn issue<P: Serialize>(
        payload: &P,
        secret: &str,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            payload,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Checks signature and expiry, then decodes the payload.
    pub fn verify<P: DeserializeOwned>(token: &str, secret: &str) -> Result<Claims<P>, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims<P>>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
    }

    /// Issues the access and refresh token pair for an account.
    pub fn issue_pair(&self, account: &Account) -> Result<TokenPair, TokenError> {
        let access = AccessPayload {
            id: account.id,
            email: account.email.clone(),
            permissao: account.permission,
        };
        let refresh = RefreshPayload { id: account.id };

        Ok(TokenPair {
            access_token: Self::issue(&access, &self.access_secret, self.access_ttl)?,
            refresh_token: Self::issue(&refresh, &self.refresh_secret, self.refresh_ttl)?,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims<AccessPayload>, TokenError> {
        Self::verify(token, &self.access_secret)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims<RefreshPayload>, TokenError> {
        Self::verify(token, &self.refresh_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountStatus, JobTitle};

    const ACCESS: &str = "access-secret-that-is-at-least-32-chars";
    const REFRESH: &str = "refresh-secret-that-is-at-least-32-chars";

    fn create_test_service() -> TokenService {
        TokenService::new(ACCESS.to_string(), REFRESH.to_string(), 900, 604800)
    }

    fn test_account() -> Account {
        Account {
            id: 42,
            email: "juiz@tjsp.jus.br".to_string(),
            password_hash: String::new(),
            name: "Juiz".to_string(),
            job_title: JobTitle::Magistrado,
            permission: Permission::RegionalAdmin,
            status: AccountStatus::Active,
            court_id: None,
            region_id: Some(2),
            last_access_at: None,
            reset_token: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_issue_then_verify_returns_payload() {
        let payload = RefreshPayload { id: 9 };
        let token =
            TokenService::issue(&payload, ACCESS, Duration::seconds(60)).expect("should sign");

        let claims = TokenService::verify::<RefreshPayload>(&token, ACCESS).expect("should verify");

        assert_eq!(claims.payload, payload);
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_elapsed_ttl_is_expired() {
        let token = TokenService::issue(&RefreshPayload { id: 9 }, ACCESS, Duration::seconds(-5))
            .expect("should sign");

        assert_eq!(
            TokenService::verify::<RefreshPayload>(&token, ACCESS),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = TokenService::issue(&RefreshPayload { id: 9 }, ACCESS, Duration::seconds(60))
            .expect("should sign");

        assert_eq!(
            TokenService::verify::<RefreshPayload>(&token, "some-other-secret-of-32-characters"),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert_eq!(
            TokenService::verify::<RefreshPayload>("invalid.token.here", ACCESS),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_tampered_payload_is_invalid() {
        let token = TokenService::issue(&RefreshPayload { id: 1 }, ACCESS, Duration::seconds(60))
            .expect("should sign");
        let other = TokenService::issue(&RefreshPayload { id: 2 }, ACCESS, Duration::seconds(60))
            .expect("should sign");

        // header and signature of one token, payload of the other
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert_eq!(
            TokenService::verify::<RefreshPayload>(&forged, ACCESS),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_pair_carries_account_claims() {
        let service = create_test_service();
        let pair = service.issue_pair(&test_account()).expect("should issue");

        let access = service.verify_access(&pair.access_token).expect("access verifies");
        assert_eq!(access.payload.id, 42);
        assert_eq!(access.payload.email, "juiz@tjsp.jus.br");
        assert_eq!(access.payload.permissao, Permission::RegionalAdmin);
        assert_eq!(access.exp - access.iat, 900);

        let refresh = service.verify_refresh(&pair.refresh_token).expect("refresh verifies");
        assert_eq!(refresh.payload.id, 42);
        assert_eq!(refresh.exp - refresh.iat, 604800);
    }

    #[test]
    fn test_token_kinds_do_not_cross() {
        let service = create_test_service();
        let pair = service.issue_pair(&test_account()).expect("should issue");

        assert_eq!(
            service.verify_refresh(&pair.access_token),
            Err(TokenError::Invalid)
        );
        assert_eq!(
            service.verify_access(&pair.refresh_token),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_token_errors_map_to_one_client_error() {
        assert!(matches!(
            AppError::from(TokenError::Expired),
            AppError::InvalidOrExpiredToken
        ));
        assert!(matches!(
            AppError::from(TokenError::Invalid),
            AppError::InvalidOrExpiredToken
        ));
    }
}
