//! TOML-based configuration for RecuperaJud
//!
//! Infrastructure settings live in `recuperajud.toml`. Secrets never do: the
//! file names the environment variables that hold them, and those are resolved
//! and checked at load time.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Root configuration structure loaded from recuperajud.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name containing the access-token secret
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    /// Environment variable name containing the refresh-token secret
    #[serde(default = "default_jwt_refresh_secret_env")]
    pub jwt_refresh_secret_env: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_jwt_access_expiry")]
    pub jwt_access_expiry: i64,

    /// Refresh token lifetime in seconds
    #[serde(default = "default_jwt_refresh_expiry")]
    pub jwt_refresh_expiry: i64,

    /// Base URL of the web client, used to build password-reset links
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    #[serde(default)]
    pub password: PasswordConfig,
}

fn default_jwt_secret_env() -> String {
    "JWT_SECRET".to_string()
}

fn default_jwt_refresh_secret_env() -> String {
    "JWT_REFRESH_SECRET".to_string()
}

fn default_jwt_access_expiry() -> i64 {
    900
}

fn default_jwt_refresh_expiry() -> i64 {
    604800
}

fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: default_jwt_secret_env(),
            jwt_refresh_secret_env: default_jwt_refresh_secret_env(),
            jwt_access_expiry: default_jwt_access_expiry(),
            jwt_refresh_expiry: default_jwt_refresh_expiry(),
            frontend_url: default_frontend_url(),
            password: PasswordConfig::default(),
        }
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PasswordConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    #[serde(default = "default_iterations")]
    pub iterations: u32,

    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory_kib() -> u32 {
    19456
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local database path, or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Environment variable for Turso URL (optional cloud config)
    pub turso_url_env: Option<String>,

    /// Environment variable for Turso auth token
    pub turso_token_env: Option<String>,
}

fn default_database_url() -> String {
    "./data/recuperajud.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            turso_url_env: None,
            turso_token_env: None,
        }
    }
}

// ============= Email Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Implicit TLS, usually port 465
    Tls,
    /// Plain connection upgraded with STARTTLS, usually port 587
    #[default]
    Starttls,
    /// No encryption; local relays and test servers only
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_email_from")]
    pub from: String,

    /// SMTP relay host. Without one, messages are logged instead of sent.
    pub smtp_host: Option<String>,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_security: SmtpSecurity,

    pub smtp_username_env: Option<String>,

    pub smtp_password_env: Option<String>,

    /// Upper bound on a single delivery attempt, in seconds
    #[serde(default = "default_email_timeout")]
    pub timeout_secs: u64,
}

fn default_email_from() -> String {
    "RecuperaJud <nao-responda@recuperajud.jus.br>".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_email_timeout() -> u64 {
    10
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from: default_email_from(),
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_security: SmtpSecurity::default(),
            smtp_username_env: None,
            smtp_password_env: None,
            timeout_secs: default_email_timeout(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl AppConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;

        config.validate()?;
        debug!("Loaded configuration from {:?}", path);

        Ok(config)
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        let access = self.jwt_secret()?;
        let refresh = self.jwt_refresh_secret()?;

        if access.is_empty() || refresh.is_empty() {
            return Err(ConfigError::ValidationError(
                "JWT secrets must not be empty".to_string(),
            ));
        }
        if access == refresh {
            return Err(ConfigError::ValidationError(format!(
                "'{}' and '{}' must hold different secrets",
                self.auth.jwt_secret_env, self.auth.jwt_refresh_secret_env
            )));
        }

        if self.auth.jwt_access_expiry <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.jwt_access_expiry must be positive".to_string(),
            ));
        }
        if self.auth.jwt_refresh_expiry <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.jwt_refresh_expiry must be positive".to_string(),
            ));
        }

        let password = &self.auth.password;
        argon2::Params::new(
            password.memory_kib,
            password.iterations,
            password.parallelism,
            None,
        )
        .map_err(|e| ConfigError::ValidationError(format!("auth.password: {}", e)))?;

        if let Some(ref env) = self.database.turso_url_env {
            self.validate_env_var(env)?;
        }
        if let Some(ref env) = self.database.turso_token_env {
            self.validate_env_var(env)?;
        }

        if let Some(ref env) = self.email.smtp_username_env {
            self.validate_env_var(env)?;
        }
        if let Some(ref env) = self.email.smtp_password_env {
            self.validate_env_var(env)?;
        }
        if self.email.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "email.timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    /// Get the access-token secret from the environment
    pub fn jwt_secret(&self) -> Result<String, ConfigError> {
        self.resolve_env(&self.auth.jwt_secret_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.auth.jwt_secret_env.clone()))
    }

    /// Get the refresh-token secret from the environment
    pub fn jwt_refresh_secret(&self) -> Result<String, ConfigError> {
        self.resolve_env(&self.auth.jwt_refresh_secret_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.auth.jwt_refresh_secret_env.clone()))
    }

    /// SMTP credentials, when both variables are configured
    pub fn smtp_credentials(&self) -> Option<(String, String)> {
        let user = self.resolve_env(self.email.smtp_username_env.as_deref()?)?;
        let pass = self.resolve_env(self.email.smtp_password_env.as_deref()?)?;
        Some((user, pass))
    }
}
