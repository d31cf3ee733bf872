//! # RecuperaJud server
//!
//! Authentication and access-control backend for judicial-recovery case
//! tracking: login with short-lived access tokens and longer-lived refresh
//! tokens, email-based password reset, and role-scoped authorization over
//! accounts and courts.
//!
//! ## Overview
//!
//! The crate can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `recuperajud-server` binary
//! 2. **As a library** - Build the router with [`build_app`] and embed it
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use recuperajud::{build_app, AppConfig, AppState, AuthFlows};
//! use recuperajud::db::DatabaseProvider;
//! use recuperajud::email::LogEmailSender;
//! use std::sync::Arc;
//!
//! let config = AppConfig::load("recuperajud.toml")?;
//! let db = DatabaseProvider::from_config(&config)?.create_client().await?;
//! let auth = Arc::new(AuthFlows::from_config(&config, db.clone(), Arc::new(LogEmailSender))?);
//!
//! let app = build_app(AppState { db, auth });
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `local-db` | Local SQLite database (default) |
//! | `turso` | Remote Turso database |
//! | `swagger-ui` | Interactive API docs at `/swagger-ui` |
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - Tokens, passwords, reset tokens, the auth gate and the role policy
//! - [`db`] - Database abstraction (SQLite, Turso)
//! - [`email`] - Outbound email
//! - [`types`] - Domain types, request/response bodies and errors
//! - [`utils`] - TOML configuration
//!
//! ## Request pipeline
//!
//! Every protected request passes the authentication gate, which resolves the
//! bearer token to an active account, then the authorization policy of the
//! matched route, then reaches its handler.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Authentication, authorization and the auth flows.
pub mod auth;
/// Command-line interface.
pub mod cli;
/// Database clients (Turso/SQLite).
pub mod db;
/// Outbound email delivery.
pub mod email;
/// Core types (domain, requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

pub use auth::service::AuthFlows;
pub use db::{DatabaseClient, TursoClient};
pub use types::{AppError, Result};
pub use utils::toml_config::AppConfig;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Account, court and activity log storage
    pub db: Arc<dyn DatabaseClient>,
    /// Login, token and password flows
    pub auth: Arc<AuthFlows>,
}

/// Builds the complete HTTP application: `/health`, the `/api` routes and,
/// with the `swagger-ui` feature, the interactive docs.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/health", get(api::handlers::health::health_check))
        .nest("/api", api::routes::create_router(state.auth.gate()));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", api::openapi::openapi()),
    );

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
