//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for RecuperaJud, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//! - [`api::validation`](crate::api::validation) - Request body rules
//!
//! # API Endpoints
//!
//! ## Authentication (`/api/auth`)
//! - `POST /api/auth/login` - Login and receive an access/refresh token pair
//! - `POST /api/auth/refresh-token` - Exchange a refresh token for a new pair
//! - `POST /api/auth/forgot-password` - Request a password reset email
//! - `POST /api/auth/reset-password` - Set a new password with a reset token
//! - `GET /api/auth/validate-token` - Check an access token
//!
//! ## Users (`/api/users`)
//! - `GET|PUT /api/users/profile` - Own profile
//! - `PUT /api/users/change-password` - Change own password
//! - `GET|POST /api/users` - List and create accounts (administrators)
//! - `GET|PUT|DELETE /api/users/{id}` - Manage one account (administrators)
//!
//! ## Courts
//! - `GET|POST /api/tribunais` - List and register courts
//! - `GET /api/tribunais/{tribunal_id}` - One court, scoped for operators
//! - `GET /api/regioes/{regiao_id}/tribunais` - Courts of a region, scoped for regional administrators
//!
//! ## Health
//! - `GET /health` - Liveness check
//!
//! # Authentication
//!
//! Every route outside `/api/auth` requires a valid access token in the
//! `Authorization` header:
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! # OpenAPI Documentation
//!
//! When the `swagger-ui` feature is enabled, interactive API documentation
//! is available at `/swagger-ui/`.

/// `Json` extractor with the API's error envelope.
pub mod extract;
/// Request and response handlers for all API endpoints.
pub mod handlers;
/// OpenAPI document.
pub mod openapi;
/// Router configuration and route definitions.
pub mod routes;
/// Request body validation.
pub mod validation;
