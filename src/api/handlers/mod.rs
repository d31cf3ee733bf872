//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Login, refresh, password reset and token validation.
pub mod auth;
/// Liveness endpoint.
pub mod health;
/// Court listing and registration.
pub mod tribunals;
/// Own profile and account management.
pub mod users;
