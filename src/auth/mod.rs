//! Authentication and authorization.
//!
//! - [`token`] signs and verifies access and refresh tokens
//! - [`password`] hashes and checks passwords with Argon2id
//! - [`reset`] manages one-time password reset tokens
//! - [`middleware`] is the request gate that turns a bearer token into an [`Identity`](crate::types::Identity)
//! - [`policy`] decides whether an identity may reach a route
//! - [`service`] composes the above into the login, refresh and password flows
//!
//! Requests pass the gate first, then the policy, then reach the handler.

/// Authentication gate and request extractors.
pub mod middleware;
/// Argon2id password hashing.
pub mod password;
/// Role and scope authorization.
pub mod policy;
/// Password reset tokens.
pub mod reset;
/// Login, refresh and password flows.
pub mod service;
/// Access and refresh tokens.
pub mod token;
