#![allow(clippy::needless_for_each)]

use crate::api::handlers::{auth, health, tribunals, users};
use crate::types::{
    AccountStatus, ChangePasswordRequest, Court, CourtData, CourtList, CreateCourtRequest,
    CreateUserRequest, ForgotPasswordRequest, JobTitle, LoginData, LoginRequest, MessageResponse,
    Pagination, Permission, RefreshTokenRequest, ResetPasswordRequest, TokenPair,
    UpdateProfileRequest, UpdateUserRequest, UserList, UserListResponse, UserProfile, UserSummary,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "RecuperaJud API",
        description = "Authentication, account and court management for RecuperaJud"
    ),
    paths(
        health::health_check,
        auth::login,
        auth::refresh_token,
        auth::forgot_password,
        auth::reset_password,
        auth::validate_token,
        users::get_profile,
        users::update_profile,
        users::change_password,
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        tribunals::list_courts,
        tribunals::create_court,
        tribunals::get_court,
        tribunals::list_region_courts,
    ),
    components(schemas(
        health::HealthResponse,
        LoginRequest,
        LoginData,
        RefreshTokenRequest,
        TokenPair,
        ForgotPasswordRequest,
        ResetPasswordRequest,
        ChangePasswordRequest,
        UpdateProfileRequest,
        CreateUserRequest,
        UpdateUserRequest,
        UserSummary,
        UserProfile,
        UserList,
        UserListResponse,
        Pagination,
        Permission,
        JobTitle,
        AccountStatus,
        Court,
        CourtData,
        CourtList,
        CreateCourtRequest,
        MessageResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Login, tokens and password reset"),
        (name = "users", description = "Own profile and account management"),
        (name = "tribunais", description = "Courts"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// The generated OpenAPI document.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
