use crate::api::handlers::{auth, tribunals, users};
use crate::auth::middleware::{authenticate, AuthGate};
use crate::auth::policy::{authorize, RequiredPermissions, ADMINS, ALL_ROLES, ANY_ROLE, NATIONAL_ADMIN};
use crate::types::Permission;
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post, put, MethodRouter},
    Router,
};
use std::sync::Arc;

/// Attaches the role check for `roles` to every method of `route`.
fn guarded(route: MethodRouter<AppState>, roles: &'static [Permission]) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(
        RequiredPermissions(roles),
        authorize,
    ))
}

/// Routes mounted under `/api`.
pub fn create_router(gate: Arc<AuthGate>) -> Router<AppState> {
    let public_routes = Router::new()
        // Public routes (no auth required)
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh-token", post(auth::refresh_token))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/validate-token", get(auth::validate_token));

    let protected_routes = Router::new()
        // Own account
        .route(
            "/users/profile",
            guarded(get(users::get_profile).put(users::update_profile), ANY_ROLE),
        )
        .route(
            "/users/change-password",
            guarded(put(users::change_password), ANY_ROLE),
        )
        // Account management
        .route(
            "/users",
            guarded(get(users::list_users).post(users::create_user), ADMINS),
        )
        .route(
            "/users/{id}",
            guarded(get(users::get_user).put(users::update_user), ADMINS)
                .merge(guarded(axum::routing::delete(users::delete_user), NATIONAL_ADMIN)),
        )
        // Courts
        .route(
            "/tribunais",
            guarded(get(tribunals::list_courts), ANY_ROLE)
                .merge(guarded(post(tribunals::create_court), NATIONAL_ADMIN)),
        )
        .route(
            "/tribunais/{tribunal_id}",
            guarded(get(tribunals::get_court), ALL_ROLES),
        )
        .route(
            "/regioes/{regiao_id}/tribunais",
            guarded(get(tribunals::list_region_courts), ADMINS),
        )
        .layer(middleware::from_fn(move |req, next| {
            authenticate(gate.clone(), req, next)
        }));

    public_routes.merge(protected_routes)
}
