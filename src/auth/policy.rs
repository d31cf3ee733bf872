//! Role and scope based authorization.
//!
//! [`check`] is the decision itself. [`authorize`] is the route layer that
//! feeds it the caller's [`Identity`] and the `regiao_id` / `tribunal_id`
//! path parameters of the matched route.

use crate::types::{AppError, Identity, Permission, Role};
use axum::{
    extract::{rejection::RawPathParamsRejection, RawPathParams, Request, State},
    middleware::Next,
    response::Response,
};

/// Path parameter naming the region a resource belongs to.
pub const REGION_PARAM: &str = "regiao_id";
/// Path parameter naming the court a resource belongs to.
pub const COURT_PARAM: &str = "tribunal_id";

pub const ANY_ROLE: &[Permission] = &[];
pub const ADMINS: &[Permission] = &[Permission::NationalAdmin, Permission::RegionalAdmin];
pub const NATIONAL_ADMIN: &[Permission] = &[Permission::NationalAdmin];
pub const ALL_ROLES: &[Permission] = &[
    Permission::NationalAdmin,
    Permission::RegionalAdmin,
    Permission::Operator,
];

/// Region and court a requested resource is scoped to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceScope {
    pub region_id: Option<i64>,
    pub court_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("Acesso não autorizado")]
    Unauthenticated,
    #[error("Você não tem permissão para acessar este recurso")]
    InsufficientRole,
    #[error("Você não tem permissão para acessar recursos de outra região")]
    CrossRegion,
    #[error("Você não tem permissão para acessar recursos de outro tribunal")]
    CrossCourt,
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => AppError::Unauthorized(denial.to_string()),
            Denial::InsufficientRole | Denial::CrossRegion | Denial::CrossCourt => {
                AppError::Forbidden(denial.to_string())
            }
        }
    }
}

/// Decides whether `identity` may reach a resource.
///
/// An empty `required` set admits any authenticated identity. A scope
/// value only restricts the role it applies to: regions bind regional
/// admins, courts bind operators.
pub fn check(
    identity: Option<&Identity>,
    required: &[Permission],
    scope: &ResourceScope,
) -> Result<(), Denial> {
    let identity = identity.ok_or(Denial::Unauthenticated)?;

    if required.is_empty() {
        return Ok(());
    }

    if !required.contains(&identity.permission()) {
        return Err(Denial::InsufficientRole);
    }

    match identity.role {
        Role::NationalAdmin => Ok(()),
        Role::RegionalAdmin { region_id } => match scope.region_id {
            Some(requested) if Some(requested) != region_id => Err(Denial::CrossRegion),
            _ => Ok(()),
        },
        Role::Operator { court_id } => match scope.court_id {
            Some(requested) if Some(requested) != court_id => Err(Denial::CrossCourt),
            _ => Ok(()),
        },
    }
}

/// Role set a route demands, used as the state of [`authorize`].
#[derive(Debug, Clone, Copy)]
pub struct RequiredPermissions(pub &'static [Permission]);

fn scope_from_params(params: &RawPathParams) -> Result<ResourceScope, AppError> {
    let mut scope = ResourceScope::default();
    for (key, value) in params.iter() {
        let target = match key {
            REGION_PARAM => &mut scope.region_id,
            COURT_PARAM => &mut scope.court_id,
            _ => continue,
        };
        let id = value
            .parse::<i64>()
            .map_err(|_| AppError::InvalidInput(format!("Identificador inválido: {}", value)))?;
        *target = Some(id);
    }
    Ok(scope)
}

/// Route layer applying [`check`] to the request.
///
/// Expects the auth gate to have run first; without an identity in the
/// request extensions the request is treated as unauthenticated.
pub async fn authorize(
    State(RequiredPermissions(required)): State<RequiredPermissions>,
    params: Result<RawPathParams, RawPathParamsRejection>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let scope = match params {
        Ok(params) => scope_from_params(&params)?,
        Err(_) => ResourceScope::default(),
    };

    let identity = req.extensions().get::<Identity>();
    if let Err(denial) = check(identity, required, &scope) {
        tracing::warn!(
            account_id = identity.map(|i| i.id),
            reason = ?denial,
            path = %req.uri().path(),
            "access denied"
        );
        return Err(denial.into());
    }

    Ok(next.run(req).await)
}
