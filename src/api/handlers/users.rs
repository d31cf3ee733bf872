//! Account management.
//!
//! Regional administrators only see and manage accounts of their own region
//! and can never create or promote a national administrator. An account is
//! never allowed to delete itself.

use crate::{
    api::{extract::AppJson, validation},
    auth::{middleware::AuthUser, service::record_activity},
    types::{
        Account, AccountFilter, AccountPage, AccountPatch, ActivityAction, ApiResponse, AppError,
        ChangePasswordRequest, CreateUserRequest, Identity, ListUsersQuery, MessageResponse,
        NewAccount, NewActivityLog, Pagination, Permission, RequestMeta, Result, Role,
        UpdateProfileRequest, UpdateUserRequest, UserData, UserList, UserListResponse,
        UserProfile,
    },
    AppState,
};
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

const MAX_PAGE_SIZE: u32 = 100;

fn not_found() -> AppError {
    AppError::NotFound("Usuário não encontrado".to_string())
}

/// Region a regional administrator is confined to, `None` for everyone else.
///
/// The inner value is the administrator's own region, which may itself be
/// unset.
fn regional_scope(identity: &Identity) -> Option<Option<i64>> {
    match identity.role {
        Role::RegionalAdmin { region_id } => Some(region_id),
        Role::NationalAdmin | Role::Operator { .. } => None,
    }
}

/// Current account profile
#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "Profile", body = ApiResponse<UserData<UserProfile>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<ApiResponse<UserData<UserProfile>>>> {
    let account = state
        .db
        .find_account_by_id(identity.id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(ApiResponse::success(UserData {
        user: account.profile(),
    })))
}

/// Update own name and email
#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserData<UserProfile>>),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already in use")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    meta: RequestMeta,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserData<UserProfile>>>> {
    validation::update_profile(&payload)?;

    let patch = AccountPatch {
        name: Some(payload.nome.trim().to_string()),
        email: Some(payload.email),
        ..Default::default()
    };
    let account = state
        .db
        .update_account(identity.id, &patch)
        .await?
        .ok_or_else(not_found)?;

    record_activity(
        state.db.as_ref(),
        NewActivityLog::on_account(
            identity.id,
            ActivityAction::ProfileUpdate,
            identity.id,
            "Atualização de perfil",
            &meta,
        ),
    )
    .await;

    Ok(Json(ApiResponse::success(UserData {
        user: account.profile(),
    })))
}

/// Change own password
#[utoipa::path(
    put,
    path = "/api/users/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Current password is wrong")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    meta: RequestMeta,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    validation::change_password(&payload)?;

    state
        .auth
        .change_password(&identity, &payload.senha_atual, &payload.nova_senha, &meta)
        .await?;

    Ok(Json(MessageResponse::success("Senha alterada com sucesso")))
}

/// List accounts
#[utoipa::path(
    get,
    path = "/api/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Page of accounts", body = UserListResponse),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    query: std::result::Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Json<UserListResponse>> {
    let Query(query) = query?;

    let mut filter = AccountFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        permission: query.permissao,
        status: query.status,
        court_id: query.tribunal,
        region_id: query.regiao,
        page: query.page.unwrap_or(1).max(1),
        limit: query.limit.unwrap_or(10).clamp(1, MAX_PAGE_SIZE),
    };

    let page = match regional_scope(&identity) {
        Some(Some(own_region)) => {
            filter.region_id = Some(own_region);
            state.db.list_accounts(&filter).await?
        }
        // a regional admin without a region has nobody to see
        Some(None) => AccountPage {
            accounts: Vec::new(),
            total: 0,
        },
        None => state.db.list_accounts(&filter).await?,
    };

    let users: Vec<UserProfile> = page.accounts.iter().map(Account::profile).collect();
    let limit = u64::from(filter.limit);

    Ok(Json(UserListResponse {
        status: "success".to_string(),
        results: users.len(),
        pagination: Pagination {
            total: page.total,
            page: filter.page,
            limit: filter.limit,
            total_pages: page.total.div_ceil(limit),
        },
        data: UserList { users },
    }))
}

/// Get one account
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account", body = ApiResponse<UserData<UserProfile>>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<UserData<UserProfile>>>> {
    let Path(id) = id?;
    let account = state.db.find_account_by_id(id).await?;

    if let Some(own_region) = regional_scope(&identity) {
        let same_region = account
            .as_ref()
            .map(|a| own_region.is_some() && a.region_id == own_region)
            .unwrap_or(false);
        if !same_region {
            return Err(AppError::Forbidden(
                "Você não tem permissão para acessar este usuário".to_string(),
            ));
        }
    }

    let account = account.ok_or_else(not_found)?;

    Ok(Json(ApiResponse::success(UserData {
        user: account.profile(),
    })))
}

/// Create an account
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<UserData<UserProfile>>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Email already in use")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    meta: RequestMeta,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserData<UserProfile>>>)> {
    validation::create_user(&payload)?;

    if state
        .db
        .find_account_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email já está em uso".to_string()));
    }

    if let Some(own_region) = regional_scope(&identity) {
        if own_region.is_none() || payload.regiao_id != own_region {
            return Err(AppError::Forbidden(
                "Você só pode criar usuários na sua região".to_string(),
            ));
        }
        if payload.permissao == Permission::NationalAdmin {
            return Err(AppError::Forbidden(
                "Você não tem permissão para criar administradores nacionais".to_string(),
            ));
        }
    }

    let password_hash = state.auth.passwords().hash(&payload.senha)?;
    let account = state
        .db
        .create_account(&NewAccount {
            email: payload.email,
            password_hash,
            name: payload.nome.trim().to_string(),
            job_title: payload.cargo,
            permission: payload.permissao,
            status: payload.status.unwrap_or_default(),
            court_id: payload.tribunal_id,
            region_id: payload.regiao_id,
        })
        .await?;

    record_activity(
        state.db.as_ref(),
        NewActivityLog::on_account(
            identity.id,
            ActivityAction::Create,
            account.id,
            format!("Criação do usuário {}", account.name),
            &meta,
        ),
    )
    .await;

    tracing::info!(actor_id = identity.id, account_id = account.id, "account created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserData {
            user: account.profile(),
        })),
    ))
}

/// Update an account
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "Account id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = ApiResponse<UserData<UserProfile>>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Email already in use")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    meta: RequestMeta,
    id: std::result::Result<Path<i64>, PathRejection>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserData<UserProfile>>>> {
    let Path(id) = id?;
    validation::update_user(&payload)?;

    let existing = state
        .db
        .find_account_by_id(id)
        .await?
        .ok_or_else(not_found)?;

    if let Some(own_region) = regional_scope(&identity) {
        if own_region.is_none() || existing.region_id != own_region {
            return Err(AppError::Forbidden(
                "Você só pode atualizar usuários na sua região".to_string(),
            ));
        }
        if let Some(requested) = payload.regiao_id {
            if requested != own_region {
                return Err(AppError::Forbidden(
                    "Você não pode alterar a região do usuário".to_string(),
                ));
            }
        }
        if payload.permissao == Some(Permission::NationalAdmin) {
            return Err(AppError::Forbidden(
                "Você não tem permissão para criar administradores nacionais".to_string(),
            ));
        }
    }

    if let Some(email) = payload.email.as_deref() {
        if email != existing.email
            && state.db.find_account_by_email(email).await?.is_some()
        {
            return Err(AppError::Conflict("Email já está em uso".to_string()));
        }
    }

    let patch = AccountPatch {
        email: payload.email,
        name: payload.nome.map(|n| n.trim().to_string()),
        job_title: payload.cargo,
        permission: payload.permissao,
        status: payload.status,
        court_id: payload.tribunal_id,
        region_id: payload.regiao_id,
        ..Default::default()
    };
    let account = state
        .db
        .update_account(id, &patch)
        .await?
        .ok_or_else(not_found)?;

    record_activity(
        state.db.as_ref(),
        NewActivityLog::on_account(
            identity.id,
            ActivityAction::Update,
            account.id,
            format!("Atualização do usuário {}", account.name),
            &meta,
        ),
    )
    .await;

    Ok(Json(ApiResponse::success(UserData {
        user: account.profile(),
    })))
}

/// Delete an account
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    meta: RequestMeta,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = id?;

    let account = state
        .db
        .find_account_by_id(id)
        .await?
        .ok_or_else(not_found)?;

    if account.id == identity.id {
        return Err(AppError::Forbidden(
            "Você não pode excluir seu próprio usuário".to_string(),
        ));
    }

    if !state.db.delete_account(id).await? {
        return Err(not_found());
    }

    record_activity(
        state.db.as_ref(),
        NewActivityLog::on_account(
            identity.id,
            ActivityAction::Delete,
            id,
            format!("Exclusão do usuário {}", account.name),
            &meta,
        ),
    )
    .await;

    tracing::info!(actor_id = identity.id, account_id = id, "account deleted");

    Ok(StatusCode::NO_CONTENT)
}
