use crate::{
    api::{extract::AppJson, validation},
    auth::middleware::AuthUser,
    types::{
        ApiResponse, AppError, CourtData, CourtList, CreateCourtRequest, Result, Role,
    },
    AppState,
};
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};

/// List courts; regional administrators only see their own region
#[utoipa::path(
    get,
    path = "/api/tribunais",
    responses(
        (status = 200, description = "Courts", body = ApiResponse<CourtList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = [])),
    tag = "tribunais"
)]
pub async fn list_courts(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<ApiResponse<CourtList>>> {
    let tribunais = match identity.role {
        Role::RegionalAdmin {
            region_id: Some(region_id),
        } => state.db.list_courts(Some(region_id)).await?,
        Role::RegionalAdmin { region_id: None } => Vec::new(),
        Role::NationalAdmin | Role::Operator { .. } => state.db.list_courts(None).await?,
    };

    Ok(Json(ApiResponse::success(CourtList { tribunais })))
}

/// Register a court
#[utoipa::path(
    post,
    path = "/api/tribunais",
    request_body = CreateCourtRequest,
    responses(
        (status = 201, description = "Court created", body = ApiResponse<CourtData>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Acronym already in use")
    ),
    security(("bearer" = [])),
    tag = "tribunais"
)]
pub async fn create_court(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCourtRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CourtData>>)> {
    validation::create_court(&payload)?;

    let tribunal = state
        .db
        .create_court(
            payload.nome.trim(),
            &payload.sigla.trim().to_uppercase(),
            payload.regiao_id,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CourtData { tribunal })),
    ))
}

/// Get one court. Operators may only read their own.
#[utoipa::path(
    get,
    path = "/api/tribunais/{tribunal_id}",
    params(("tribunal_id" = i64, Path, description = "Court id")),
    responses(
        (status = 200, description = "Court", body = ApiResponse<CourtData>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("bearer" = [])),
    tag = "tribunais"
)]
pub async fn get_court(
    State(state): State<AppState>,
    tribunal_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<CourtData>>> {
    let Path(tribunal_id) = tribunal_id?;

    let tribunal = state
        .db
        .find_court_by_id(tribunal_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tribunal não encontrado".to_string()))?;

    Ok(Json(ApiResponse::success(CourtData { tribunal })))
}

/// Courts of one region. Regional administrators may only read their own.
#[utoipa::path(
    get,
    path = "/api/regioes/{regiao_id}/tribunais",
    params(("regiao_id" = i64, Path, description = "Region id")),
    responses(
        (status = 200, description = "Courts of the region", body = ApiResponse<CourtList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer" = [])),
    tag = "tribunais"
)]
pub async fn list_region_courts(
    State(state): State<AppState>,
    regiao_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<CourtList>>> {
    let Path(regiao_id) = regiao_id?;

    let tribunais = state.db.list_courts(Some(regiao_id)).await?;

    Ok(Json(ApiResponse::success(CourtList { tribunais })))
}
