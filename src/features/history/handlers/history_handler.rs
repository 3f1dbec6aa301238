use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppPath, AppQuery};
use crate::features::auth::guards::{RequireRead, RequireWrite};
use crate::features::history::dtos::{
    CreateReviewDto, CreateVersionDto, HistoryFilter, ReviewResponseDto, VersionResponseDto,
};
use crate::features::history::services::HistoryService;
use crate::features::registry::models::RegisterKind;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Version log of a register, newest first
#[utoipa::path(
    get,
    path = "/api/registers/{kind}/versions",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind"),
        HistoryFilter,
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Version records", body = ApiResponse<Vec<VersionResponseDto>>),
        (status = 403, description = "Read permission required")
    ),
    tag = "history",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_versions(
    RequireRead(_user): RequireRead,
    State(service): State<Arc<HistoryService>>,
    AppPath(kind): AppPath<RegisterKind>,
    AppQuery(filter): AppQuery<HistoryFilter>,
    AppQuery(pagination): AppQuery<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<VersionResponseDto>>>> {
    let (records, total) = service
        .list_versions(kind, filter.section_id, &pagination)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(records),
        None,
        Some(Meta { total }),
    )))
}

/// Append to the version log
#[utoipa::path(
    post,
    path = "/api/registers/{kind}/versions",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind")
    ),
    request_body = CreateVersionDto,
    responses(
        (status = 201, description = "Version recorded", body = ApiResponse<VersionResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Section not found"),
        (status = 403, description = "Write permission required")
    ),
    tag = "history",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn append_version(
    RequireWrite(user): RequireWrite,
    State(service): State<Arc<HistoryService>>,
    AppPath(kind): AppPath<RegisterKind>,
    AppJson(dto): AppJson<CreateVersionDto>,
) -> Result<(StatusCode, Json<ApiResponse<VersionResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let record = service.append_version(kind, dto, &user.sub).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(record), None, None)),
    ))
}

/// Review log of a register, newest first
#[utoipa::path(
    get,
    path = "/api/registers/{kind}/reviews",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind"),
        HistoryFilter,
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Review records", body = ApiResponse<Vec<ReviewResponseDto>>),
        (status = 403, description = "Read permission required")
    ),
    tag = "history",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_reviews(
    RequireRead(_user): RequireRead,
    State(service): State<Arc<HistoryService>>,
    AppPath(kind): AppPath<RegisterKind>,
    AppQuery(filter): AppQuery<HistoryFilter>,
    AppQuery(pagination): AppQuery<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ReviewResponseDto>>>> {
    let (records, total) = service
        .list_reviews(kind, filter.section_id, &pagination)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(records),
        None,
        Some(Meta { total }),
    )))
}

/// Append to the review log
#[utoipa::path(
    post,
    path = "/api/registers/{kind}/reviews",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind")
    ),
    request_body = CreateReviewDto,
    responses(
        (status = 201, description = "Review recorded", body = ApiResponse<ReviewResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Section not found"),
        (status = 403, description = "Write permission required")
    ),
    tag = "history",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn append_review(
    RequireWrite(user): RequireWrite,
    State(service): State<Arc<HistoryService>>,
    AppPath(kind): AppPath<RegisterKind>,
    AppJson(dto): AppJson<CreateReviewDto>,
) -> Result<(StatusCode, Json<ApiResponse<ReviewResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let record = service.append_review(kind, dto, &user.sub).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(record), None, None)),
    ))
}
