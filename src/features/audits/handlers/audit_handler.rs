use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppPath, AppQuery};
use crate::features::audits::dtos::{
    AuditActionDto, AuditResponseDto, CreateAuditDto, UpdateAuditDto,
};
use crate::features::audits::services::AuditService;
use crate::features::auth::guards::{RequireDelete, RequireRead, RequireWrite};
use crate::shared::types::{ApiResponse, ListQuery, Meta};

/// List audits by number
#[utoipa::path(
    get,
    path = "/api/audits",
    params(ListQuery),
    responses(
        (status = 200, description = "Audits", body = ApiResponse<Vec<AuditResponseDto>>),
        (status = 403, description = "Read permission required")
    ),
    tag = "audits",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_audits(
    RequireRead(_user): RequireRead,
    State(service): State<Arc<AuditService>>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<AuditResponseDto>>>> {
    let audits = service.list(query.include_archived).await?;
    let total = audits.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(audits),
        None,
        Some(Meta { total }),
    )))
}

#[utoipa::path(
    get,
    path = "/api/audits/{id}",
    params(
        ("id" = Uuid, Path, description = "Audit ID")
    ),
    responses(
        (status = 200, description = "Audit found", body = ApiResponse<AuditResponseDto>),
        (status = 404, description = "Audit not found"),
        (status = 403, description = "Read permission required")
    ),
    tag = "audits",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_audit(
    RequireRead(_user): RequireRead,
    State(service): State<Arc<AuditService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<AuditResponseDto>>> {
    let audit = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(audit), None, None)))
}

/// Create an audit
///
/// The status is derived from the dates; a completed audit with
/// `create_next_audit` and a `next_audit_date` also schedules its follow-up.
#[utoipa::path(
    post,
    path = "/api/audits",
    request_body = CreateAuditDto,
    responses(
        (status = 201, description = "Audit created", body = ApiResponse<AuditResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Write permission required")
    ),
    tag = "audits",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_audit(
    RequireWrite(user): RequireWrite,
    State(service): State<Arc<AuditService>>,
    AppJson(dto): AppJson<CreateAuditDto>,
) -> Result<(StatusCode, Json<ApiResponse<AuditResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let audit = service.create(dto, &user.sub).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(audit), None, None)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/audits/{id}",
    params(
        ("id" = Uuid, Path, description = "Audit ID")
    ),
    request_body = UpdateAuditDto,
    responses(
        (status = 200, description = "Audit updated", body = ApiResponse<AuditResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Audit not found"),
        (status = 403, description = "Write permission required")
    ),
    tag = "audits",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_audit(
    RequireWrite(user): RequireWrite,
    State(service): State<Arc<AuditService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<UpdateAuditDto>,
) -> Result<Json<ApiResponse<AuditResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let audit = service.update(id, dto, &user.sub).await?;
    Ok(Json(ApiResponse::success(Some(audit), None, None)))
}

/// Highlight, archive or unarchive an audit
#[utoipa::path(
    patch,
    path = "/api/audits/{id}",
    params(
        ("id" = Uuid, Path, description = "Audit ID")
    ),
    request_body = AuditActionDto,
    responses(
        (status = 200, description = "Action applied", body = ApiResponse<AuditResponseDto>),
        (status = 400, description = "Unknown action"),
        (status = 404, description = "Audit not found"),
        (status = 403, description = "Write permission required")
    ),
    tag = "audits",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn patch_audit(
    RequireWrite(user): RequireWrite,
    State(service): State<Arc<AuditService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(action): AppJson<AuditActionDto>,
) -> Result<Json<ApiResponse<AuditResponseDto>>> {
    let audit = service.apply_action(id, action, &user.sub).await?;
    Ok(Json(ApiResponse::success(Some(audit), None, None)))
}

#[utoipa::path(
    delete,
    path = "/api/audits/{id}",
    params(
        ("id" = Uuid, Path, description = "Audit ID")
    ),
    responses(
        (status = 200, description = "Audit deleted"),
        (status = 404, description = "Audit not found"),
        (status = 403, description = "Delete permission required")
    ),
    tag = "audits",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_audit(
    RequireDelete(_user): RequireDelete,
    State(service): State<Arc<AuditService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Audit deleted".to_string()),
        None,
    )))
}
