use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppPath};
use crate::features::auth::guards::{RequireDelete, RequireRead, RequireWrite};
use crate::features::registry::dtos::{
    CreateEntryDto, EntryActionDto, EntryResponseDto, MoveEntryDto, UpdateEntryDto,
};
use crate::features::registry::models::RegisterKind;
use crate::features::registry::services::EntryService;
use crate::shared::ordering::{ReorderDto, ReorderResponseDto};
use crate::shared::types::ApiResponse;

#[utoipa::path(
    post,
    path = "/api/registers/{kind}/entries",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind")
    ),
    request_body = CreateEntryDto,
    responses(
        (status = 201, description = "Entry created", body = ApiResponse<EntryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Category not found"),
        (status = 403, description = "Write permission required")
    ),
    tag = "registers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_entry(
    RequireWrite(user): RequireWrite,
    State(service): State<Arc<EntryService>>,
    AppPath(kind): AppPath<RegisterKind>,
    AppJson(dto): AppJson<CreateEntryDto>,
) -> Result<(StatusCode, Json<ApiResponse<EntryResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let entry = service.create(kind, dto, &user.sub).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(entry), None, None)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/registers/{kind}/entries/{id}",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind"),
        ("id" = Uuid, Path, description = "Entry ID")
    ),
    responses(
        (status = 200, description = "Entry found", body = ApiResponse<EntryResponseDto>),
        (status = 404, description = "Entry not found"),
        (status = 403, description = "Read permission required")
    ),
    tag = "registers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_entry(
    RequireRead(_user): RequireRead,
    State(service): State<Arc<EntryService>>,
    AppPath((kind, id)): AppPath<(RegisterKind, Uuid)>,
) -> Result<Json<ApiResponse<EntryResponseDto>>> {
    let entry = service.get(kind, id).await?;
    Ok(Json(ApiResponse::success(Some(entry), None, None)))
}

#[utoipa::path(
    put,
    path = "/api/registers/{kind}/entries/{id}",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind"),
        ("id" = Uuid, Path, description = "Entry ID")
    ),
    request_body = UpdateEntryDto,
    responses(
        (status = 200, description = "Entry updated", body = ApiResponse<EntryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Entry not found"),
        (status = 403, description = "Write permission required")
    ),
    tag = "registers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_entry(
    RequireWrite(user): RequireWrite,
    State(service): State<Arc<EntryService>>,
    AppPath((kind, id)): AppPath<(RegisterKind, Uuid)>,
    AppJson(dto): AppJson<UpdateEntryDto>,
) -> Result<Json<ApiResponse<EntryResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let entry = service.update(kind, id, dto, &user.sub).await?;
    Ok(Json(ApiResponse::success(Some(entry), None, None)))
}

/// Reorder, highlight, approve, unapprove, archive or unarchive an entry
#[utoipa::path(
    patch,
    path = "/api/registers/{kind}/entries/{id}",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind"),
        ("id" = Uuid, Path, description = "Entry ID")
    ),
    request_body = EntryActionDto,
    responses(
        (status = 200, description = "Action applied", body = ApiResponse<EntryResponseDto>),
        (status = 400, description = "Unknown action or bad reorder target"),
        (status = 404, description = "Entry not found"),
        (status = 403, description = "Write permission required")
    ),
    tag = "registers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn patch_entry(
    RequireWrite(user): RequireWrite,
    State(service): State<Arc<EntryService>>,
    AppPath((kind, id)): AppPath<(RegisterKind, Uuid)>,
    AppJson(action): AppJson<EntryActionDto>,
) -> Result<Json<ApiResponse<EntryResponseDto>>> {
    let entry = service.apply_action(kind, id, action, &user.sub).await?;
    Ok(Json(ApiResponse::success(Some(entry), None, None)))
}

/// Move an entry to another section and category
#[utoipa::path(
    post,
    path = "/api/registers/{kind}/entries/{id}/move",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind"),
        ("id" = Uuid, Path, description = "Entry ID")
    ),
    request_body = MoveEntryDto,
    responses(
        (status = 200, description = "Entry moved", body = ApiResponse<EntryResponseDto>),
        (status = 400, description = "Category is not in that section"),
        (status = 404, description = "Entry or category not found"),
        (status = 403, description = "Write permission required")
    ),
    tag = "registers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn move_entry(
    RequireWrite(user): RequireWrite,
    State(service): State<Arc<EntryService>>,
    AppPath((kind, id)): AppPath<(RegisterKind, Uuid)>,
    AppJson(dto): AppJson<MoveEntryDto>,
) -> Result<Json<ApiResponse<EntryResponseDto>>> {
    let entry = service.move_entry(kind, id, dto, &user.sub).await?;
    Ok(Json(ApiResponse::success(Some(entry), None, None)))
}

/// Set the order of a category's entries
#[utoipa::path(
    put,
    path = "/api/registers/{kind}/categories/{id}/order",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind"),
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = ReorderDto,
    responses(
        (status = 200, description = "Entries reordered", body = ApiResponse<ReorderResponseDto>),
        (status = 400, description = "Unknown or duplicate ids"),
        (status = 404, description = "Category not found"),
        (status = 403, description = "Write permission required")
    ),
    tag = "registers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reorder_entries(
    RequireWrite(_user): RequireWrite,
    State(service): State<Arc<EntryService>>,
    AppPath((kind, id)): AppPath<(RegisterKind, Uuid)>,
    AppJson(dto): AppJson<ReorderDto>,
) -> Result<Json<ApiResponse<ReorderResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let ordered_ids = service.reorder(kind, id, &dto.ordered_ids).await?;
    Ok(Json(ApiResponse::success(
        Some(ReorderResponseDto { ordered_ids }),
        None,
        None,
    )))
}

/// Delete an entry and its documents
#[utoipa::path(
    delete,
    path = "/api/registers/{kind}/entries/{id}",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind"),
        ("id" = Uuid, Path, description = "Entry ID")
    ),
    responses(
        (status = 200, description = "Entry deleted"),
        (status = 404, description = "Entry not found"),
        (status = 403, description = "Delete permission required")
    ),
    tag = "registers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_entry(
    RequireDelete(_user): RequireDelete,
    State(service): State<Arc<EntryService>>,
    AppPath((kind, id)): AppPath<(RegisterKind, Uuid)>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(kind, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Entry deleted".to_string()),
        None,
    )))
}
