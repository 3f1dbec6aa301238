use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppPath, AppQuery};
use crate::features::auth::guards::{RequireDelete, RequireRead, RequireWrite};
use crate::features::objectives::dtos::{
    CreateObjectiveDto, ObjectiveActionDto, ObjectiveResponseDto, UpdateObjectiveDto,
};
use crate::features::objectives::services::ObjectiveService;
use crate::shared::ordering::{ReorderDto, ReorderResponseDto};
use crate::shared::types::{ApiResponse, ListQuery, Meta};

/// List objectives in display order
#[utoipa::path(
    get,
    path = "/api/objectives",
    params(ListQuery),
    responses(
        (status = 200, description = "Objectives", body = ApiResponse<Vec<ObjectiveResponseDto>>),
        (status = 403, description = "Read permission required")
    ),
    tag = "objectives",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_objectives(
    RequireRead(_user): RequireRead,
    State(service): State<Arc<ObjectiveService>>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<ObjectiveResponseDto>>>> {
    let objectives = service.list(query.include_archived).await?;
    let total = objectives.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(objectives),
        None,
        Some(Meta { total }),
    )))
}

#[utoipa::path(
    get,
    path = "/api/objectives/{id}",
    params(
        ("id" = Uuid, Path, description = "Objective ID")
    ),
    responses(
        (status = 200, description = "Objective found", body = ApiResponse<ObjectiveResponseDto>),
        (status = 404, description = "Objective not found"),
        (status = 403, description = "Read permission required")
    ),
    tag = "objectives",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_objective(
    RequireRead(_user): RequireRead,
    State(service): State<Arc<ObjectiveService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<ObjectiveResponseDto>>> {
    let objective = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(objective), None, None)))
}

#[utoipa::path(
    post,
    path = "/api/objectives",
    request_body = CreateObjectiveDto,
    responses(
        (status = 201, description = "Objective created", body = ApiResponse<ObjectiveResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Write permission required")
    ),
    tag = "objectives",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_objective(
    RequireWrite(user): RequireWrite,
    State(service): State<Arc<ObjectiveService>>,
    AppJson(dto): AppJson<CreateObjectiveDto>,
) -> Result<(StatusCode, Json<ApiResponse<ObjectiveResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let objective = service.create(dto, &user.sub).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(objective), None, None)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/objectives/{id}",
    params(
        ("id" = Uuid, Path, description = "Objective ID")
    ),
    request_body = UpdateObjectiveDto,
    responses(
        (status = 200, description = "Objective updated", body = ApiResponse<ObjectiveResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Objective not found"),
        (status = 403, description = "Write permission required")
    ),
    tag = "objectives",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_objective(
    RequireWrite(user): RequireWrite,
    State(service): State<Arc<ObjectiveService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<UpdateObjectiveDto>,
) -> Result<Json<ApiResponse<ObjectiveResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let objective = service.update(id, dto, &user.sub).await?;
    Ok(Json(ApiResponse::success(Some(objective), None, None)))
}

/// Reorder, highlight, archive or unarchive an objective
#[utoipa::path(
    patch,
    path = "/api/objectives/{id}",
    params(
        ("id" = Uuid, Path, description = "Objective ID")
    ),
    request_body = ObjectiveActionDto,
    responses(
        (status = 200, description = "Action applied", body = ApiResponse<ObjectiveResponseDto>),
        (status = 400, description = "Unknown action or bad reorder target"),
        (status = 404, description = "Objective not found"),
        (status = 403, description = "Write permission required")
    ),
    tag = "objectives",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn patch_objective(
    RequireWrite(user): RequireWrite,
    State(service): State<Arc<ObjectiveService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(action): AppJson<ObjectiveActionDto>,
) -> Result<Json<ApiResponse<ObjectiveResponseDto>>> {
    let objective = service.apply_action(id, action, &user.sub).await?;
    Ok(Json(ApiResponse::success(Some(objective), None, None)))
}

/// Set the order of all objectives
#[utoipa::path(
    put,
    path = "/api/objectives/order",
    request_body = ReorderDto,
    responses(
        (status = 200, description = "Objectives reordered", body = ApiResponse<ReorderResponseDto>),
        (status = 400, description = "Unknown or duplicate ids"),
        (status = 403, description = "Write permission required")
    ),
    tag = "objectives",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reorder_objectives(
    RequireWrite(_user): RequireWrite,
    State(service): State<Arc<ObjectiveService>>,
    AppJson(dto): AppJson<ReorderDto>,
) -> Result<Json<ApiResponse<ReorderResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let ordered_ids = service.reorder(&dto.ordered_ids).await?;
    Ok(Json(ApiResponse::success(
        Some(ReorderResponseDto { ordered_ids }),
        None,
        None,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/objectives/{id}",
    params(
        ("id" = Uuid, Path, description = "Objective ID")
    ),
    responses(
        (status = 200, description = "Objective deleted"),
        (status = 404, description = "Objective not found"),
        (status = 403, description = "Delete permission required")
    ),
    tag = "objectives",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_objective(
    RequireDelete(_user): RequireDelete,
    State(service): State<Arc<ObjectiveService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Objective deleted".to_string()),
        None,
    )))
}
