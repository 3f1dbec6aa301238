use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppPath, AppQuery};
use crate::features::auth::guards::{RequireDelete, RequireRead, RequireWrite};
use crate::features::registry::dtos::{
    CategoryActionDto, CategoryResponseDto, CreateCategoryDto, CreateSectionDto,
    SectionOptionDto, SectionResponseDto, SectionTreeDto, UpdateCategoryDto, UpdateSectionDto,
};
use crate::features::registry::models::RegisterKind;
use crate::features::registry::services::RegistryService;
use crate::shared::ordering::{ReorderDto, ReorderResponseDto};
use crate::shared::types::{ApiResponse, ListQuery, Meta};

/// Full register tree: sections, categories and entries in display order
#[utoipa::path(
    get,
    path = "/api/registers/{kind}",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Register tree", body = ApiResponse<Vec<SectionTreeDto>>),
        (status = 400, description = "Unknown register kind"),
        (status = 403, description = "Read permission required")
    ),
    tag = "registers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_register_tree(
    RequireRead(_user): RequireRead,
    State(service): State<Arc<RegistryService>>,
    AppPath(kind): AppPath<RegisterKind>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<SectionTreeDto>>>> {
    let tree = service.list_tree(kind, query.include_archived).await?;
    let total = tree.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(tree),
        None,
        Some(Meta { total }),
    )))
}

// =============================================================================
// SECTIONS
// =============================================================================

/// Sections with their active categories (move destinations)
#[utoipa::path(
    get,
    path = "/api/registers/{kind}/sections",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind")
    ),
    responses(
        (status = 200, description = "Sections", body = ApiResponse<Vec<SectionOptionDto>>),
        (status = 403, description = "Read permission required")
    ),
    tag = "registers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_sections(
    RequireRead(_user): RequireRead,
    State(service): State<Arc<RegistryService>>,
    AppPath(kind): AppPath<RegisterKind>,
) -> Result<Json<ApiResponse<Vec<SectionOptionDto>>>> {
    let sections = service.list_sections(kind).await?;
    Ok(Json(ApiResponse::success(Some(sections), None, None)))
}

#[utoipa::path(
    post,
    path = "/api/registers/{kind}/sections",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind")
    ),
    request_body = CreateSectionDto,
    responses(
        (status = 201, description = "Section created", body = ApiResponse<SectionResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Write permission required")
    ),
    tag = "registers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_section(
    RequireWrite(_user): RequireWrite,
    State(service): State<Arc<RegistryService>>,
    AppPath(kind): AppPath<RegisterKind>,
    AppJson(dto): AppJson<CreateSectionDto>,
) -> Result<(StatusCode, Json<ApiResponse<SectionResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let section = service.create_section(kind, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(section), None, None)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/registers/{kind}/sections/{id}",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind"),
        ("id" = Uuid, Path, description = "Section ID")
    ),
    request_body = UpdateSectionDto,
    responses(
        (status = 200, description = "Section updated", body = ApiResponse<SectionResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Section not found"),
        (status = 403, description = "Write permission required")
    ),
    tag = "registers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_section(
    RequireWrite(_user): RequireWrite,
    State(service): State<Arc<RegistryService>>,
    AppPath((kind, id)): AppPath<(RegisterKind, Uuid)>,
    AppJson(dto): AppJson<UpdateSectionDto>,
) -> Result<Json<ApiResponse<SectionResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let section = service.update_section(kind, id, dto).await?;
    Ok(Json(ApiResponse::success(Some(section), None, None)))
}

/// Set the order of a section's categories
#[utoipa::path(
    put,
    path = "/api/registers/{kind}/sections/{id}/order",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind"),
        ("id" = Uuid, Path, description = "Section ID")
    ),
    request_body = ReorderDto,
    responses(
        (status = 200, description = "Categories reordered", body = ApiResponse<ReorderResponseDto>),
        (status = 400, description = "Unknown or duplicate ids"),
        (status = 404, description = "Section not found"),
        (status = 403, description = "Write permission required")
    ),
    tag = "registers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reorder_categories(
    RequireWrite(_user): RequireWrite,
    State(service): State<Arc<RegistryService>>,
    AppPath((kind, id)): AppPath<(RegisterKind, Uuid)>,
    AppJson(dto): AppJson<ReorderDto>,
) -> Result<Json<ApiResponse<ReorderResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let ordered_ids = service.reorder_categories(kind, id, &dto.ordered_ids).await?;
    Ok(Json(ApiResponse::success(
        Some(ReorderResponseDto { ordered_ids }),
        None,
        None,
    )))
}

// =============================================================================
// CATEGORIES
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/registers/{kind}/categories",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind")
    ),
    request_body = CreateCategoryDto,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Section not found"),
        (status = 403, description = "Write permission required")
    ),
    tag = "registers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_category(
    RequireWrite(user): RequireWrite,
    State(service): State<Arc<RegistryService>>,
    AppPath(kind): AppPath<RegisterKind>,
    AppJson(dto): AppJson<CreateCategoryDto>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = service.create_category(kind, dto, &user.sub).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(category), None, None)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/registers/{kind}/categories/{id}",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind"),
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = UpdateCategoryDto,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Category not found"),
        (status = 403, description = "Write permission required")
    ),
    tag = "registers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_category(
    RequireWrite(user): RequireWrite,
    State(service): State<Arc<RegistryService>>,
    AppPath((kind, id)): AppPath<(RegisterKind, Uuid)>,
    AppJson(dto): AppJson<UpdateCategoryDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = service.update_category(kind, id, dto, &user.sub).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Archive, unarchive, highlight or move a category
#[utoipa::path(
    patch,
    path = "/api/registers/{kind}/categories/{id}",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind"),
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = CategoryActionDto,
    responses(
        (status = 200, description = "Action applied", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Unknown action or bad reorder target"),
        (status = 404, description = "Category not found"),
        (status = 403, description = "Write permission required")
    ),
    tag = "registers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn patch_category(
    RequireWrite(user): RequireWrite,
    State(service): State<Arc<RegistryService>>,
    AppPath((kind, id)): AppPath<(RegisterKind, Uuid)>,
    AppJson(action): AppJson<CategoryActionDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service
        .apply_category_action(kind, id, action, &user.sub)
        .await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Delete a category together with its entries and their documents
#[utoipa::path(
    delete,
    path = "/api/registers/{kind}/categories/{id}",
    params(
        ("kind" = RegisterKind, Path, description = "Register kind"),
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 404, description = "Category not found"),
        (status = 403, description = "Delete permission required")
    ),
    tag = "registers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_category(
    RequireDelete(_user): RequireDelete,
    State(service): State<Arc<RegistryService>>,
    AppPath((kind, id)): AppPath<(RegisterKind, Uuid)>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete_category(kind, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Category deleted".to_string()),
        None,
    )))
}
