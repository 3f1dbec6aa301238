use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::audits::{
    dtos as audits_dtos, handlers as audits_handlers, models as audits_models,
};
use crate::features::auth;
use crate::features::documents::{
    dtos as documents_dtos, handlers as documents_handlers, models as documents_models,
};
use crate::features::history::{dtos as history_dtos, handlers as history_handlers};
use crate::features::objectives::{
    dtos as objectives_dtos, handlers as objectives_handlers, models as objectives_models,
};
use crate::features::registry::{
    dtos as registry_dtos, handlers as registry_handlers, models as registry_models,
};
use crate::shared::ordering::{MoveDirection, ReorderDto, ReorderResponseDto, ReorderTargetDto};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handler::get_me,
        // Registers
        registry_handlers::get_register_tree,
        registry_handlers::list_sections,
        registry_handlers::create_section,
        registry_handlers::update_section,
        registry_handlers::reorder_categories,
        registry_handlers::create_category,
        registry_handlers::update_category,
        registry_handlers::patch_category,
        registry_handlers::delete_category,
        registry_handlers::create_entry,
        registry_handlers::get_entry,
        registry_handlers::update_entry,
        registry_handlers::patch_entry,
        registry_handlers::move_entry,
        registry_handlers::reorder_entries,
        registry_handlers::delete_entry,
        // History
        history_handlers::list_versions,
        history_handlers::append_version,
        history_handlers::list_reviews,
        history_handlers::append_review,
        // Audits
        audits_handlers::list_audits,
        audits_handlers::get_audit,
        audits_handlers::create_audit,
        audits_handlers::update_audit,
        audits_handlers::patch_audit,
        audits_handlers::delete_audit,
        // Objectives
        objectives_handlers::list_objectives,
        objectives_handlers::get_objective,
        objectives_handlers::create_objective,
        objectives_handlers::update_objective,
        objectives_handlers::patch_objective,
        objectives_handlers::reorder_objectives,
        objectives_handlers::delete_objective,
        // Documents
        documents_handlers::upload_documents,
        documents_handlers::list_documents,
        documents_handlers::delete_document,
    ),
    components(
        schemas(
            // Shared
            Meta,
            MoveDirection,
            ReorderTargetDto,
            ReorderDto,
            ReorderResponseDto,
            ApiResponse<ReorderResponseDto>,
            // Auth
            auth::dto::MeResponseDto,
            auth::model::AuthenticatedUser,
            auth::model::Permission,
            ApiResponse<auth::dto::MeResponseDto>,
            // Registers
            registry_models::RegisterKind,
            registry_dtos::CreateSectionDto,
            registry_dtos::UpdateSectionDto,
            registry_dtos::SectionResponseDto,
            registry_dtos::SectionOptionDto,
            registry_dtos::CategoryOptionDto,
            registry_dtos::CreateCategoryDto,
            registry_dtos::UpdateCategoryDto,
            registry_dtos::CategoryResponseDto,
            registry_dtos::CategoryActionDto,
            registry_dtos::CreateEntryDto,
            registry_dtos::UpdateEntryDto,
            registry_dtos::EntryResponseDto,
            registry_dtos::EntryActionDto,
            registry_dtos::MoveEntryDto,
            registry_dtos::SectionTreeDto,
            registry_dtos::CategoryTreeDto,
            ApiResponse<Vec<registry_dtos::SectionTreeDto>>,
            ApiResponse<Vec<registry_dtos::SectionOptionDto>>,
            ApiResponse<registry_dtos::SectionResponseDto>,
            ApiResponse<registry_dtos::CategoryResponseDto>,
            ApiResponse<registry_dtos::EntryResponseDto>,
            // History
            history_dtos::CreateVersionDto,
            history_dtos::VersionResponseDto,
            history_dtos::CreateReviewDto,
            history_dtos::ReviewResponseDto,
            ApiResponse<Vec<history_dtos::VersionResponseDto>>,
            ApiResponse<history_dtos::VersionResponseDto>,
            ApiResponse<Vec<history_dtos::ReviewResponseDto>>,
            ApiResponse<history_dtos::ReviewResponseDto>,
            // Audits
            audits_models::AuditStatus,
            audits_dtos::CreateAuditDto,
            audits_dtos::UpdateAuditDto,
            audits_dtos::AuditDocumentDto,
            audits_dtos::AuditResponseDto,
            audits_dtos::AuditActionDto,
            ApiResponse<Vec<audits_dtos::AuditResponseDto>>,
            ApiResponse<audits_dtos::AuditResponseDto>,
            // Objectives
            objectives_models::ObjectiveStatus,
            objectives_dtos::CreateObjectiveDto,
            objectives_dtos::UpdateObjectiveDto,
            objectives_dtos::ObjectiveResponseDto,
            objectives_dtos::ObjectiveActionDto,
            ApiResponse<Vec<objectives_dtos::ObjectiveResponseDto>>,
            ApiResponse<objectives_dtos::ObjectiveResponseDto>,
            // Documents
            documents_models::RelatedEntityType,
            documents_dtos::UploadDocumentsDto,
            documents_dtos::DocumentResponseDto,
            documents_dtos::FailedUploadDto,
            documents_dtos::UploadResultDto,
            ApiResponse<documents_dtos::UploadResultDto>,
            ApiResponse<Vec<documents_dtos::DocumentResponseDto>>,
        )
    ),
    tags(
        (name = "auth", description = "Current user and permissions"),
        (name = "registers", description = "Document registers: sections, categories and entries"),
        (name = "history", description = "Append-only version and review logs per register"),
        (name = "audits", description = "Audit schedule, status and follow-up audits"),
        (name = "objectives", description = "Quality objectives"),
        (name = "documents", description = "Files attached to entries, audits and objectives"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "QMS Registry API",
        version = "0.1.0",
        description = "Document registers, audits and objectives for the quality management system",
    )
)]
pub struct ApiDoc;

/// Adds the Bearer JWT security scheme to the OpenAPI document
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
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

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_register_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/registers/{kind}/entries/{id}"));
        assert!(doc.paths.paths.contains_key("/api/audits"));
        assert!(doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }

    #[test]
    fn test_swagger_info_modifier() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Registry".to_string(),
            version: "9.9.9".to_string(),
            description: "Test".to_string(),
        }
        .modify(&mut doc);
        assert_eq!(doc.info.title, "Registry");
        assert_eq!(doc.info.version, "9.9.9");
    }
}
