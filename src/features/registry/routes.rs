use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::features::registry::handlers;
use crate::features::registry::services::{EntryService, RegistryService};

/// Routes for every register kind (permission checked per handler)
pub fn routes(registry: Arc<RegistryService>, entries: Arc<EntryService>) -> Router {
    let structure = Router::new()
        .route("/api/registers/{kind}", get(handlers::get_register_tree))
        .route(
            "/api/registers/{kind}/sections",
            get(handlers::list_sections).post(handlers::create_section),
        )
        .route(
            "/api/registers/{kind}/sections/{id}",
            put(handlers::update_section),
        )
        .route(
            "/api/registers/{kind}/sections/{id}/order",
            put(handlers::reorder_categories),
        )
        .route(
            "/api/registers/{kind}/categories",
            post(handlers::create_category),
        )
        .route(
            "/api/registers/{kind}/categories/{id}",
            put(handlers::update_category)
                .patch(handlers::patch_category)
                .delete(handlers::delete_category),
        )
        .with_state(registry);

    let entry_routes = Router::new()
        .route(
            "/api/registers/{kind}/categories/{id}/order",
            put(handlers::reorder_entries),
        )
        .route("/api/registers/{kind}/entries", post(handlers::create_entry))
        .route(
            "/api/registers/{kind}/entries/{id}",
            get(handlers::get_entry)
                .put(handlers::update_entry)
                .patch(handlers::patch_entry)
                .delete(handlers::delete_entry),
        )
        .route(
            "/api/registers/{kind}/entries/{id}/move",
            post(handlers::move_entry),
        )
        .with_state(entries);

    structure.merge(entry_routes)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use uuid::Uuid;

    use crate::shared::test_helpers::{
        create_editor_user, create_viewer_user, test_router, with_user,
    };

    fn server_for(user: Option<crate::features::auth::model::AuthenticatedUser>) -> TestServer {
        let router = match user {
            Some(user) => with_user(test_router(), user),
            None => test_router(),
        };
        TestServer::new(router).unwrap()
    }

    #[tokio::test]
    async fn test_tree_requires_authentication() {
        let server = server_for(None);
        let response = server.get("/api/registers/procedures").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_viewer_cannot_create_entry() {
        let server = server_for(Some(create_viewer_user()));
        let response = server
            .post("/api/registers/procedures/entries")
            .json(&json!({ "category_id": Uuid::new_v4(), "title": "Document control" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_editor_cannot_delete_entry() {
        let server = server_for(Some(create_editor_user()));
        let response = server
            .delete(&format!("/api/registers/manuals/entries/{}", Uuid::new_v4()))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_register_kind_is_bad_request() {
        let server = server_for(Some(create_viewer_user()));
        let response = server.get("/api/registers/recipes").await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_entry_action_is_bad_request() {
        let server = server_for(Some(create_editor_user()));
        let response = server
            .patch(&format!("/api/registers/procedures/entries/{}", Uuid::new_v4()))
            .json(&json!({ "action": "explode" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_entry_order_is_rejected() {
        let server = server_for(Some(create_editor_user()));
        let response = server
            .put(&format!(
                "/api/registers/procedures/categories/{}/order",
                Uuid::new_v4()
            ))
            .json(&json!({ "ordered_ids": [] }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_section_title_is_required() {
        let server = server_for(Some(create_editor_user()));
        let response = server
            .post("/api/registers/procedures/sections")
            .json(&json!({ "title": "" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
