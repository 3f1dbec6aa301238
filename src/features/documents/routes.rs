use axum::{
    routing::{delete, get},
    Router,
};
use std::sync::Arc;

use crate::features::documents::{handlers, services::DocumentService};

/// Document routes (permission checked per handler)
pub fn routes(service: Arc<DocumentService>) -> Router {
    Router::new()
        .route(
            "/api/documents/{entity_type}/{entity_id}",
            get(handlers::list_documents).post(handlers::upload_documents),
        )
        .route("/api/documents/{id}", delete(handlers::delete_document))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use uuid::Uuid;

    use crate::shared::test_helpers::{
        create_editor_user, create_viewer_user, test_router, with_user,
    };

    #[tokio::test]
    async fn test_unknown_owner_type_is_bad_request() {
        let server = TestServer::new(with_user(test_router(), create_viewer_user())).unwrap();
        let response = server
            .get(&format!("/api/documents/invoice/{}", Uuid::new_v4()))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_editor_cannot_delete_document() {
        let server = TestServer::new(with_user(test_router(), create_editor_user())).unwrap();
        let response = server
            .delete(&format!("/api/documents/{}", Uuid::new_v4()))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }
}
