use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::audits::{handlers, services::AuditService};

pub fn routes(service: Arc<AuditService>) -> Router {
    Router::new()
        .route(
            "/api/audits",
            get(handlers::list_audits).post(handlers::create_audit),
        )
        .route(
            "/api/audits/{id}",
            get(handlers::get_audit)
                .put(handlers::update_audit)
                .patch(handlers::patch_audit)
                .delete(handlers::delete_audit),
        )
        .with_state(service)
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

    #[tokio::test]
    async fn test_viewer_cannot_schedule_audit() {
        let server = TestServer::new(with_user(test_router(), create_viewer_user())).unwrap();
        let response = server
            .post("/api/audits")
            .json(&json!({ "title": "Internal audit Q3" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_blank_audit_title_is_rejected() {
        let server = TestServer::new(with_user(test_router(), create_editor_user())).unwrap();
        let response = server.post("/api/audits").json(&json!({ "title": "" })).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_audit_status_is_rejected() {
        let server = TestServer::new(with_user(test_router(), create_editor_user())).unwrap();
        let response = server
            .post("/api/audits")
            .json(&json!({ "title": "Supplier audit", "status": "postponed" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_editor_cannot_delete_audit() {
        let server = TestServer::new(with_user(test_router(), create_editor_user())).unwrap();
        let response = server
            .delete(&format!("/api/audits/{}", Uuid::new_v4()))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }
}
