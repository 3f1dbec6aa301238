use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::history::{handlers, services::HistoryService};

/// Append-only logs: no update or delete routes
pub fn routes(service: Arc<HistoryService>) -> Router {
    Router::new()
        .route(
            "/api/registers/{kind}/versions",
            get(handlers::list_versions).post(handlers::append_version),
        )
        .route(
            "/api/registers/{kind}/reviews",
            get(handlers::list_reviews).post(handlers::append_review),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    use crate::shared::test_helpers::{
        create_editor_user, create_viewer_user, test_router, with_user,
    };

    #[tokio::test]
    async fn test_review_due_before_it_happened_is_rejected() {
        let server = TestServer::new(with_user(test_router(), create_editor_user())).unwrap();
        let response = server
            .post("/api/registers/procedures/reviews")
            .json(&json!({
                "reviewed_on": "2026-03-01",
                "details": "Annual review",
                "reviewer": "QA lead",
                "next_review_date": "2026-01-01"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_viewer_cannot_append_version() {
        let server = TestServer::new(with_user(test_router(), create_viewer_user())).unwrap();
        let response = server
            .post("/api/registers/manuals/versions")
            .json(&json!({
                "number": "2.1",
                "version_date": "2026-03-01",
                "details": "Reissued",
                "author": "QA lead"
            }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_history_logs_have_no_delete_route() {
        let server = TestServer::new(with_user(test_router(), create_editor_user())).unwrap();
        let response = server.delete("/api/registers/manuals/versions").await;
        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }
}
