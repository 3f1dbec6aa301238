use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use crate::features::objectives::{handlers, services::ObjectiveService};

pub fn routes(service: Arc<ObjectiveService>) -> Router {
    Router::new()
        .route(
            "/api/objectives",
            get(handlers::list_objectives).post(handlers::create_objective),
        )
        .route("/api/objectives/order", put(handlers::reorder_objectives))
        .route(
            "/api/objectives/{id}",
            get(handlers::get_objective)
                .put(handlers::update_objective)
                .patch(handlers::patch_objective)
                .delete(handlers::delete_objective),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use uuid::Uuid;

    use crate::shared::test_helpers::{create_editor_user, test_router, with_user};

    #[tokio::test]
    async fn test_empty_objective_order_is_rejected() {
        let server = TestServer::new(with_user(test_router(), create_editor_user())).unwrap();
        let response = server
            .put("/api/objectives/order")
            .json(&json!({ "ordered_ids": [] }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_objective_action_is_rejected() {
        let server = TestServer::new(with_user(test_router(), create_editor_user())).unwrap();
        let response = server
            .patch(&format!("/api/objectives/{}", Uuid::new_v4()))
            .json(&json!({ "action": "approve" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
