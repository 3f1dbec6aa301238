use crate::features::auth::handler;
use axum::{routing::get, Router};

/// Protected auth routes (require JWT authentication)
pub fn routes() -> Router {
    Router::new().route("/api/auth/me", get(handler::get_me))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;

    use super::routes;
    use crate::shared::test_helpers::{create_admin_user, with_user};

    #[tokio::test]
    async fn test_me_reports_permissions() {
        let server = TestServer::new(with_user(routes(), create_admin_user())).unwrap();
        let response = server.get("/api/auth/me").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["data"]["roles"][0], "admin");
        assert_eq!(
            body["data"]["permissions"],
            serde_json::json!(["read", "write", "delete"])
        );
    }

    #[tokio::test]
    async fn test_me_without_user_is_unauthorized() {
        let server = TestServer::new(routes()).unwrap();
        server
            .get("/api/auth/me")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
