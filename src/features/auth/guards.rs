//! Permission guards for handlers.
//!
//! Each guard extracts the authenticated user and checks one permission:
//! - `RequireRead`: admin, editor or viewer
//! - `RequireWrite`: admin or editor (create, update, archive, highlight, approve, reorder, move)
//! - `RequireDelete`: admin only

use crate::core::error::AppError;
use crate::features::auth::model::{AuthenticatedUser, Permission};
use axum::{extract::FromRequestParts, http::request::Parts};

fn authorize(parts: &Parts, permission: Permission) -> Result<AuthenticatedUser, AppError> {
    let user = parts
        .extensions
        .get::<AuthenticatedUser>()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

    if !user.has_permission(permission) {
        tracing::debug!(sub = %user.sub, %permission, "Permission denied");
        return Err(AppError::Forbidden(format!(
            "The '{}' permission is required",
            permission
        )));
    }

    Ok(user.clone())
}

/// Guard for listing and reading.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireRead(user): RequireRead) { ... }
/// ```
pub struct RequireRead(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireRead
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authorize(parts, Permission::Read).map(RequireRead)
    }
}

/// Guard for every mutating action except deletes.
pub struct RequireWrite(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireWrite
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authorize(parts, Permission::Write).map(RequireWrite)
    }
}

/// Guard for hard deletes.
pub struct RequireDelete(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireDelete
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authorize(parts, Permission::Delete).map(RequireDelete)
    }
}
