use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::model::{AuthenticatedUser, Permission};

/// DTO for /api/auth/me response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponseDto {
    pub sub: String,
    pub name: Option<String>,
    pub roles: Vec<String>,
    /// What the caller may do; clients use it to hide unavailable actions
    pub permissions: Vec<Permission>,
}

impl From<AuthenticatedUser> for MeResponseDto {
    fn from(user: AuthenticatedUser) -> Self {
        let permissions = user.permissions();
        Self {
            sub: user.sub,
            name: user.name,
            roles: user.roles,
            permissions,
        }
    }
}
