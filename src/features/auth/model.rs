use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{ROLE_ADMIN, ROLE_EDITOR, ROLE_VIEWER};

/// What a caller wants to do with a register, audit or objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Delete,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Read => write!(f, "read"),
            Permission::Write => write!(f, "write"),
            Permission::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub sub: String,
    /// Display name, when the identity provider includes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Check if user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Role-to-permission mapping:
    /// - admin: read, write, delete
    /// - editor: read, write
    /// - viewer: read
    pub fn has_permission(&self, permission: Permission) -> bool {
        match permission {
            Permission::Read => {
                self.has_role(ROLE_ADMIN) || self.has_role(ROLE_EDITOR) || self.has_role(ROLE_VIEWER)
            }
            Permission::Write => self.has_role(ROLE_ADMIN) || self.has_role(ROLE_EDITOR),
            Permission::Delete => self.has_role(ROLE_ADMIN),
        }
    }

    pub fn permissions(&self) -> Vec<Permission> {
        [Permission::Read, Permission::Write, Permission::Delete]
            .into_iter()
            .filter(|p| self.has_permission(*p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(roles: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "user-1".to_string(),
            name: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_admin_has_every_permission() {
        assert_eq!(
            user(&[ROLE_ADMIN]).permissions(),
            vec![Permission::Read, Permission::Write, Permission::Delete]
        );
    }

    #[test]
    fn test_editor_cannot_delete() {
        let editor = user(&[ROLE_EDITOR]);
        assert!(editor.has_permission(Permission::Write));
        assert!(!editor.has_permission(Permission::Delete));
    }

    #[test]
    fn test_viewer_is_read_only() {
        assert_eq!(user(&[ROLE_VIEWER]).permissions(), vec![Permission::Read]);
    }

    #[test]
    fn test_unknown_role_has_nothing() {
        assert!(user(&["guest"]).permissions().is_empty());
    }
}
