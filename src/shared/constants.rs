/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Admin role - full access including hard deletes
pub const ROLE_ADMIN: &str = "admin";

/// Editor role - can create, update, archive, approve and reorder
pub const ROLE_EDITOR: &str = "editor";

/// Viewer role - read only
pub const ROLE_VIEWER: &str = "viewer";

// =============================================================================
// LIST CACHE KEYS
// =============================================================================

pub const AUDITS_CACHE_KEY: &str = "audits";

pub const OBJECTIVES_CACHE_KEY: &str = "objectives";

// =============================================================================
// STORAGE
// =============================================================================

/// Route the upload directory is served under
pub const UPLOADS_ROUTE: &str = "/uploads";
