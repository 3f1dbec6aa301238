mod audit_service;

pub use audit_service::AuditService;

use crate::features::audits::dtos::AuditResponseDto;
use crate::shared::cache::ListCache;

/// Default (non-archived) audit list with linked entry titles, under `AUDITS_CACHE_KEY`
pub type AuditCache = ListCache<Vec<AuditResponseDto>>;
