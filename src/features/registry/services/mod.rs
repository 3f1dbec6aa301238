mod entry_service;
mod registry_service;

pub use entry_service::EntryService;
pub use registry_service::RegistryService;

use crate::features::registry::dtos::SectionTreeDto;
use crate::shared::cache::ListCache;

/// Default (non-archived) trees, keyed by `RegisterKind::cache_key`
pub type TreeCache = ListCache<Vec<SectionTreeDto>>;
