mod audit;

pub use audit::{derive_status, Audit, AuditDocumentLink, AuditStatus};
