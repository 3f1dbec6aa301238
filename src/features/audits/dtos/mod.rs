pub mod audit_dto;

pub use audit_dto::{
    AuditActionDto, AuditDocumentDto, AuditResponseDto, CreateAuditDto, UpdateAuditDto,
};
