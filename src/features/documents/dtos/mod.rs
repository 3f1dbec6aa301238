pub mod document_dto;

pub use document_dto::{
    check_file, is_mime_type_allowed, DocumentResponseDto, FailedUploadDto, IncomingFile,
    UploadDocumentsDto, UploadResultDto, ALLOWED_MIME_TYPES,
};
