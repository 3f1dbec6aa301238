pub mod registry_dto;

pub use registry_dto::{
    CategoryActionDto, CategoryOptionDto, CategoryResponseDto, CategoryTreeDto,
    CreateCategoryDto, CreateEntryDto, CreateSectionDto, EntryActionDto, EntryResponseDto,
    MoveEntryDto, SectionOptionDto, SectionResponseDto, SectionTreeDto, UpdateCategoryDto,
    UpdateEntryDto, UpdateSectionDto,
};
