pub mod objective_dto;

pub use objective_dto::{
    CreateObjectiveDto, ObjectiveActionDto, ObjectiveResponseDto, UpdateObjectiveDto,
};
