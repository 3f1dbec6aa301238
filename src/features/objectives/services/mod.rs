mod objective_service;

pub use objective_service::ObjectiveService;
