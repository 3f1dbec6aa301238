mod objective_handler;

pub use objective_handler::*;
