mod objective;

pub use objective::{Objective, ObjectiveStatus};
