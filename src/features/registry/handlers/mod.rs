mod entry_handler;
mod registry_handler;

pub use entry_handler::*;
pub use registry_handler::*;
