pub mod cache;
pub mod constants;
pub mod ordering;
pub mod sortable;
pub mod test_helpers;
pub mod types;
pub mod validation;
