mod document;

pub use document::{Document, RelatedEntityType};
