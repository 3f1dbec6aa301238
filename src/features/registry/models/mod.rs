mod category;
mod entry;
mod register_kind;
mod section;

pub use category::Category;
pub use entry::Entry;
pub use register_kind::RegisterKind;
pub use section::Section;
