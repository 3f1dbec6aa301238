mod record;

pub use record::{ReviewRecord, VersionRecord};
