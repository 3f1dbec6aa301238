pub mod audits;
pub mod auth;
pub mod documents;
pub mod history;
pub mod objectives;
pub mod registry;
