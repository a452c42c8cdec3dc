pub mod query;
pub mod registry;
