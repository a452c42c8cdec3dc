pub mod criteria;
pub mod document;
pub mod error;
pub mod fields;
pub mod instance;
pub mod model;
pub mod traits;
pub mod warnings;
