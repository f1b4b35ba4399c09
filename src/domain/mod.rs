pub mod error;
pub mod models;

pub use error::KnowledgeError;
pub use models::*;
