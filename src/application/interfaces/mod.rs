mod embedding_service;
mod file_scanner;
mod lexical_store;
mod splitter_service;
mod state_store;
mod vector_store;

pub use embedding_service::*;
pub use file_scanner::*;
pub use lexical_store::*;
pub use splitter_service::*;
pub use state_store::*;
pub use vector_store::*;
