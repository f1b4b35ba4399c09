mod duckdb_lexical_store;
mod duckdb_state_store;
mod duckdb_vector_store;
mod http_embedding;
mod in_memory_vector_store;
mod mock_embedding;
mod noop_vector_store;

pub use duckdb_lexical_store::*;
pub use duckdb_state_store::*;
pub use duckdb_vector_store::*;
pub use http_embedding::*;
pub use in_memory_vector_store::*;
pub use mock_embedding::*;
pub use noop_vector_store::*;
