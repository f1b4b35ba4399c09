mod format_context;
mod hybrid_search;
mod refresh_index;

pub use format_context::*;
pub use hybrid_search::*;
pub use refresh_index::*;
