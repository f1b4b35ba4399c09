mod routes;
mod session;

pub use routes::*;
pub use session::*;
