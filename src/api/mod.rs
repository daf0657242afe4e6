//! HTTP API module: routes, handlers, CORS and server startup.

pub mod cors;
pub mod handlers;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use routes::{create_router, ApiDoc};
pub use server::serve;
