//! Management API: overview, export, and import endpoints with per-key
//! admission on the way in.

mod handlers;
mod server;

pub use handlers::{router, AppState};
pub use server::HttpServer;
