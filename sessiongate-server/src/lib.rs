//! HTTP front end for sessiongate: routing, handlers and the accept loop

pub mod config;
pub mod handlers;
pub mod server;
pub mod state;

pub use config::ServerArgs;
pub use handlers::handle_request;
pub use server::{json_response, spawn_revocation_sweeper, ResponseBody, SessionGateServer};
pub use state::AppState;
