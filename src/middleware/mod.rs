mod auth;
mod error_handler;

pub use auth::auth_middleware;
pub use error_handler::log_requests;
