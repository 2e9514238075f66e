pub mod app_state;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod range;
pub mod router;
pub mod security;

pub use app_state::AppState;
pub use error::ApiError;
pub use router::resource_routes;
pub use security::auth_middleware;

#[cfg(test)]
mod tests;
