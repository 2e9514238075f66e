pub mod authentication;

pub use authentication::{AuthenticatedUser, AuthenticationResult};
