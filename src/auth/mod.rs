//! Authentication module
//!
//! The Bitbucket API is accessed with HTTP basic auth: the account username
//! paired with an app password.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthConfig;
