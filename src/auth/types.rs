//! Auth configuration types

use std::fmt;

/// Authentication configuration
#[derive(Clone, Default)]
pub enum AuthConfig {
    /// No authentication (public resources only)
    #[default]
    None,

    /// HTTP Basic authentication
    Basic {
        /// Username
        username: String,
        /// App password
        password: String,
    },
}

impl AuthConfig {
    /// Create a basic auth config
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Whether any credentials are configured
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

// Credentials must never reach the logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}
