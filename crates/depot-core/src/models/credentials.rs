use serde::Deserialize;
use std::fmt;

/// Username/secret pair for authenticating against a legacy repository.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteCredentials {
    username: String,
    secret: String,
}

impl RemoteCredentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Both parts present and non-blank.
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.secret.trim().is_empty()
    }
}

impl fmt::Debug for RemoteCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCredentials")
            .field("username", &self.username)
            .field("secret", &"***")
            .finish()
    }
}
