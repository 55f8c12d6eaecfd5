//! Admin credentials supplied after startup by a persistent store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Admin username/password pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of logs.
impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A store that can supply admin credentials, e.g. a database row.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Current credentials, or `None` if the store has none yet.
    async fn admin_credentials(&self) -> anyhow::Result<Option<AdminCredentials>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_masks_password() {
        let creds = AdminCredentials::new("admin", "hunter2");
        let out = format!("{:?}", creds);
        assert!(out.contains("admin"));
        assert!(!out.contains("hunter2"));
    }
}
