//! Fixed credential set checked at login and on every protected request.

use subtle::ConstantTimeEq;
use tracing::debug;

use crate::config::UserCredential;

/// Shown to the user when a login attempt fails
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Username/password pairs loaded once at startup. Never mutated.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    users: Vec<UserCredential>,
}

impl CredentialStore {
    pub fn new(users: Vec<UserCredential>) -> Self {
        Self { users }
    }

    /// True iff the exact pair exists. Never an error.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        let found = self
            .users
            .iter()
            .any(|u| bytes_eq(&u.username, username) && bytes_eq(&u.password, password));

        debug!(username = %username, authenticated = found, "Credential check");
        found
    }

    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.users.iter().map(|u| u.username.as_str())
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(crate::config::default_users())
    }
}

fn bytes_eq(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();
    expected.len() == provided.len() && bool::from(expected.ct_eq(provided))
}
