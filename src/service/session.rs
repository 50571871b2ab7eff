// Login session over the API client.
// Tracks which user subsequent todo operations act on behalf of.

use tracing::debug;

use crate::api::client::MemoClient;
use crate::api::types::User;
use crate::error::Result;
use crate::validate;

/// A lightweight login session.
///
/// "Login" here is user selection, not authentication: the remote API is
/// unauthenticated, so a session just remembers which account the caller
/// is working as.
pub struct Session {
    client: MemoClient,
    current_user: Option<User>,
}

impl Session {
    pub fn new(client: MemoClient) -> Self {
        Self {
            client,
            current_user: None,
        }
    }

    /// Logs in as the user with the given id. Returns `false` when the
    /// server does not know the account; a previous login stays in place.
    pub async fn login(&mut self, user_id: u64) -> Result<bool> {
        match self.client.get_user(user_id).await? {
            Some(user) => {
                debug!(user_id, username = %user.username, "logged in");
                self.current_user = Some(user);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Logs in by username, matched case-insensitively. A blank username
    /// is a validation error; a well-formed name with no matching account
    /// returns `false`.
    pub async fn login_by_username(&mut self, username: &str) -> Result<bool> {
        validate::username(username)?;
        let wanted = username.trim();

        let users = self.client.get_all_users().await?;
        match users
            .into_iter()
            .find(|user| user.username.eq_ignore_ascii_case(wanted))
        {
            Some(user) => {
                debug!(user_id = user.id, username = %user.username, "logged in");
                self.current_user = Some(user);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Forgets the current user.
    pub fn logout(&mut self) {
        if let Some(user) = self.current_user.take() {
            debug!(user_id = user.id, "logged out");
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn current_user_id(&self) -> Option<u64> {
        self.current_user.as_ref().map(|user| user.id)
    }

    /// Name to show for the session, or "not logged in".
    pub fn display_name(&self) -> &str {
        self.current_user
            .as_ref()
            .map(|user| user.display_name())
            .unwrap_or("not logged in")
    }

    pub fn client(&self) -> &MemoClient {
        &self.client
    }
}
