//! User domain types.

use chrono::{DateTime, Utc};

use shopfront_core::{UserId, Username};

/// A storefront account.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name, fixed at registration.
    pub username: Username,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

/// A user together with their stored password hash.
///
/// Only the auth service sees this type; the hash never leaves it.
#[derive(Clone)]
pub struct UserCredentials {
    /// The account.
    pub user: User,
    /// Argon2 PHC string.
    pub password_hash: String,
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentials")
            .field("user", &self.user)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}
