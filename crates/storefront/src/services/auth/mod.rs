//! Authentication service.
//!
//! Provides password login and registration and manages the identity stored
//! in the visitor's session. Establishing an identity keeps the session id and
//! the cart.

mod error;
pub mod password;

pub use error::AuthError;
pub use password::{MIN_PASSWORD_LENGTH, hash_password, validate_password, verify_password};

use tower_sessions::Session;
use tracing::{info, instrument};

use shopfront_core::Username;

use crate::db::{RepositoryError, UserStore};
use crate::models::session::SessionData;

/// Authentication service.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserStore) -> Self {
        Self { users }
    }

    /// Log in with username and password.
    ///
    /// On success the username becomes the session identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the user does not exist or
    /// the password is wrong; the session is not touched in that case.
    #[instrument(skip(self, session, password))]
    pub async fn login(
        &self,
        session: &Session,
        username: &str,
        password: &str,
    ) -> Result<Username, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let credentials = self
            .users
            .find_credentials(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &credentials.password_hash).await?;

        establish_identity(session, &username).await?;
        info!(username = %username, "user logged in");

        Ok(username)
    }

    /// Register a new account and log it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` if the username format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UsernameTaken` if the name is already registered;
    /// the existing account is left unchanged.
    #[instrument(skip(self, session, password))]
    pub async fn register(
        &self,
        session: &Session,
        username: &str,
        password: &str,
    ) -> Result<Username, AuthError> {
        let username = Username::parse(username)?;
        validate_password(password)?;

        if self.users.find_credentials(&username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = hash_password(password).await?;

        // A concurrent registration can still win the race to insert.
        self.users
            .create(&username, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::Repository(other),
            })?;

        establish_identity(session, &username).await?;
        info!(username = %username, "user registered");

        Ok(username)
    }

    /// Clear the whole session, identity and cart alike.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session store fails.
    #[instrument(skip_all)]
    pub async fn logout(&self, session: &Session) -> Result<(), AuthError> {
        session.flush().await?;
        Ok(())
    }

    /// Return the session identity or fail with `Unauthenticated`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` if nobody is logged in.
    pub async fn require_auth(&self, session: &Session) -> Result<Username, AuthError> {
        current_user(session)
            .await?
            .ok_or(AuthError::Unauthenticated)
    }
}

/// The identity stored in the session, if any.
///
/// # Errors
///
/// Returns the session error if the store fails.
pub async fn current_user(
    session: &Session,
) -> Result<Option<Username>, tower_sessions::session::Error> {
    Ok(SessionData::load(session).await?.user_ref)
}

async fn establish_identity(session: &Session, username: &Username) -> Result<(), AuthError> {
    let mut data = SessionData::load(session).await?;
    data.user_ref = Some(username.clone());

    // Same id: other tabs hold this cookie and lock on it.
    data.save(session).await?;
    Ok(())
}
