//! Customer account commands.
//!
//! # Usage
//!
//! ```bash
//! shopfront-cli user create -u alice -p secret1
//! ```

use shopfront_core::Username;
use shopfront_storefront::db::{PgUserStore, RepositoryError, UserStore};
use shopfront_storefront::models::User;
use shopfront_storefront::services::auth::{AuthError, hash_password, validate_password};

use super::{CommandError, connect};

/// Errors that can occur during account operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Invalid account: {0}")]
    Invalid(#[from] AuthError),

    #[error("Username already exists: {0}")]
    AlreadyExists(Username),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a customer account.
///
/// # Errors
///
/// Returns an error if the username or password is rejected, the name is
/// taken or the database is unreachable.
pub async fn create(username: &str, password: &str) -> Result<(), UserError> {
    let username = Username::parse(username).map_err(AuthError::from)?;
    validate_password(password)?;

    let pool = connect().await?;
    let store = PgUserStore::new(pool);

    let user = create_account(&store, &username, password).await?;
    tracing::info!(id = %user.id, username = %user.username, "Account created");
    Ok(())
}

/// Hash `password` and store a new account.
///
/// The caller is responsible for validating the password first.
pub(crate) async fn create_account(
    store: &dyn UserStore,
    username: &Username,
    password: &str,
) -> Result<User, UserError> {
    let password_hash = hash_password(password).await?;

    match store.create(username, &password_hash).await {
        Ok(user) => Ok(user),
        Err(RepositoryError::Conflict(_)) => Err(UserError::AlreadyExists(username.clone())),
        Err(e) => Err(e.into()),
    }
}
