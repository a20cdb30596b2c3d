//! The typed session record.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use shopfront_core::Username;

use super::cart::Cart;

/// Key under which [`SessionData`] is stored. Nothing else is kept in the
/// session.
pub const SESSION_DATA_KEY: &str = "shopfront.data";

/// Everything the storefront keeps for one visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionData {
    /// The logged-in account, if any.
    pub user_ref: Option<Username>,
    /// The visitor's cart.
    pub cart: Cart,
}

impl SessionData {
    /// Read the record, treating a missing value as an anonymous empty session.
    ///
    /// # Errors
    ///
    /// Returns the session error if the store fails or the stored value does
    /// not deserialize.
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        Ok(session
            .get::<Self>(SESSION_DATA_KEY)
            .await?
            .unwrap_or_default())
    }

    /// Replace the stored record with `self` in a single write.
    ///
    /// # Errors
    ///
    /// Returns the session error if the store fails.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(SESSION_DATA_KEY, self).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use shopfront_core::ProductId;
    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_missing_record_is_empty() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let data = SessionData::load(&session).await.unwrap();
        assert_eq!(data, SessionData::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut data = SessionData {
            user_ref: Some(Username::parse("demo").unwrap()),
            ..SessionData::default()
        };
        data.cart.increment(ProductId::new(4));
        data.save(&session).await.unwrap();

        assert_eq!(SessionData::load(&session).await.unwrap(), data);
    }

    #[test]
    fn test_partial_record_defaults() {
        let data: SessionData = serde_json::from_str(r#"{"cart":{"2":1}}"#).unwrap();
        assert!(data.user_ref.is_none());
        assert_eq!(data.cart.quantity(ProductId::new(2)), 1);
    }
}
