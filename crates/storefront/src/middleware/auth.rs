//! Visitor extractor for page chrome.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use shopfront_core::Username;

use crate::models::session::SessionData;

/// What every page shows about the current visitor: who is logged in and how
/// many units are in the cart.
///
/// This extractor never rejects. Pages that must have a user go through
/// `AuthService::require_auth` or the checkout gate instead.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(visitor: Visitor) -> impl IntoResponse {
///     match visitor.user {
///         Some(name) => format!("Hello, {name}!"),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Visitor {
    /// The logged-in account, if any.
    pub user: Option<Username>,
    /// Units in the cart, for the navigation badge.
    pub cart_count: u64,
}

impl Visitor {
    /// The same visitor after their cart has been emptied.
    #[must_use]
    pub fn with_empty_cart(self) -> Self {
        Self {
            cart_count: 0,
            ..self
        }
    }
}

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self::default());
        };

        match SessionData::load(session).await {
            Ok(data) => Ok(Self {
                user: data.user_ref,
                cart_count: data.cart.item_count(),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read session for page chrome");
                Ok(Self::default())
            }
        }
    }
}
