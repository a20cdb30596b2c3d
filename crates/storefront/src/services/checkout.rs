//! Checkout service.
//!
//! Checkout moves through three stages:
//!
//! ```text
//! Browsing --Enter--> CheckoutForm --Place--> OrderPlaced --Continue--> Browsing
//!                      |      ^
//!                      +Enter-+
//! ```
//!
//! The stage is never stored. Each request first asks the auth service for
//! the logged-in customer, then derives the stage from the cart (a cart with
//! at least one purchasable line is at `CheckoutForm`) and checks the
//! requested action against the table above. Leaving `Browsing` needs a
//! cart, so both actions fail with `EmptyCart` there. Submitting an order
//! re-runs the whole gate instead of trusting the earlier page view.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tower_sessions::Session;
use tracing::{info, instrument};
use uuid::Uuid;

use shopfront_core::{Price, Username};

use super::auth::{AuthError, AuthService};
use super::cart::{CartError, CartLine, CartService, CartView};
use crate::models::session::SessionData;

// =============================================================================
// Stages
// =============================================================================

/// Where a visitor is in the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    /// Shopping; checkout not started.
    Browsing,
    /// Looking at the order form.
    CheckoutForm,
    /// The order has just been placed.
    OrderPlaced,
}

/// A request to move between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutAction {
    /// Open the checkout form.
    Enter,
    /// Submit the order form.
    Place,
    /// Leave the confirmation and keep shopping.
    Continue,
}

impl CheckoutStage {
    /// Derive the stage a logged-in visitor's request starts from.
    #[must_use]
    pub fn of(cart: &CartView) -> Self {
        if cart.is_empty() {
            Self::Browsing
        } else {
            Self::CheckoutForm
        }
    }

    /// Apply `action`, returning the next stage.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` for checkout actions while
    /// browsing, and `CheckoutError::InvalidTransition` for any other pair
    /// not in the transition table.
    pub const fn next(self, action: CheckoutAction) -> Result<Self, CheckoutError> {
        match (self, action) {
            (Self::CheckoutForm, CheckoutAction::Enter) => Ok(Self::CheckoutForm),
            (Self::CheckoutForm, CheckoutAction::Place) => Ok(Self::OrderPlaced),
            (Self::OrderPlaced, CheckoutAction::Continue) => Ok(Self::Browsing),
            (Self::Browsing, CheckoutAction::Enter | CheckoutAction::Place) => {
                Err(CheckoutError::EmptyCart)
            }
            (from, action) => Err(CheckoutError::InvalidTransition { from, action }),
        }
    }
}

// =============================================================================
// Order types
// =============================================================================

/// A required order form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    /// Customer name.
    Name,
    /// Delivery address.
    Address,
    /// Payment method.
    PaymentMethod,
}

impl OrderField {
    /// Human-readable label for form errors.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Address => "address",
            Self::PaymentMethod => "payment method",
        }
    }
}

/// The submitted order form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderDetails {
    /// Name of the customer.
    #[serde(default)]
    pub name: String,
    /// Delivery address.
    #[serde(default)]
    pub address: String,
    /// Payment method.
    #[serde(default, rename = "payment")]
    pub payment_method: String,
}

impl OrderDetails {
    /// Trim all fields and report the ones left empty.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` listing every empty field.
    pub fn validated(self) -> Result<Self, CheckoutError> {
        let details = Self {
            name: self.name.trim().to_owned(),
            address: self.address.trim().to_owned(),
            payment_method: self.payment_method.trim().to_owned(),
        };

        let missing: Vec<OrderField> = [
            (OrderField::Name, &details.name),
            (OrderField::Address, &details.address),
            (OrderField::PaymentMethod, &details.payment_method),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(details)
        } else {
            Err(CheckoutError::Validation(missing))
        }
    }
}

/// What the checkout form page needs.
#[derive(Debug, Clone)]
pub struct CheckoutPage {
    /// The logged-in customer.
    pub customer: Username,
    /// The priced cart being ordered.
    pub cart: CartView,
}

/// The result of a placed order. Shown once, never stored.
#[derive(Debug, Clone)]
pub struct OrderConfirmation {
    /// Reference to quote to support.
    pub reference: Uuid,
    /// Who placed the order.
    pub customer: Username,
    /// The validated order form.
    pub details: OrderDetails,
    /// Cart lines at the moment of placement.
    pub lines: Vec<CartLine>,
    /// Order total at the moment of placement.
    pub total: Price,
    /// When the order was placed.
    pub placed_at: DateTime<Utc>,
}

// =============================================================================
// Errors
// =============================================================================

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nobody is logged in.
    #[error("login required")]
    Unauthenticated,

    /// The cart has no purchasable lines.
    #[error("cart is empty")]
    EmptyCart,

    /// Required order fields are empty.
    #[error("missing required fields: {}", join_labels(.0))]
    Validation(Vec<OrderField>),

    /// The requested action is not allowed from the current stage.
    #[error("cannot {action:?} from {from:?}")]
    InvalidTransition {
        /// Stage the request started from.
        from: CheckoutStage,
        /// Requested action.
        action: CheckoutAction,
    },

    /// Looking up the customer failed.
    #[error(transparent)]
    Auth(AuthError),

    /// Pricing the cart failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The session store failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl From<AuthError> for CheckoutError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated => Self::Unauthenticated,
            AuthError::Session(e) => Self::Session(e),
            other => Self::Auth(other),
        }
    }
}

fn join_labels(fields: &[OrderField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Service
// =============================================================================

/// Checkout service.
pub struct CheckoutService<'a> {
    auth: AuthService<'a>,
    cart: CartService<'a>,
}

impl<'a> CheckoutService<'a> {
    /// Create a checkout service gating on `auth` and pricing through `cart`.
    #[must_use]
    pub const fn new(auth: AuthService<'a>, cart: CartService<'a>) -> Self {
        Self { auth, cart }
    }

    /// Open the checkout form.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Unauthenticated` if nobody is logged in, then
    /// `CheckoutError::EmptyCart` if no cart line is purchasable.
    #[instrument(skip(self, session))]
    pub async fn enter_checkout(&self, session: &Session) -> Result<CheckoutPage, CheckoutError> {
        let (customer, _, cart) = self.gate(session, CheckoutAction::Enter).await?;
        Ok(CheckoutPage { customer, cart })
    }

    /// Place the order and empty the cart.
    ///
    /// The identity and cart are checked again here; the checkout page may
    /// have been rendered for a session that has since logged out.
    ///
    /// # Errors
    ///
    /// Returns, in order of precedence, `CheckoutError::Unauthenticated`,
    /// `CheckoutError::EmptyCart` and `CheckoutError::Validation`. The
    /// session is unchanged on any error.
    #[instrument(skip(self, session, details))]
    pub async fn place_order(
        &self,
        session: &Session,
        details: OrderDetails,
    ) -> Result<OrderConfirmation, CheckoutError> {
        let (customer, mut data, view) = self.gate(session, CheckoutAction::Place).await?;
        let details = details.validated()?;

        data.cart.clear();
        data.save(session).await?;

        let confirmation = OrderConfirmation {
            reference: Uuid::new_v4(),
            customer,
            details,
            lines: view.lines,
            total: view.total,
            placed_at: Utc::now(),
        };

        info!(
            reference = %confirmation.reference,
            customer = %confirmation.customer,
            total = %confirmation.total,
            lines = confirmation.lines.len(),
            "order placed"
        );

        Ok(confirmation)
    }

    /// Resolve the customer and priced cart, then apply `action`.
    async fn gate(
        &self,
        session: &Session,
        action: CheckoutAction,
    ) -> Result<(Username, SessionData, CartView), CheckoutError> {
        let customer = self.auth.require_auth(session).await?;
        let data = SessionData::load(session).await?;
        let view = self.cart.compute_view(&data.cart).await?;

        CheckoutStage::of(&view).next(action)?;
        Ok((customer, data, view))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use shopfront_core::{CurrencyCode, ProductId};
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::db::{MemoryCatalog, MemoryUserStore};
    use crate::models::product::Product;

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new([1, 3].map(|id| Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Price::new(Decimal::from(if id == 1 { 10 } else { 5 }), CurrencyCode::USD),
            image_url: None,
        }))
    }

    async fn session_with(user: Option<&str>, cart: &[i32]) -> Session {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut data = SessionData {
            user_ref: user.map(|u| Username::parse(u).unwrap()),
            ..SessionData::default()
        };
        for id in cart {
            data.cart.increment(ProductId::new(*id));
        }
        data.save(&session).await.unwrap();
        session
    }

    fn service<'a>(catalog: &'a MemoryCatalog, users: &'a MemoryUserStore) -> CheckoutService<'a> {
        CheckoutService::new(
            AuthService::new(users),
            CartService::new(catalog, CurrencyCode::USD),
        )
    }

    fn details(name: &str, address: &str, payment: &str) -> OrderDetails {
        OrderDetails {
            name: name.to_owned(),
            address: address.to_owned(),
            payment_method: payment.to_owned(),
        }
    }

    #[test]
    fn test_transition_table() {
        use CheckoutAction::{Continue, Enter, Place};
        use CheckoutStage::{Browsing, CheckoutForm, OrderPlaced};

        assert_eq!(CheckoutForm.next(Enter).unwrap(), CheckoutForm);
        assert_eq!(CheckoutForm.next(Place).unwrap(), OrderPlaced);
        assert_eq!(OrderPlaced.next(Continue).unwrap(), Browsing);

        for action in [Enter, Place] {
            assert!(matches!(
                Browsing.next(action),
                Err(CheckoutError::EmptyCart)
            ));
        }

        for (from, action) in [
            (Browsing, Continue),
            (CheckoutForm, Continue),
            (OrderPlaced, Enter),
            (OrderPlaced, Place),
        ] {
            assert!(matches!(
                from.next(action),
                Err(CheckoutError::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn test_validation_lists_every_empty_field() {
        let err = details("  ", "1 Main St", "").validated().unwrap_err();
        match err {
            CheckoutError::Validation(fields) => {
                assert_eq!(fields, vec![OrderField::Name, OrderField::PaymentMethod]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_enter_requires_login_first() {
        let (catalog, users) = (catalog(), MemoryUserStore::new());
        let checkout = service(&catalog, &users);

        let session = session_with(None, &[]).await;
        assert!(matches!(
            checkout.enter_checkout(&session).await,
            Err(CheckoutError::Unauthenticated)
        ));

        let session = session_with(Some("demo"), &[]).await;
        assert!(matches!(
            checkout.enter_checkout(&session).await,
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[tokio::test]
    async fn test_place_order_gate_order() {
        let (catalog, users) = (catalog(), MemoryUserStore::new());
        let checkout = service(&catalog, &users);

        let session = session_with(None, &[1]).await;
        assert!(matches!(
            checkout.place_order(&session, details("", "", "")).await,
            Err(CheckoutError::Unauthenticated)
        ));

        let session = session_with(Some("demo"), &[]).await;
        assert!(matches!(
            checkout.place_order(&session, details("", "", "")).await,
            Err(CheckoutError::EmptyCart)
        ));

        let session = session_with(Some("demo"), &[1]).await;
        assert!(matches!(
            checkout.place_order(&session, details("", "", "")).await,
            Err(CheckoutError::Validation(_))
        ));
        let data = SessionData::load(&session).await.unwrap();
        assert_eq!(data.cart.quantity(ProductId::new(1)), 1);
    }

    #[tokio::test]
    async fn test_place_order_clears_cart() {
        let (catalog, users) = (catalog(), MemoryUserStore::new());
        let checkout = service(&catalog, &users);
        let session = session_with(Some("demo"), &[1, 1, 3]).await;

        let confirmation = checkout
            .place_order(&session, details(" Jane ", "1 Main St", "card"))
            .await
            .unwrap();

        assert_eq!(confirmation.total.amount, Decimal::from_str("25.00").unwrap());
        assert_eq!(confirmation.details.name, "Jane");
        assert_eq!(confirmation.customer.as_str(), "demo");
        assert_eq!(confirmation.lines.len(), 2);

        let data = SessionData::load(&session).await.unwrap();
        assert!(data.cart.is_empty());
        assert_eq!(data.user_ref.unwrap().as_str(), "demo");
    }

    #[tokio::test]
    async fn test_cart_of_delisted_products_counts_as_empty() {
        let (catalog, users) = (catalog(), MemoryUserStore::new());
        let checkout = service(&catalog, &users);
        let session = session_with(Some("demo"), &[7, 7]).await;

        assert!(matches!(
            checkout.enter_checkout(&session).await,
            Err(CheckoutError::EmptyCart)
        ));
        assert!(matches!(
            checkout
                .place_order(&session, details("Jane", "1 Main St", "card"))
                .await,
            Err(CheckoutError::EmptyCart)
        ));

        let data = SessionData::load(&session).await.unwrap();
        assert_eq!(data.cart.quantity(ProductId::new(7)), 2);
    }

    #[test]
    fn test_auth_errors_map_to_checkout_errors() {
        assert!(matches!(
            CheckoutError::from(AuthError::Unauthenticated),
            CheckoutError::Unauthenticated
        ));
        assert!(matches!(
            CheckoutError::from(AuthError::PasswordHash),
            CheckoutError::Auth(AuthError::PasswordHash)
        ));
    }
}
