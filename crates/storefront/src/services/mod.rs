//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Session cart mutation and pricing
//! - `auth` - Password login, registration and the logged-in identity
//! - `checkout` - The gated checkout flow that turns a cart into a confirmation
//!
//! Services borrow their collaborators from `AppState` and take the request's
//! `tower_sessions::Session` as an explicit argument; none of them hold state
//! of their own.

pub mod auth;
pub mod cart;
pub mod checkout;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartLine, CartService, CartView};
pub use checkout::{
    CheckoutAction, CheckoutError, CheckoutPage, CheckoutService, CheckoutStage, OrderConfirmation,
    OrderDetails, OrderField,
};
