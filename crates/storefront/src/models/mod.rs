//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from database row types and
//! from the template view types in `routes`.

pub mod cart;
pub mod product;
pub mod session;
pub mod user;

pub use cart::Cart;
pub use product::{NewProduct, Product};
pub use session::SessionData;
pub use user::{User, UserCredentials};
