//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Product listing
//! GET  /product/{id}           - Product detail (redirects home if missing)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (added in main, needs the pool)
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add/{id}          - Add one unit, redirect to cart
//! POST /cart/remove/{id}       - Remove one unit, redirect to cart
//!
//! # Checkout (requires login and a non-empty cart)
//! GET  /checkout               - Order form
//! POST /checkout/place         - Place order, render confirmation
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action (rate limited)
//! GET  /register               - Register page
//! POST /register               - Register action (rate limited)
//! GET  /logout                 - Clear the session
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use shopfront_core::ProductId;

use crate::config::StorefrontConfig;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the form-submitting auth routes, rate limited when enabled.
pub fn auth_routes(config: &StorefrontConfig) -> Router<AppState> {
    let router = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register));

    if config.rate_limit_auth {
        router.layer(auth_rate_limiter(&config.trusted_proxies))
    } else {
        router
    }
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add/{id}", post(cart::add))
        .route("/remove/{id}", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/place", post(checkout::place))
}

/// Create all routes for the storefront.
pub fn routes(config: &StorefrontConfig) -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/product/{id}", get(products::show))
        .route("/health", get(health::health))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", get(auth::logout))
        .merge(auth_routes(config))
}

/// Parse a product id from a path segment; anything unparsable is treated
/// like an unknown product.
fn parse_product_id(raw: &str) -> Option<ProductId> {
    raw.parse().ok()
}
