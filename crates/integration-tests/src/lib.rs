//! Integration tests for Shopfront.
//!
//! The tests drive the real storefront router in-process: the same `app()`
//! the binary serves, wired to in-memory catalog, account and session
//! stores. No database or running server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart` - Adding, removing and pricing cart lines
//! - `auth` - Registration, login and logout
//! - `checkout` - The login-gated checkout flow
//! - `concurrency` - Parallel requests against one session

#![allow(clippy::missing_panics_doc, clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use secrecy::SecretString;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use tower_sessions::cookie::Cookie;

use shopfront_core::{CurrencyCode, Price, ProductId, Username};
use shopfront_storefront::config::{SentryConfig, StorefrontConfig};
use shopfront_storefront::db::{Catalog, MemoryCatalog, MemoryUserStore, UserStore};
use shopfront_storefront::middleware::SESSION_COOKIE_NAME;
use shopfront_storefront::models::Product;
use shopfront_storefront::services::auth::hash_password;
use shopfront_storefront::state::AppState;

/// Configuration for an in-process storefront.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/unused"),
        host: "127.0.0.1".parse().expect("valid address"),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from("k".repeat(64)),
        currency: CurrencyCode::USD,
        catalog_cache_ttl: Duration::from_secs(60),
        rate_limit_auth: false,
        trusted_proxies: Vec::new(),
        sentry: SentryConfig::default(),
    }
}

/// A catalog product priced in USD.
#[must_use]
pub fn product(id: i32, name: &str, price: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: format!("{name} description"),
        price: Price::new(price.parse().expect("valid price"), CurrencyCode::USD),
        image_url: None,
    }
}

/// The catalog most tests shop from.
#[must_use]
pub fn demo_products() -> Vec<Product> {
    vec![
        product(1, "Laptop", "750.00"),
        product(2, "Smartphone", "400.00"),
        product(3, "Headphones", "50.00"),
        product(4, "Keyboard", "30.00"),
    ]
}

/// A storefront running over in-memory stores.
pub struct TestContext {
    router: Router,
    /// The catalog the router reads, for tests that change it mid-flight.
    pub catalog: Arc<MemoryCatalog>,
    /// The account store the router reads.
    pub users: Arc<MemoryUserStore>,
}

impl TestContext {
    /// A storefront selling [`demo_products`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_products(demo_products())
    }

    /// A storefront selling `products`.
    #[must_use]
    pub fn with_products(products: Vec<Product>) -> Self {
        let catalog = Arc::new(MemoryCatalog::new(products));
        let users = Arc::new(MemoryUserStore::new());
        let router = build_router(catalog.clone(), users.clone());

        Self {
            router,
            catalog,
            users,
        }
    }

    /// A storefront reading products from an arbitrary catalog.
    #[must_use]
    pub fn with_catalog(catalog: Arc<dyn Catalog>) -> Self {
        let users = Arc::new(MemoryUserStore::new());
        let router = build_router(catalog, users.clone());

        Self {
            router,
            catalog: Arc::new(MemoryCatalog::default()),
            users,
        }
    }

    /// Store an account directly, bypassing registration.
    pub async fn create_user(&self, username: &str, password: &str) {
        let username = Username::parse(username).expect("valid username");
        let hash = hash_password(password).await.expect("hashable password");
        self.users
            .create(&username, &hash)
            .await
            .expect("account created");
    }

    /// A fresh visitor with no session cookie.
    #[must_use]
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: Arc::new(Mutex::new(None)),
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

fn build_router(catalog: Arc<dyn Catalog>, users: Arc<dyn UserStore>) -> Router {
    let state = AppState::new(test_config(), catalog, users);
    shopfront_storefront::app(state, MemoryStore::default()).expect("valid session key")
}

/// A browser-like client holding one session cookie.
///
/// Clones share the cookie, so concurrent requests from clones act as
/// parallel tabs of the same visitor.
#[derive(Clone)]
pub struct TestClient {
    router: Router,
    cookie: Arc<Mutex<Option<String>>>,
}

impl TestClient {
    /// Send a GET request.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::get(path).body(Body::empty()).expect("valid request");
        self.send(request).await
    }

    /// Send a bodiless POST request.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.post_form(path, &[]).await
    }

    /// Send a url-encoded form.
    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&");

        let request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("valid request");
        self.send(request).await
    }

    /// A second tab holding a copy of the current cookie.
    ///
    /// Cookies set on either client afterwards are not seen by the other.
    #[must_use]
    pub fn new_tab(&self) -> Self {
        Self {
            router: self.router.clone(),
            cookie: Arc::new(Mutex::new(self.session_cookie())),
        }
    }

    /// The session cookie value currently held, if any.
    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        self.cookie
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Log in through the login form, asserting success.
    pub async fn login(&self, username: &str, password: &str) {
        let response = self
            .post_form("/login", &[("username", username), ("password", password)])
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.body);
    }

    async fn send(&self, mut request: Request<Body>) -> TestResponse {
        if let Some(value) = self.session_cookie() {
            let cookie = format!("{SESSION_COOKIE_NAME}={value}");
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().expect("valid cookie header"));
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let Ok(raw) = set_cookie.to_str() else {
                continue;
            };
            let Ok(cookie) = Cookie::parse(raw) else {
                continue;
            };
            if cookie.name() != SESSION_COOKIE_NAME {
                continue;
            }

            let expired = cookie.value().is_empty()
                || cookie.max_age().is_some_and(|age| age.is_zero());
            let mut held = self.cookie.lock().unwrap_or_else(PoisonError::into_inner);
            *held = if expired {
                None
            } else {
                Some(cookie.value().to_string())
            };
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("readable body")
            .to_bytes();

        TestResponse {
            status,
            location,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestResponse {
    /// Assert a 303 redirect to `path`.
    pub fn assert_redirect(&self, path: &str) {
        assert_eq!(self.status, StatusCode::SEE_OTHER, "{}", self.body);
        assert_eq!(self.location.as_deref(), Some(path));
    }

    /// Quantity shown for `product_id` on a cart or checkout page.
    #[must_use]
    pub fn quantity_of(&self, product_id: i32) -> Option<u32> {
        let marker = format!("data-product-id=\"{product_id}\" data-quantity=\"");
        attribute_after(&self.body, &marker)?.parse().ok()
    }

    /// Cart total shown on a cart, checkout or confirmation page.
    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        attribute_after(&self.body, "data-total=\"")?.parse().ok()
    }

    /// Badge count in the page header; zero when no badge is shown.
    #[must_use]
    pub fn cart_count(&self) -> u64 {
        attribute_after(&self.body, "data-cart-count=\"")
            .and_then(|count| count.parse().ok())
            .unwrap_or(0)
    }

    /// Logged-in username shown in the page header.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        attribute_after(&self.body, "data-user=\"")
    }

    /// Reference of a placed order.
    #[must_use]
    pub fn order_reference(&self) -> Option<&str> {
        attribute_after(&self.body, "data-order-reference=\"")
    }
}

/// The quoted attribute value following `marker`.
fn attribute_after<'a>(body: &'a str, marker: &str) -> Option<&'a str> {
    let start = body.find(marker)? + marker.len();
    let rest = body.get(start..)?;
    let end = rest.find('"')?;
    rest.get(..end)
}
