//! Cart service.
//!
//! Adds and removes single units of a product in the session cart and prices
//! the cart against the catalog.

use thiserror::Error;
use tower_sessions::Session;
use tracing::{debug, instrument};

use shopfront_core::{CurrencyCode, Price, ProductId};

use crate::db::{Catalog, RepositoryError};
use crate::models::cart::Cart;
use crate::models::product::Product;
use crate::models::session::SessionData;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product is not in the catalog.
    #[error("product {0} not found")]
    NotFound(ProductId),

    /// A product is priced in a currency other than the store's.
    #[error("product {0} is not priced in the store currency")]
    MixedCurrency(ProductId),

    /// The catalog could not be read.
    #[error("catalog error: {0}")]
    Catalog(#[from] RepositoryError),

    /// The session store failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// One priced cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// The product as currently listed.
    pub product: Product,
    /// Units in the cart (always at least one).
    pub quantity: u32,
    /// `quantity * product.price`.
    pub subtotal: Price,
}

/// A cart priced against the current catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    /// Lines ordered by product id; products no longer listed are omitted.
    pub lines: Vec<CartLine>,
    /// Sum of the line subtotals.
    pub total: Price,
    /// Units across the listed lines.
    pub item_count: u64,
}

impl CartView {
    /// Whether there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cart service.
pub struct CartService<'a> {
    catalog: &'a dyn Catalog,
    currency: CurrencyCode,
}

impl<'a> CartService<'a> {
    /// Create a cart service pricing in `currency`.
    #[must_use]
    pub const fn new(catalog: &'a dyn Catalog, currency: CurrencyCode) -> Self {
        Self { catalog, currency }
    }

    /// Add one unit of `product_id` to the session cart.
    ///
    /// Returns the new quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotFound` if the product is not in the catalog, in
    /// which case the session is left untouched.
    #[instrument(skip(self, session))]
    pub async fn add_item(&self, session: &Session, product_id: ProductId) -> Result<u32, CartError> {
        if self.catalog.find_product(product_id).await?.is_none() {
            return Err(CartError::NotFound(product_id));
        }

        let mut data = SessionData::load(session).await?;
        data.cart.increment(product_id);
        data.save(session).await?;

        Ok(data.cart.quantity(product_id))
    }

    /// Remove one unit of `product_id` from the session cart.
    ///
    /// The entry disappears when its quantity reaches zero. Removing a product
    /// that is not in the cart does nothing. Returns the new quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session cannot be read or written.
    #[instrument(skip(self, session))]
    pub async fn remove_item(
        &self,
        session: &Session,
        product_id: ProductId,
    ) -> Result<u32, CartError> {
        let mut data = SessionData::load(session).await?;
        if !data.cart.decrement(product_id) {
            return Ok(0);
        }
        data.save(session).await?;

        Ok(data.cart.quantity(product_id))
    }

    /// Price the session cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Catalog` if a product lookup fails.
    #[instrument(skip(self, session))]
    pub async fn view(&self, session: &Session) -> Result<CartView, CartError> {
        let data = SessionData::load(session).await?;
        self.compute_view(&data.cart).await
    }

    /// Price `cart` against the catalog.
    ///
    /// Entries whose product no longer exists are dropped from the view; the
    /// stored cart is not modified.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Catalog` if a lookup fails and
    /// `CartError::MixedCurrency` if a product is not priced in the store
    /// currency.
    pub async fn compute_view(&self, cart: &Cart) -> Result<CartView, CartError> {
        let mut lines = Vec::with_capacity(cart.len());
        let mut total = Price::zero(self.currency);
        let mut item_count = 0_u64;

        for (product_id, quantity) in cart.iter() {
            let Some(product) = self.catalog.find_product(product_id).await? else {
                debug!(product_id = %product_id, "dropping cart line for unlisted product");
                continue;
            };

            let quantity = quantity.get();
            let subtotal = product.price.times(quantity);
            total = total
                .checked_add(subtotal)
                .ok_or(CartError::MixedCurrency(product_id))?;
            item_count += u64::from(quantity);

            lines.push(CartLine {
                product,
                quantity,
                subtotal,
            });
        }

        Ok(CartView {
            lines,
            total,
            item_count,
        })
    }
}
