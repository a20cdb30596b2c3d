//! Catalog product types.

use rust_decimal::Decimal;
use serde::Deserialize;

use shopfront_core::{Price, ProductId};

/// A purchasable product as seen by the storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Catalog ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long-form description (may be empty).
    pub description: String,
    /// Current unit price.
    pub price: Price,
    /// Optional product image.
    pub image_url: Option<String>,
}

/// A product to be inserted into the catalog, as read from a seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    /// Display name.
    pub name: String,
    /// Long-form description.
    #[serde(default)]
    pub description: String,
    /// Unit price in the store currency.
    pub price: Decimal,
    /// Optional product image.
    #[serde(default)]
    pub image_url: Option<String>,
}
