//! The session-scoped shopping cart.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use shopfront_core::ProductId;

/// Product quantities held in one visitor's session.
///
/// A product that is not in the map has quantity zero; a zero entry can't be
/// represented, and a stored cart containing one fails to deserialize.
///
/// On the wire this is a JSON object from product-id string to a positive
/// integer, e.g. `{"1": 2, "3": 1}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: BTreeMap<ProductId, NonZeroU32>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    /// Quantity of `product`, zero when absent.
    #[must_use]
    pub fn quantity(&self, product: ProductId) -> u32 {
        self.items.get(&product).map_or(0, |q| q.get())
    }

    /// Increase the quantity of `product` by one.
    pub fn increment(&mut self, product: ProductId) {
        self.items
            .entry(product)
            .and_modify(|q| *q = q.saturating_add(1))
            .or_insert(NonZeroU32::MIN);
    }

    /// Decrease the quantity of `product` by one, dropping the entry when it
    /// reaches zero.
    ///
    /// Returns `false` when the product was not in the cart.
    pub fn decrement(&mut self, product: ProductId) -> bool {
        let Some(current) = self.items.get(&product).copied() else {
            return false;
        };

        match NonZeroU32::new(current.get() - 1) {
            Some(next) => {
                self.items.insert(product, next);
            }
            None => {
                self.items.remove(&product);
            }
        }
        true
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total number of units across all products.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.values().map(|q| u64::from(q.get())).sum()
    }

    /// Entries ordered by product id.
    pub fn iter(&self) -> impl Iterator<Item = (ProductId, NonZeroU32)> + '_ {
        self.items.iter().map(|(id, q)| (*id, *q))
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
