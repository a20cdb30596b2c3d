//! In-process stores for tests and database-free demos.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use shopfront_core::{ProductId, UserId, Username};

use super::{Catalog, RepositoryError, UserStore};
use crate::models::product::Product;
use crate::models::user::{User, UserCredentials};

/// A catalog held in memory.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: RwLock<BTreeMap<ProductId, Product>>,
}

impl MemoryCatalog {
    /// Create a catalog holding `products`.
    #[must_use]
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: RwLock::new(products.into_iter().map(|p| (p.id, p)).collect()),
        }
    }

    /// Add or replace a product.
    pub fn insert(&self, product: Product) {
        self.products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(product.id, product);
    }

    /// Delete a product, returning it if it existed.
    pub fn remove(&self, id: ProductId) -> Option<Product> {
        self.products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self
            .products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned())
    }
}

#[derive(Debug, Default)]
struct UserTable {
    next_id: i32,
    rows: HashMap<Username, UserCredentials>,
}

/// Accounts held in memory.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    table: RwLock<UserTable>,
}

impl MemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .len()
    }

    /// Whether no accounts are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        Ok(self
            .table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .get(username)
            .cloned())
    }

    async fn create(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);

        if table.rows.contains_key(username) {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }

        table.next_id += 1;
        let user = User {
            id: UserId::new(table.next_id),
            username: username.clone(),
            created_at: Utc::now(),
        };
        table.rows.insert(
            username.clone(),
            UserCredentials {
                user: user.clone(),
                password_hash: password_hash.to_owned(),
            },
        );

        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopfront_core::{CurrencyCode, Price};

    use super::*;

    fn product(id: i32, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Price::from_minor_units(cents, CurrencyCode::USD),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_catalog_lists_in_id_order() {
        let catalog = MemoryCatalog::new([product(3, 500), product(1, 1000)]);
        let ids: Vec<_> = catalog
            .list_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id.as_i32())
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_catalog_remove() {
        let catalog = MemoryCatalog::new([product(1, 1000)]);
        assert!(catalog.remove(ProductId::new(1)).is_some());
        assert!(
            catalog
                .find_product(ProductId::new(1))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_user_create_conflict() {
        let store = MemoryUserStore::new();
        let name = Username::parse("demo").unwrap();

        let user = store.create(&name, "hash-1").await.unwrap();
        assert_eq!(user.id, UserId::new(1));

        let err = store.create(&name, "hash-2").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let creds = store.find_credentials(&name).await.unwrap().unwrap();
        assert_eq!(creds.password_hash, "hash-1");
        assert_eq!(store.len(), 1);
    }
}
