//! A caching wrapper around any [`Catalog`].
//!
//! Products change rarely and every page render reads them, so production
//! wraps `PgCatalog` in a `moka` cache with a short TTL.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use shopfront_core::ProductId;

use super::{Catalog, RepositoryError};
use crate::models::product::Product;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Product(ProductId),
    AllProducts,
}

#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
}

/// Catalog decorator that caches lookups for a fixed TTL.
///
/// Only hits are cached: a product that was not found is looked up again on
/// the next request.
pub struct CachedCatalog<C> {
    inner: C,
    cache: Cache<CacheKey, CacheValue>,
}

impl<C: Catalog> CachedCatalog<C> {
    /// Wrap `inner`, keeping entries for `ttl`.
    #[must_use]
    pub fn new(inner: C, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();

        Self { inner, cache }
    }
}

#[async_trait]
impl<C: Catalog> Catalog for CachedCatalog<C> {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        if let Some(CacheValue::Products(products)) = self.cache.get(&CacheKey::AllProducts).await
        {
            debug!("catalog cache hit: all products");
            return Ok(products.as_ref().clone());
        }

        let products = self.inner.list_products().await?;
        self.cache
            .insert(
                CacheKey::AllProducts,
                CacheValue::Products(Arc::new(products.clone())),
            )
            .await;
        Ok(products)
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            debug!(product_id = %id, "catalog cache hit");
            return Ok(Some(*product));
        }

        let product = self.inner.find_product(id).await?;
        if let Some(ref product) = product {
            self.cache
                .insert(key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }
        Ok(product)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopfront_core::{CurrencyCode, Price};

    use super::*;
    use crate::db::MemoryCatalog;

    /// Shares the upstream catalog with the test so it can be edited.
    struct Upstream(Arc<MemoryCatalog>);

    #[async_trait]
    impl Catalog for Upstream {
        async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
            self.0.list_products().await
        }

        async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
            self.0.find_product(id).await
        }
    }

    fn product(id: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Price::from_minor_units(1000, CurrencyCode::USD),
            image_url: None,
        }
    }

    fn cached(
        products: impl IntoIterator<Item = Product>,
        ttl: Duration,
    ) -> (Arc<MemoryCatalog>, CachedCatalog<Upstream>) {
        let upstream = Arc::new(MemoryCatalog::new(products));
        let cached = CachedCatalog::new(Upstream(upstream.clone()), ttl);
        (upstream, cached)
    }

    #[tokio::test]
    async fn test_hit_survives_upstream_delete_until_expiry() {
        let (upstream, cached) = cached([product(1)], Duration::from_millis(100));

        assert!(cached.find_product(ProductId::new(1)).await.unwrap().is_some());
        upstream.remove(ProductId::new(1));
        assert!(cached.find_product(ProductId::new(1)).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(cached.find_product(ProductId::new(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_miss_is_not_cached() {
        let (upstream, cached) = cached(Vec::new(), Duration::from_secs(60));

        assert!(cached.find_product(ProductId::new(2)).await.unwrap().is_none());
        upstream.insert(product(2));
        assert!(cached.find_product(ProductId::new(2)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_is_cached() {
        let (upstream, cached) = cached([product(1)], Duration::from_secs(60));

        assert_eq!(cached.list_products().await.unwrap().len(), 1);
        upstream.insert(product(2));
        assert_eq!(cached.list_products().await.unwrap().len(), 1);
    }
}
