//! Integration tests for parallel requests sharing one session.
//!
//! Each spawned request is a separate tab of the same visitor. Every cart
//! mutation must survive, and a failed mutation must not leave a partial
//! write behind.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::http::StatusCode;
use tokio::task::JoinSet;

use shopfront_core::ProductId;
use shopfront_integration_tests::{TestContext, demo_products};
use shopfront_storefront::db::{Catalog, MemoryCatalog, RepositoryError};
use shopfront_storefront::models::Product;

const TABS: u32 = 20;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_adds_are_all_counted() {
    let ctx = TestContext::new();
    let client = ctx.client();

    // Establish the session before fanning out.
    client.post("/cart/add/1").await.assert_redirect("/cart");

    let mut tabs = JoinSet::new();
    for _ in 0..TABS {
        let tab = client.clone();
        tabs.spawn(async move { tab.post("/cart/add/1").await.status });
    }
    while let Some(status) = tabs.join_next().await {
        assert_eq!(status.unwrap(), StatusCode::SEE_OTHER);
    }

    let cart = client.get("/cart").await;
    assert_eq!(cart.quantity_of(1), Some(TABS + 1));
    assert_eq!(cart.cart_count(), u64::from(TABS + 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_mixed_mutations_converge() {
    let ctx = TestContext::new();
    let client = ctx.client();

    for _ in 0..5 {
        client.post("/cart/add/2").await;
    }

    let mut tabs = JoinSet::new();
    for i in 0..TABS {
        let tab = client.clone();
        let path = match i % 4 {
            0 => "/cart/add/3",
            1 => "/cart/add/4",
            2 => "/cart/remove/2",
            _ => "/cart/add/2",
        };
        tabs.spawn(async move { tab.post(path).await.status });
    }
    while let Some(status) = tabs.join_next().await {
        assert_eq!(status.unwrap(), StatusCode::SEE_OTHER);
    }

    // 5 units of product 2, then 5 removals and 5 additions.
    let cart = client.get("/cart").await;
    assert_eq!(cart.quantity_of(2), Some(5));
    assert_eq!(cart.quantity_of(3), Some(5));
    assert_eq!(cart.quantity_of(4), Some(5));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_visitors_do_not_block_each_other() {
    let ctx = TestContext::new();
    let visitors: Vec<_> = (0..8).map(|_| ctx.client()).collect();

    let mut tabs = JoinSet::new();
    for visitor in &visitors {
        for _ in 0..3 {
            let tab = visitor.clone();
            tabs.spawn(async move { tab.post("/cart/add/4").await.status });
        }
    }
    while let Some(status) = tabs.join_next().await {
        assert_eq!(status.unwrap(), StatusCode::SEE_OTHER);
    }

    for visitor in &visitors {
        let quantity = visitor.get("/cart").await.quantity_of(4).unwrap_or(0);
        assert!((1..=3).contains(&quantity), "got {quantity}");
    }
}

/// A catalog whose lookups can be switched to fail.
struct FlakyCatalog {
    inner: MemoryCatalog,
    failing: AtomicBool,
}

#[async_trait]
impl Catalog for FlakyCatalog {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        self.inner.list_products().await
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::DataCorruption("catalog offline".to_string()));
        }
        self.inner.find_product(id).await
    }
}

#[tokio::test]
async fn test_failed_lookup_leaves_cart_unchanged() {
    let catalog = Arc::new(FlakyCatalog {
        inner: MemoryCatalog::new(demo_products()),
        failing: AtomicBool::new(false),
    });
    let ctx = TestContext::with_catalog(catalog.clone());
    let client = ctx.client();

    client.post("/cart/add/1").await.assert_redirect("/cart");

    catalog.failing.store(true, Ordering::SeqCst);
    let resp = client.post("/cart/add/1").await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    let resp = client.post("/cart/add/2").await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    catalog.failing.store(false, Ordering::SeqCst);

    let cart = client.get("/cart").await;
    assert_eq!(cart.quantity_of(1), Some(1));
    assert_eq!(cart.quantity_of(2), None);
}
