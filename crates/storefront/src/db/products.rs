//! `PostgreSQL` product catalog.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use shopfront_core::{CurrencyCode, Price, ProductId};

use super::{Catalog, RepositoryError};
use crate::models::product::{NewProduct, Product};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    image_url: Option<String>,
}

impl ProductRow {
    fn into_product(self, currency: CurrencyCode) -> Product {
        Product {
            id: ProductId::new(self.id),
            name: self.name,
            description: self.description,
            price: Price::new(self.price, currency),
            image_url: self.image_url,
        }
    }
}

/// Catalog backed by the `storefront.product` table.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
    currency: CurrencyCode,
}

impl PgCatalog {
    /// Create a catalog reading prices in `currency`.
    #[must_use]
    pub const fn new(pool: PgPool, currency: CurrencyCode) -> Self {
        Self { pool, currency }
    }

    /// Replace the whole catalog in one transaction.
    ///
    /// Used by the seeding command; the web app never writes products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails, in which
    /// case the previous catalog is left untouched.
    pub async fn replace_all(&self, products: &[NewProduct]) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM storefront.product")
            .execute(&mut *tx)
            .await?;

        for product in products {
            insert_product(&mut tx, product).await?;
        }

        tx.commit().await?;
        Ok(products.len())
    }

    /// Append products to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an insert fails.
    pub async fn insert_all(&self, products: &[NewProduct]) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for product in products {
            insert_product(&mut tx, product).await?;
        }
        tx.commit().await?;
        Ok(products.len())
    }
}

async fn insert_product(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product: &NewProduct,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO storefront.product (name, description, price, image_url)
        VALUES ($1, $2, $3, $4)
        ",
    )
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.image_url.as_deref())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl Catalog for PgCatalog {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, image_url
            FROM storefront.product
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_product(self.currency))
            .collect())
    }

    #[instrument(skip(self))]
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, image_url
            FROM storefront.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.into_product(self.currency)))
    }
}
