//! Read-only view of the product catalog.

use std::sync::Arc;

use async_trait::async_trait;
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};
use store::{Product, Store};

use crate::error::DomainError;

/// The fields of a product the storefront needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub stock: Option<i64>,
}

impl From<Product> for CatalogProduct {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            image_url: product.image_url,
            stock: product.stock,
        }
    }
}

/// Looks up products by id.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Returns the product or `NotFound`.
    async fn find_product(&self, id: ProductId) -> Result<CatalogProduct, DomainError>;

    async fn list_products(&self) -> Result<Vec<CatalogProduct>, DomainError>;
}

/// Catalog backed by a [`Store`].
pub struct StoreCatalog<S: Store> {
    store: Arc<S>,
}

impl<S: Store> StoreCatalog<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: Store> Clone for StoreCatalog<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

#[async_trait]
impl<S: Store> CatalogReader for StoreCatalog<S> {
    async fn find_product(&self, id: ProductId) -> Result<CatalogProduct, DomainError> {
        self.store
            .find_product(id)
            .await?
            .map(CatalogProduct::from)
            .ok_or_else(|| DomainError::product_not_found(id))
    }

    async fn list_products(&self) -> Result<Vec<CatalogProduct>, DomainError> {
        let products = self.store.list_products().await?;
        Ok(products.into_iter().map(CatalogProduct::from).collect())
    }
}
