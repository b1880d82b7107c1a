//! Public product catalog.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use domain::{CatalogProduct, CatalogReader};
use serde::Serialize;
use store::Store;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub price_cents: i64,
    pub price: String,
    pub image_url: Option<String>,
    pub stock: Option<i64>,
}

impl From<CatalogProduct> for ProductResponse {
    fn from(product: CatalogProduct) -> Self {
        Self {
            id: product.id.as_i64(),
            name: product.name,
            price_cents: product.price.cents(),
            price: product.price.to_string(),
            image_url: product.image_url,
            stock: product.stock,
        }
    }
}

/// GET /products: List every product.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.list_products().await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// GET /products/{id}: A single product.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.catalog.find_product(ProductId::new(id)).await?;
    Ok(Json(product.into()))
}
