//! Session cart endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Extension, Json};
use common::ProductId;
use domain::{Cart, CartItem, CartSummary};
use serde::{Deserialize, Serialize};
use store::{SessionId, Store};

use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartItemResponse {
    pub product_id: i64,
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
    pub image_url: Option<String>,
}

impl From<&CartItem> for CartItemResponse {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.as_i64(),
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
            subtotal_cents: item.subtotal().cents(),
            image_url: item.image_url.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    pub total_cents: i64,
    pub total: String,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().iter().map(CartItemResponse::from).collect(),
            total_cents: cart.total().cents(),
            total: cart.total().to_string(),
        }
    }
}

/// Returned after a cart mutation so the page can update in place.
#[derive(Serialize)]
pub struct CartUpdateResponse {
    pub items: Vec<CartItemResponse>,
    pub total_cents: i64,
    pub line_subtotal_cents: Option<i64>,
    pub removed: bool,
}

impl From<CartSummary> for CartUpdateResponse {
    fn from(summary: CartSummary) -> Self {
        Self {
            items: summary.items.iter().map(CartItemResponse::from).collect(),
            total_cents: summary.total.cents(),
            line_subtotal_cents: summary.line_subtotal.map(|m| m.cents()),
            removed: summary.removed,
        }
    }
}

// -- Handlers --

/// GET /cart: The current session's cart.
#[tracing::instrument(skip(state))]
pub async fn view<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(session): Extension<SessionId>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.get(&session).await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// POST /cart/items/{product_id}: Add one unit of a product.
#[tracing::instrument(skip(state))]
pub async fn add<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(session): Extension<SessionId>,
    Path(product_id): Path<i64>,
) -> Result<Json<CartUpdateResponse>, ApiError> {
    let summary = state
        .carts
        .add(&session, ProductId::new(product_id))
        .await?;
    Ok(Json(summary.into()))
}

/// PUT /cart/items/{product_id}: Overwrite a line's quantity.
#[tracing::instrument(skip(state, req))]
pub async fn set_quantity<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(session): Extension<SessionId>,
    Path(product_id): Path<i64>,
    Json(req): Json<SetQuantityRequest>,
) -> Result<Json<CartUpdateResponse>, ApiError> {
    let summary = state
        .carts
        .set_quantity(&session, ProductId::new(product_id), req.quantity)
        .await?;
    Ok(Json(summary.into()))
}

/// DELETE /cart/items/{product_id}: Drop a line.
#[tracing::instrument(skip(state))]
pub async fn remove<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(session): Extension<SessionId>,
    Path(product_id): Path<i64>,
) -> Result<Json<CartUpdateResponse>, ApiError> {
    let summary = state
        .carts
        .remove(&session, ProductId::new(product_id))
        .await?;
    Ok(Json(summary.into()))
}
