//! Checkout endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use domain::CheckoutForm;
use serde::Serialize;
use store::{SessionId, Store};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ReceiptResponse {
    pub order_id: i64,
    pub total_cents: i64,
    pub total: String,
    pub location: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub order_id: i64,
    pub message: &'static str,
}

/// GET /checkout: A blank form, or back to the cart when it is empty.
#[tracing::instrument(skip(state))]
pub async fn form<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(session): Extension<SessionId>,
) -> Result<Json<CheckoutForm>, ApiError> {
    let form = state
        .checkout
        .render_form(&session)
        .await
        .map_err(|e| ApiError::from(e).empty_cart_to("/cart"))?;
    Ok(Json(form))
}

/// POST /checkout: Place the order.
#[tracing::instrument(skip(state, form))]
pub async fn submit<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(session): Extension<SessionId>,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, Json<ReceiptResponse>), ApiError> {
    let receipt = state
        .checkout
        .submit(&session, &form)
        .await
        .map_err(|e| ApiError::from(e).empty_cart_to("/products"))?;

    let order_id = receipt.order_id.as_i64();
    Ok((
        StatusCode::CREATED,
        Json(ReceiptResponse {
            order_id,
            total_cents: receipt.total.cents(),
            total: receipt.total.to_string(),
            location: format!("/checkout/success/{order_id}"),
        }),
    ))
}

/// GET /checkout/success/{id}: Thank-you page.
pub async fn success(Path(id): Path<i64>) -> Json<SuccessResponse> {
    Json(SuccessResponse {
        order_id: id,
        message: "Thank you! We will contact you soon to arrange delivery.",
    })
}
