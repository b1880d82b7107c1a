//! Back-office order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::FixedOffset;
use common::{OrderId, OrderStatus};
use domain::access::ensure_can_manage_orders;
use domain::EditableOrder;
use serde::{Deserialize, Serialize};
use store::{Order, OrderDetail, OrderFilter, Store, Version};

use crate::error::ApiError;
use crate::session::Staff;
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// `active`, `all`, or a status name.
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
    pub version: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub order_date: String,
    pub requested_delivery_date: String,
    pub notes: Option<String>,
    pub status: &'static str,
    pub total_cents: i64,
    pub version: i64,
    pub details: Vec<OrderDetailResponse>,
}

#[derive(Serialize)]
pub struct OrderDetailResponse {
    pub product_id: i64,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl From<&OrderDetail> for OrderDetailResponse {
    fn from(detail: &OrderDetail) -> Self {
        Self {
            product_id: detail.product_id.as_i64(),
            quantity: detail.quantity,
            unit_price_cents: detail.unit_price.cents(),
            subtotal_cents: detail.subtotal().cents(),
        }
    }
}

impl OrderResponse {
    /// Builds the response with `order_date` shown in `offset`.
    pub fn new(order: Order, offset: FixedOffset) -> Self {
        Self {
            id: order.id.as_i64(),
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            customer_phone: order.customer_phone,
            order_date: order.order_date.with_timezone(&offset).to_rfc3339(),
            requested_delivery_date: order.requested_delivery_date.format("%Y-%m-%d").to_string(),
            notes: order.notes,
            status: order.status.as_str(),
            total_cents: order.total.cents(),
            version: order.version.as_i64(),
            details: order.details.iter().map(OrderDetailResponse::from).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct EditOrderResponse {
    pub order: OrderResponse,
    pub statuses: Vec<&'static str>,
}

impl EditOrderResponse {
    fn new(editable: EditableOrder, offset: FixedOffset) -> Self {
        Self {
            order: OrderResponse::new(editable.order, offset),
            statuses: editable.statuses.iter().map(OrderStatus::as_str).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct StatusChangeResponse {
    pub order: OrderResponse,
    pub previous_status: &'static str,
    pub changed: bool,
}

// -- Handlers --

/// GET /orders: List orders, optionally filtered.
#[tracing::instrument(skip(state, staff))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Staff(staff): Staff,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    ensure_can_manage_orders(&staff)?;
    let filter = parse_filter(query.filter.as_deref())?;

    let orders = state.orders.list(filter).await?;
    let offset = state.display_offset;
    Ok(Json(
        orders
            .into_iter()
            .map(|order| OrderResponse::new(order, offset))
            .collect(),
    ))
}

/// GET /orders/{id}: A single order with its lines.
#[tracing::instrument(skip(state, staff))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Staff(staff): Staff,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    ensure_can_manage_orders(&staff)?;
    let order = state.orders.get(OrderId::new(id)).await?;
    Ok(Json(OrderResponse::new(order, state.display_offset)))
}

/// GET /orders/{id}/edit: Open an order for a status change.
#[tracing::instrument(skip(state, staff))]
pub async fn edit<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Staff(staff): Staff,
    Path(id): Path<i64>,
) -> Result<Json<EditOrderResponse>, ApiError> {
    let editable = state.orders.edit(OrderId::new(id), &staff).await?;
    Ok(Json(EditOrderResponse::new(editable, state.display_offset)))
}

/// PUT /orders/{id}/status: Move an order to a new status.
#[tracing::instrument(skip(state, staff, req))]
pub async fn change_status<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Staff(staff): Staff,
    Path(id): Path<i64>,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<Json<StatusChangeResponse>, ApiError> {
    let status: OrderStatus = req
        .status
        .parse()
        .map_err(|e: common::ParseOrderStatusError| ApiError::BadRequest(e.to_string()))?;

    let change = state
        .orders
        .change_status(OrderId::new(id), Version::new(req.version), status, &staff)
        .await?;
    tracing::debug!(user = %staff.email, changed = change.changed, "status request handled");

    Ok(Json(StatusChangeResponse {
        previous_status: change.previous.as_str(),
        changed: change.changed,
        order: OrderResponse::new(change.order, state.display_offset),
    }))
}

fn parse_filter(raw: Option<&str>) -> Result<OrderFilter, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(OrderFilter::All),
        Some(f) if f.eq_ignore_ascii_case("all") => Ok(OrderFilter::All),
        Some(f) if f.eq_ignore_ascii_case("active") => Ok(OrderFilter::Active),
        Some(f) => f
            .parse()
            .map(OrderFilter::Status)
            .map_err(|_| ApiError::BadRequest(format!("Unknown filter: {f}"))),
    }
}
