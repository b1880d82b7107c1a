//! Back-office order management.
//!
//! Orders move Pending -> InProduction -> ReadyForPickup -> Completed or
//! Cancelled. Staff may set any status, but Completed and Cancelled orders
//! can only be reopened or changed by an administrator.

use std::sync::Arc;

use common::{OrderId, OrderStatus};
use serde::Serialize;
use store::{Order, OrderFilter, StatusUpdate, Store, Version};

use crate::access::{AccessControl, ensure_can_edit, ensure_can_manage_orders};
use crate::error::DomainError;
use crate::inventory::{InventoryAdjustment, stock_adjustments};

/// Outcome of [`OrderService::change_status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub order: Order,
    pub previous: OrderStatus,
    /// False when the order already had the requested status.
    pub changed: bool,
    pub adjustment: InventoryAdjustment,
}

/// An order opened for editing along with the statuses it can move to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditableOrder {
    pub order: Order,
    pub statuses: Vec<OrderStatus>,
}

/// Service for reading and transitioning orders.
pub struct OrderService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Loads an order with its lines.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.store
            .find_order(order_id)
            .await?
            .ok_or_else(|| DomainError::order_not_found(order_id))
    }

    /// Lists orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.list_orders(filter).await?)
    }

    /// Opens an order for editing if the principal is allowed to change it.
    #[tracing::instrument(skip(self, access))]
    pub async fn edit(
        &self,
        order_id: OrderId,
        access: &dyn AccessControl,
    ) -> Result<EditableOrder, DomainError> {
        ensure_can_manage_orders(access)?;
        let order = self.get(order_id).await?;
        ensure_can_edit(access, order.status)?;

        Ok(EditableOrder {
            order,
            statuses: OrderStatus::ALL.to_vec(),
        })
    }

    /// Moves an order to `new_status`, adjusting stock when the order enters
    /// or leaves Completed.
    ///
    /// `expected_version` is the version the caller last saw. If the order
    /// has moved on, or was deleted, nothing is written and
    /// `ConcurrencyConflict` is returned.
    #[tracing::instrument(skip(self, access))]
    pub async fn change_status(
        &self,
        order_id: OrderId,
        expected_version: Version,
        new_status: OrderStatus,
        access: &dyn AccessControl,
    ) -> Result<StatusChange, DomainError> {
        ensure_can_manage_orders(access)?;

        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or(DomainError::ConcurrencyConflict { order_id })?;

        if order.version != expected_version {
            return Err(DomainError::ConcurrencyConflict { order_id });
        }

        // Re-checked against the current row, not the one shown on the form.
        ensure_can_edit(access, order.status)?;

        let previous = order.status;
        if previous == new_status {
            return Ok(StatusChange {
                order,
                previous,
                changed: false,
                adjustment: InventoryAdjustment::None,
            });
        }

        let adjustment = InventoryAdjustment::for_transition(previous, new_status);
        let stock_deltas = stock_adjustments(previous, new_status, &order.details);

        let order = self
            .store
            .update_order_status(StatusUpdate {
                order_id,
                expected_version,
                status: new_status,
                stock_deltas,
            })
            .await?;

        metrics::counter!(
            "order_status_changes_total",
            "from" => previous.as_str(),
            "to" => new_status.as_str()
        )
        .increment(1);
        tracing::info!(%order_id, from = %previous, to = %new_status, ?adjustment, "order status changed");

        Ok(StatusChange {
            order,
            previous,
            changed: true,
            adjustment,
        })
    }
}

impl<S: Store> Clone for OrderService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}
