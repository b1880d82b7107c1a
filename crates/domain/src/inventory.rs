//! Stock adjustments driven by order status changes.
//!
//! Only crossing the Completed boundary touches stock: entering Completed
//! deducts each line's quantity, leaving it puts the quantity back.

use std::collections::BTreeMap;

use common::{OrderStatus, ProductId};
use serde::Serialize;
use store::{OrderDetail, StockDelta};

/// What a status change does to stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InventoryAdjustment {
    None,
    Deduct,
    Restore,
}

impl InventoryAdjustment {
    /// Classifies a transition from `old` to `new`.
    pub fn for_transition(old: OrderStatus, new: OrderStatus) -> Self {
        match (old.is_completed(), new.is_completed()) {
            (false, true) => InventoryAdjustment::Deduct,
            (true, false) => InventoryAdjustment::Restore,
            _ => InventoryAdjustment::None,
        }
    }
}

/// Deltas removing every line's quantity from stock.
pub fn apply_completion(details: &[OrderDetail]) -> Vec<StockDelta> {
    merged_deltas(details, -1)
}

/// Deltas returning every line's quantity to stock.
pub fn revert_completion(details: &[OrderDetail]) -> Vec<StockDelta> {
    merged_deltas(details, 1)
}

/// Stock deltas for moving an order with `details` from `old` to `new`.
pub fn stock_adjustments(
    old: OrderStatus,
    new: OrderStatus,
    details: &[OrderDetail],
) -> Vec<StockDelta> {
    match InventoryAdjustment::for_transition(old, new) {
        InventoryAdjustment::Deduct => apply_completion(details),
        InventoryAdjustment::Restore => revert_completion(details),
        InventoryAdjustment::None => Vec::new(),
    }
}

fn merged_deltas(details: &[OrderDetail], sign: i64) -> Vec<StockDelta> {
    let mut by_product: BTreeMap<ProductId, i64> = BTreeMap::new();
    for detail in details {
        *by_product.entry(detail.product_id).or_default() += sign * i64::from(detail.quantity);
    }

    by_product
        .into_iter()
        .map(|(product_id, delta)| StockDelta { product_id, delta })
        .collect()
}
