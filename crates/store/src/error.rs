use thiserror::Error;

use crate::{OrderId, ProductId, Version};

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order changed (or disappeared) since the caller read it.
    #[error(
        "Concurrency conflict for order {order_id}: expected version {expected}, found {}",
        describe_version(.actual)
    )]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: Version,
        actual: Option<Version>,
    },

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order was rejected before reaching storage.
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// A stored row could not be mapped back to the model.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn describe_version(version: &Option<Version>) -> String {
    match version {
        Some(v) => format!("version {v}"),
        None => "no row".to_string(),
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
