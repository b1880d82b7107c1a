//! Domain error types.

use common::OrderId;
use serde::Serialize;
use store::StoreError;
use thiserror::Error;

/// A validation message attached to one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field that failed validation, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Returns the message for `field`, if it failed.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<_> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The referenced order or product does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Submitted input was rejected.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// The acting principal may not perform the operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The order changed since it was read.
    #[error("Order {order_id} has changed or no longer exists; reload it and try again")]
    ConcurrencyConflict { order_id: OrderId },

    /// Checkout was attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    pub fn order_not_found(id: OrderId) -> Self {
        DomainError::NotFound {
            entity: "Order",
            id: id.to_string(),
        }
    }

    pub fn product_not_found(id: common::ProductId) -> Self {
        DomainError::NotFound {
            entity: "Product",
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConcurrencyConflict { order_id, .. } => {
                DomainError::ConcurrencyConflict { order_id }
            }
            StoreError::OrderNotFound(id) => DomainError::order_not_found(id),
            StoreError::ProductNotFound(id) => DomainError::product_not_found(id),
            other => DomainError::Store(other),
        }
    }
}
