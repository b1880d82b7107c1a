//! Domain layer for the storefront.
//!
//! This crate provides:
//! - the per-session cart and the catalog lookups it depends on
//! - checkout, which turns a cart into a persisted order
//! - the order state machine with its access rules
//! - inventory deltas for orders entering or leaving Completed
//! - the notification seam used after checkout

pub mod access;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod inventory;
pub mod notification;
pub mod orders;

pub use access::{AccessControl, Capability, Principal, Role, ensure_can_edit};
pub use cart::{CART_SESSION_KEY, Cart, CartItem, CartStore, CartSummary};
pub use catalog::{CatalogProduct, CatalogReader, StoreCatalog};
pub use checkout::{CheckoutForm, CheckoutProcessor, CheckoutReceipt, ValidCheckout};
pub use error::{DomainError, FieldError, FieldErrors};
pub use inventory::{InventoryAdjustment, apply_completion, revert_completion, stock_adjustments};
pub use notification::{
    InMemoryNotifier, LogNotifier, NotificationError, NotificationSettings, Notifier, SentMessage,
};
pub use orders::{EditableOrder, OrderService, StatusChange};
