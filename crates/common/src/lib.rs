//! Shared types for the storefront workspace.

pub mod ids;
pub mod money;
pub mod status;

pub use ids::{CategoryId, OrderDetailId, OrderId, ProductId};
pub use money::Money;
pub use status::{OrderStatus, ParseOrderStatusError};
