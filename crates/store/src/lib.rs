//! Persistence for the storefront: products, orders and session state.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod session;
pub mod store;

pub use common::{CategoryId, Money, OrderDetailId, OrderId, OrderStatus, ProductId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{
    Category, NewOrder, NewOrderDetail, NewProduct, Order, OrderDetail, OrderFilter, Product,
    StatusUpdate, StockDelta, Version,
};
pub use postgres::PostgresStore;
pub use session::{InMemorySessionStore, SessionId, SessionStore};
pub use store::{Store, StoreExt};
