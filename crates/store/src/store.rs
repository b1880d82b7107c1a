use async_trait::async_trait;

use crate::{
    Category, CategoryId, NewOrder, NewProduct, Order, OrderFilter, OrderId, Product, ProductId,
    Result, StatusUpdate, StoreError,
};

/// Core trait for store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a category.
    async fn insert_category(&self, name: &str) -> Result<Category>;

    /// Retrieves a category. Returns None if it doesn't exist.
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Inserts a product.
    async fn insert_product(&self, product: NewProduct) -> Result<Product>;

    /// Deletes a product. Order lines referencing it are kept.
    async fn delete_product(&self, id: ProductId) -> Result<()>;

    /// Retrieves a product. Returns None if it doesn't exist.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Lists all products ordered by id.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Inserts an order together with its lines.
    ///
    /// The order and all of its lines are written atomically - either the
    /// whole aggregate becomes visible or nothing does. The new order is
    /// Pending at version 1.
    async fn insert_order(&self, order: NewOrder) -> Result<Order>;

    /// Retrieves an order with its lines in insertion order.
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists orders matching `filter`, newest first.
    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>>;

    /// Deletes an order and its lines.
    async fn delete_order(&self, id: OrderId) -> Result<()>;

    /// Writes a new status and applies its stock deltas in one transaction.
    ///
    /// Fails with `ConcurrencyConflict` if the order no longer exists or its
    /// version differs from `update.expected_version`; nothing is written in
    /// that case. Deltas for products that are gone or do not track stock are
    /// skipped.
    async fn update_order_status(&self, update: StatusUpdate) -> Result<Order>;
}

/// Extension trait providing convenience methods for stores.
#[async_trait]
pub trait StoreExt: Store {
    /// Loads an order, failing with `OrderNotFound` if it doesn't exist.
    async fn get_order(&self, id: OrderId) -> Result<Order> {
        self.find_order(id)
            .await?
            .ok_or(StoreError::OrderNotFound(id))
    }

    /// Loads a product, failing with `ProductNotFound` if it doesn't exist.
    async fn get_product(&self, id: ProductId) -> Result<Product> {
        self.find_product(id)
            .await?
            .ok_or(StoreError::ProductNotFound(id))
    }
}

// Blanket implementation for all Store implementations
impl<T: Store + ?Sized> StoreExt for T {}

/// Validates an order before inserting it.
pub fn validate_new_order(order: &NewOrder) -> Result<()> {
    if order.details.is_empty() {
        return Err(StoreError::InvalidOrder(
            "Cannot insert an order without lines".to_string(),
        ));
    }

    if let Some(line) = order.details.iter().find(|line| line.quantity == 0) {
        return Err(StoreError::InvalidOrder(format!(
            "Line for product {} has zero quantity",
            line.product_id
        )));
    }

    let lines_total = order.details.iter().map(|line| line.subtotal()).sum();
    if order.total != lines_total {
        return Err(StoreError::InvalidOrder(format!(
            "Order total {} does not match line total {}",
            order.total, lines_total
        )));
    }

    Ok(())
}
