use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    Category, CategoryId, NewOrder, NewProduct, Order, OrderDetailId, OrderFilter, OrderId,
    Product, ProductId, Result, StatusUpdate, StoreError,
    store::{Store, validate_new_order},
};

#[derive(Debug, Default)]
struct State {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    last_category_id: i64,
    last_product_id: i64,
    last_order_id: i64,
    last_detail_id: i64,
}

/// In-memory store implementation for tests and local runs.
///
/// All tables sit behind one lock, so a status write and its stock deltas
/// are never observed half-applied.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears all rows. Id sequences keep counting.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.categories.clear();
        state.products.clear();
        state.orders.clear();
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_category(&self, name: &str) -> Result<Category> {
        let mut state = self.state.write().await;
        state.last_category_id += 1;
        let category = Category {
            id: CategoryId::new(state.last_category_id),
            name: name.to_string(),
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let mut state = self.state.write().await;
        state.last_product_id += 1;
        let product = Product {
            id: ProductId::new(state.last_product_id),
            name: product.name,
            price: product.price,
            image_url: product.image_url,
            stock: product.stock,
            category_id: product.category_id,
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::ProductNotFound(id))
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(self.state.read().await.products.values().cloned().collect())
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        validate_new_order(&order)?;

        let mut state = self.state.write().await;
        state.last_order_id += 1;
        let order_id = OrderId::new(state.last_order_id);

        let mut detail_ids = Vec::with_capacity(order.details.len());
        for _ in &order.details {
            state.last_detail_id += 1;
            detail_ids.push(OrderDetailId::new(state.last_detail_id));
        }

        let order = order.into_order(order_id, &detail_ids);
        state.orders.insert(order_id, order.clone());
        Ok(order)
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| filter.matches(o.status))
            .cloned()
            .collect();

        // Newest first, ties broken by id
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .orders
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::OrderNotFound(id))
    }

    async fn update_order_status(&self, update: StatusUpdate) -> Result<Order> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let order = state
            .orders
            .get_mut(&update.order_id)
            .ok_or(StoreError::ConcurrencyConflict {
                order_id: update.order_id,
                expected: update.expected_version,
                actual: None,
            })?;

        if order.version != update.expected_version {
            return Err(StoreError::ConcurrencyConflict {
                order_id: update.order_id,
                expected: update.expected_version,
                actual: Some(order.version),
            });
        }

        order.status = update.status;
        order.version = order.version.next();

        for delta in &update.stock_deltas {
            let applied = state
                .products
                .get_mut(&delta.product_id)
                .is_some_and(|product| product.apply_stock_delta(delta.delta));
            if !applied {
                tracing::debug!(
                    product_id = %delta.product_id,
                    "skipping stock delta for missing or untracked product"
                );
            }
        }

        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::{Money, NewOrderDetail, OrderStatus, StockDelta, Version};

    fn new_order(lines: &[(ProductId, u32, i64)]) -> NewOrder {
        let details: Vec<_> = lines
            .iter()
            .map(|(product_id, quantity, price)| NewOrderDetail {
                product_id: *product_id,
                quantity: *quantity,
                unit_price: Money::from_cents(*price),
            })
            .collect();
        NewOrder {
            customer_email: "cliente@example.com".to_string(),
            customer_name: "Cliente".to_string(),
            customer_phone: "8888-8888".to_string(),
            order_date: Utc::now(),
            requested_delivery_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            notes: None,
            total: details.iter().map(|d| d.subtotal()).sum(),
            details,
        }
    }

    #[tokio::test]
    async fn insert_order_assigns_ids_and_pending_status() {
        let store = InMemoryStore::new();
        let order = store
            .insert_order(new_order(&[(ProductId::new(1), 2, 37000)]))
            .await
            .unwrap();

        assert_eq!(order.id, OrderId::new(1));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.version, Version::first());
        assert_eq!(order.total, Money::from_cents(74000));
        assert_eq!(order.details.len(), 1);
        assert_eq!(order.details[0].order_id, order.id);

        let found = store.find_order(order.id).await.unwrap();
        assert_eq!(found, Some(order));
    }

    #[tokio::test]
    async fn invalid_order_is_not_stored() {
        let store = InMemoryStore::new();
        let result = store.insert_order(new_order(&[])).await;
        assert!(matches!(result, Err(StoreError::InvalidOrder(_))));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn status_update_applies_stock_deltas() {
        let store = InMemoryStore::new();
        let product = store
            .insert_product(NewProduct::new("Pan", Money::from_cents(1000)).with_stock(10))
            .await
            .unwrap();
        let order = store
            .insert_order(new_order(&[(product.id, 3, 1000)]))
            .await
            .unwrap();

        let updated = store
            .update_order_status(StatusUpdate {
                order_id: order.id,
                expected_version: order.version,
                status: OrderStatus::Completed,
                stock_deltas: vec![StockDelta {
                    product_id: product.id,
                    delta: -3,
                }],
            })
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Completed);
        assert_eq!(updated.version, Version::new(2));
        let product = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, Some(7));
    }

    #[tokio::test]
    async fn status_update_with_stale_version_conflicts() {
        let store = InMemoryStore::new();
        let product = store
            .insert_product(NewProduct::new("Pan", Money::from_cents(1000)).with_stock(10))
            .await
            .unwrap();
        let order = store
            .insert_order(new_order(&[(product.id, 3, 1000)]))
            .await
            .unwrap();

        store
            .update_order_status(StatusUpdate {
                order_id: order.id,
                expected_version: order.version,
                status: OrderStatus::InProduction,
                stock_deltas: vec![],
            })
            .await
            .unwrap();

        let result = store
            .update_order_status(StatusUpdate {
                order_id: order.id,
                expected_version: order.version,
                status: OrderStatus::Completed,
                stock_deltas: vec![StockDelta {
                    product_id: product.id,
                    delta: -3,
                }],
            })
            .await;

        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict {
                actual: Some(_),
                ..
            })
        ));
        let product = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, Some(10));
        let order = store.find_order(order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::InProduction);
    }

    #[tokio::test]
    async fn status_update_on_deleted_order_conflicts() {
        let store = InMemoryStore::new();
        let order = store
            .insert_order(new_order(&[(ProductId::new(9), 1, 100)]))
            .await
            .unwrap();
        store.delete_order(order.id).await.unwrap();

        let result = store
            .update_order_status(StatusUpdate {
                order_id: order.id,
                expected_version: order.version,
                status: OrderStatus::Cancelled,
                stock_deltas: vec![],
            })
            .await;

        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { actual: None, .. })
        ));
    }

    #[tokio::test]
    async fn deltas_for_missing_or_untracked_products_are_skipped() {
        let store = InMemoryStore::new();
        let untracked = store
            .insert_product(NewProduct::new("Servicio", Money::from_cents(500)))
            .await
            .unwrap();
        let order = store
            .insert_order(new_order(&[(untracked.id, 1, 500), (ProductId::new(99), 2, 100)]))
            .await
            .unwrap();

        let updated = store
            .update_order_status(StatusUpdate {
                order_id: order.id,
                expected_version: order.version,
                status: OrderStatus::Completed,
                stock_deltas: vec![
                    StockDelta {
                        product_id: untracked.id,
                        delta: -1,
                    },
                    StockDelta {
                        product_id: ProductId::new(99),
                        delta: -2,
                    },
                ],
            })
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Completed);
        let untracked = store.find_product(untracked.id).await.unwrap().unwrap();
        assert_eq!(untracked.stock, None);
    }

    #[tokio::test]
    async fn list_orders_filters_active() {
        let store = InMemoryStore::new();
        let first = store
            .insert_order(new_order(&[(ProductId::new(1), 1, 100)]))
            .await
            .unwrap();
        let second = store
            .insert_order(new_order(&[(ProductId::new(1), 1, 100)]))
            .await
            .unwrap();

        store
            .update_order_status(StatusUpdate {
                order_id: first.id,
                expected_version: first.version,
                status: OrderStatus::Cancelled,
                stock_deltas: vec![],
            })
            .await
            .unwrap();

        let active = store.list_orders(OrderFilter::Active).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);

        let all = store.list_orders(OrderFilter::All).await.unwrap();
        assert_eq!(all.len(), 2);

        let cancelled = store
            .list_orders(OrderFilter::Status(OrderStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].id, first.id);
    }

    #[tokio::test]
    async fn delete_product_keeps_order_lines() {
        let store = InMemoryStore::new();
        let product = store
            .insert_product(NewProduct::new("Queque", Money::from_cents(2500)).with_stock(4))
            .await
            .unwrap();
        let order = store
            .insert_order(new_order(&[(product.id, 1, 2500)]))
            .await
            .unwrap();

        store.delete_product(product.id).await.unwrap();

        assert!(store.find_product(product.id).await.unwrap().is_none());
        let order = store.find_order(order.id).await.unwrap().unwrap();
        assert_eq!(order.details[0].product_id, product.id);
        assert!(matches!(
            store.delete_product(product.id).await,
            Err(StoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn find_category_after_insert() {
        let store = InMemoryStore::new();
        let category = store.insert_category("Tortas").await.unwrap();

        assert_eq!(
            store.find_category(category.id).await.unwrap(),
            Some(category)
        );
        assert!(
            store
                .find_category(CategoryId::new(99))
                .await
                .unwrap()
                .is_none()
        );
    }
}
