//! End-to-end tests for the storefront domain.
//!
//! These tests walk a cart through checkout and the placed order through its
//! status lifecycle against the in-memory store.

use std::sync::Arc;

use common::{Money, OrderStatus, ProductId};
use domain::{
    CartStore, CheckoutForm, CheckoutProcessor, DomainError, InMemoryNotifier,
    NotificationSettings, OrderService, Principal, StoreCatalog,
};
use store::{
    InMemorySessionStore, InMemoryStore, NewProduct, OrderFilter, SessionId, Store, StoreExt,
};

struct Shop {
    store: Arc<InMemoryStore>,
    carts: CartStore<InMemorySessionStore, StoreCatalog<InMemoryStore>>,
    checkout: CheckoutProcessor<InMemoryStore, InMemorySessionStore, InMemoryNotifier>,
    orders: OrderService<InMemoryStore>,
    notifier: InMemoryNotifier,
}

fn create_shop() -> Shop {
    let store = Arc::new(InMemoryStore::new());
    let sessions = Arc::new(InMemorySessionStore::new());
    let notifier = InMemoryNotifier::new();
    Shop {
        carts: CartStore::new(
            Arc::clone(&sessions),
            StoreCatalog::new(Arc::clone(&store)),
        ),
        checkout: CheckoutProcessor::new(
            Arc::clone(&store),
            sessions,
            notifier.clone(),
            NotificationSettings::new("Test Bakery").with_admin_email("ops@example.com"),
        ),
        orders: OrderService::new(Arc::clone(&store)),
        store,
        notifier,
    }
}

fn checkout_form() -> CheckoutForm {
    CheckoutForm {
        customer_name: "Ana Mora".to_string(),
        customer_email: "ana@example.com".to_string(),
        customer_phone: "+506 8888-1234".to_string(),
        requested_delivery_date: "2026-12-24".to_string(),
        notes: Some("Happy birthday".to_string()),
    }
}

async fn add_product(shop: &Shop, name: &str, price: i64, stock: Option<i64>) -> ProductId {
    let mut product = NewProduct::new(name, Money::from_cents(price));
    if let Some(stock) = stock {
        product = product.with_stock(stock);
    }
    shop.store.insert_product(product).await.unwrap().id
}

mod checkout_flow {
    use super::*;

    #[tokio::test]
    async fn cart_becomes_pending_order() {
        let shop = create_shop();
        let cake = add_product(&shop, "Cake", 37000, Some(10)).await;
        let session = SessionId::new();

        shop.carts.add(&session, cake).await.unwrap();
        shop.carts.add(&session, cake).await.unwrap();
        let receipt = shop.checkout.submit(&session, &checkout_form()).await.unwrap();

        let order = shop.orders.get(receipt.order_id).await.unwrap();
        assert_eq!(order.total, Money::from_cents(74000));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.details.len(), 1);
        assert_eq!(order.details[0].product_id, cake);
        assert_eq!(order.details[0].quantity, 2);
        assert_eq!(order.details[0].unit_price, Money::from_cents(37000));
        assert_eq!(order.notes.as_deref(), Some("Happy birthday"));
        assert!(shop.carts.get(&session).await.unwrap().is_empty());
        assert_eq!(shop.notifier.sent_count().await, 2);
    }

    #[tokio::test]
    async fn order_keeps_cart_price_snapshot() {
        let shop = create_shop();
        let bread = add_product(&shop, "Bread", 1500, None).await;
        let session = SessionId::new();
        shop.carts.add(&session, bread).await.unwrap();

        // The product leaves the catalog after it was added.
        shop.store.delete_product(bread).await.unwrap();

        let receipt = shop.checkout.submit(&session, &checkout_form()).await.unwrap();
        let order = shop.orders.get(receipt.order_id).await.unwrap();
        assert_eq!(order.details[0].unit_price, Money::from_cents(1500));
        assert_eq!(receipt.total, Money::from_cents(1500));
    }

    #[tokio::test]
    async fn empty_cart_never_creates_order() {
        let shop = create_shop();

        let result = shop
            .checkout
            .submit(&SessionId::new(), &checkout_form())
            .await;

        assert!(matches!(result, Err(DomainError::EmptyCart)));
        assert!(shop.orders.list(OrderFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn order_total_matches_cart_total() {
        let shop = create_shop();
        let a = add_product(&shop, "A", 333, None).await;
        let b = add_product(&shop, "B", 1250, None).await;
        let session = SessionId::new();
        shop.carts.add(&session, a).await.unwrap();
        shop.carts.add(&session, b).await.unwrap();
        shop.carts.set_quantity(&session, a, 5).await.unwrap();
        let cart_total = shop.carts.get(&session).await.unwrap().total();

        let receipt = shop.checkout.submit(&session, &checkout_form()).await.unwrap();

        assert_eq!(receipt.total, cart_total);
        assert_eq!(receipt.total, Money::from_cents(333 * 5 + 1250));
    }
}

mod status_lifecycle {
    use super::*;

    async fn placed_order(shop: &Shop, stock: i64, quantity: i64) -> (common::OrderId, ProductId) {
        let product = add_product(shop, "Bread", 1500, Some(stock)).await;
        let session = SessionId::new();
        shop.carts.add(&session, product).await.unwrap();
        shop.carts
            .set_quantity(&session, product, quantity)
            .await
            .unwrap();
        let receipt = shop.checkout.submit(&session, &checkout_form()).await.unwrap();
        (receipt.order_id, product)
    }

    #[tokio::test]
    async fn completion_and_cancellation_move_stock() {
        let shop = create_shop();
        let (order_id, product) = placed_order(&shop, 10, 3).await;
        let manager = Principal::order_manager("ops@example.com");
        let admin = Principal::admin("boss@example.com");

        let mut order = shop.orders.get(order_id).await.unwrap();
        for status in [
            OrderStatus::InProduction,
            OrderStatus::ReadyForPickup,
            OrderStatus::Completed,
        ] {
            order = shop
                .orders
                .change_status(order_id, order.version, status, &manager)
                .await
                .unwrap()
                .order;
        }
        assert_eq!(shop.store.get_product(product).await.unwrap().stock, Some(7));

        shop.orders
            .change_status(order_id, order.version, OrderStatus::Cancelled, &admin)
            .await
            .unwrap();
        assert_eq!(shop.store.get_product(product).await.unwrap().stock, Some(10));
    }

    #[tokio::test]
    async fn manager_cannot_reopen_completed_order() {
        let shop = create_shop();
        let (order_id, product) = placed_order(&shop, 10, 3).await;
        let manager = Principal::order_manager("ops@example.com");
        let order = shop.orders.get(order_id).await.unwrap();
        let done = shop
            .orders
            .change_status(order_id, order.version, OrderStatus::Completed, &manager)
            .await
            .unwrap();

        let result = shop
            .orders
            .change_status(order_id, done.order.version, OrderStatus::Pending, &manager)
            .await;

        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
        let order = shop.orders.get(order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.version, done.order.version);
        assert_eq!(shop.store.get_product(product).await.unwrap().stock, Some(7));
    }

    #[tokio::test]
    async fn concurrent_editors_conflict() {
        let shop = create_shop();
        let (order_id, product) = placed_order(&shop, 10, 2).await;
        let first = Principal::order_manager("first@example.com");
        let second = Principal::order_manager("second@example.com");
        let seen = shop.orders.edit(order_id, &first).await.unwrap().order.version;
        assert_eq!(
            shop.orders.edit(order_id, &second).await.unwrap().order.version,
            seen
        );

        shop.orders
            .change_status(order_id, seen, OrderStatus::Completed, &first)
            .await
            .unwrap();
        let result = shop
            .orders
            .change_status(order_id, seen, OrderStatus::Completed, &second)
            .await;

        assert!(matches!(result, Err(DomainError::ConcurrencyConflict { .. })));
        assert_eq!(shop.store.get_product(product).await.unwrap().stock, Some(8));
    }

    #[tokio::test]
    async fn active_filter_hides_finished_orders() {
        let shop = create_shop();
        let (open, _) = placed_order(&shop, 10, 1).await;
        let (finished, _) = placed_order(&shop, 10, 1).await;
        let manager = Principal::order_manager("ops@example.com");
        let order = shop.orders.get(finished).await.unwrap();
        shop.orders
            .change_status(finished, order.version, OrderStatus::Cancelled, &manager)
            .await
            .unwrap();

        let active = shop.orders.list(OrderFilter::Active).await.unwrap();

        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, open);
        assert_eq!(shop.orders.list(OrderFilter::All).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn stock_may_go_negative() {
        let shop = create_shop();
        let (order_id, product) = placed_order(&shop, 1, 4).await;
        let order = shop.orders.get(order_id).await.unwrap();

        shop.orders
            .change_status(
                order_id,
                order.version,
                OrderStatus::Completed,
                &Principal::admin("boss@example.com"),
            )
            .await
            .unwrap();

        assert_eq!(shop.store.get_product(product).await.unwrap().stock, Some(-3));
    }
}
