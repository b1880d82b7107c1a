use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use common::{Money, OrderDetailId, OrderId, OrderStatus, ProductId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    Cart, CartStore, CatalogProduct, CheckoutForm, CheckoutProcessor, InMemoryNotifier,
    NotificationSettings, OrderService, Principal, StoreCatalog, stock_adjustments,
};
use store::{
    InMemorySessionStore, InMemoryStore, NewOrder, NewOrderDetail, NewProduct, OrderDetail,
    SessionId, Store,
};

fn catalog_product(id: i64) -> CatalogProduct {
    CatalogProduct {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        price: Money::from_cents(100 + id),
        image_url: None,
        stock: Some(1_000),
    }
}

fn bench_cart_total(c: &mut Criterion) {
    let products: Vec<_> = (1..=50).map(catalog_product).collect();
    let mut cart = Cart::new();
    for product in &products {
        cart.add(product);
        cart.add(product);
    }

    c.bench_function("domain/cart_total_50_lines", |b| {
        b.iter(|| std::hint::black_box(cart.total()));
    });
}

fn bench_stock_adjustments(c: &mut Criterion) {
    let details: Vec<_> = (1..=100)
        .map(|i| OrderDetail {
            id: OrderDetailId::new(i),
            order_id: OrderId::new(1),
            product_id: ProductId::new(i % 20),
            quantity: 3,
            unit_price: Money::from_cents(500),
        })
        .collect();

    c.bench_function("domain/stock_adjustments_100_lines", |b| {
        b.iter(|| {
            std::hint::black_box(stock_adjustments(
                OrderStatus::ReadyForPickup,
                OrderStatus::Completed,
                &details,
            ))
        });
    });
}

fn bench_checkout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = Arc::new(InMemoryStore::new());
    let sessions = Arc::new(InMemorySessionStore::new());
    let product_id = rt.block_on(async {
        store
            .insert_product(NewProduct::new("Pastel", Money::from_cents(37000)))
            .await
            .unwrap()
            .id
    });
    let carts = CartStore::new(
        Arc::clone(&sessions),
        StoreCatalog::new(Arc::clone(&store)),
    );
    let checkout = CheckoutProcessor::new(
        Arc::clone(&store),
        sessions,
        InMemoryNotifier::new(),
        NotificationSettings::new("Bench"),
    );
    let form = CheckoutForm {
        customer_name: "Bench".to_string(),
        customer_email: "bench@example.com".to_string(),
        customer_phone: "8888-1234".to_string(),
        requested_delivery_date: "2026-12-24".to_string(),
        notes: None,
    };

    c.bench_function("domain/add_to_cart_and_checkout", |b| {
        b.iter(|| {
            rt.block_on(async {
                let session = SessionId::new();
                carts.add(&session, product_id).await.unwrap();
                checkout.submit(&session, &form).await.unwrap();
            });
        });
    });
}

fn bench_status_round_trip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = Arc::new(InMemoryStore::new());
    let service = OrderService::new(Arc::clone(&store));
    let admin = Principal::admin("bench@example.com");
    let order = rt.block_on(async {
        let product = store
            .insert_product(NewProduct::new("Pan", Money::from_cents(1500)).with_stock(1_000_000))
            .await
            .unwrap();
        let details = vec![NewOrderDetail {
            product_id: product.id,
            quantity: 2,
            unit_price: Money::from_cents(1500),
        }];
        store
            .insert_order(NewOrder {
                customer_email: "bench@example.com".to_string(),
                customer_name: "Bench".to_string(),
                customer_phone: "8888-1234".to_string(),
                order_date: Utc::now(),
                requested_delivery_date: NaiveDate::from_ymd_opt(2026, 12, 24).unwrap(),
                notes: None,
                total: Money::from_cents(3000),
                details,
            })
            .await
            .unwrap()
    });
    let mut version = order.version;

    c.bench_function("domain/complete_and_reopen", |b| {
        b.iter(|| {
            rt.block_on(async {
                let done = service
                    .change_status(order.id, version, OrderStatus::Completed, &admin)
                    .await
                    .unwrap();
                let reopened = service
                    .change_status(order.id, done.order.version, OrderStatus::Pending, &admin)
                    .await
                    .unwrap();
                version = reopened.order.version;
            });
        });
    });
}

criterion_group!(
    benches,
    bench_cart_total,
    bench_stock_adjustments,
    bench_checkout,
    bench_status_round_trip
);
criterion_main!(benches);
