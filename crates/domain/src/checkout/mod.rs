//! Turning a session cart into a placed order.

mod form;
mod messages;

use std::sync::Arc;

use chrono::Utc;
use common::{Money, OrderId};
use serde::Serialize;
use store::{NewOrder, NewOrderDetail, Order, SessionId, SessionStore, Store};

use crate::cart::{CartItem, CartStore};
use crate::catalog::StoreCatalog;
use crate::error::DomainError;
use crate::notification::{NotificationSettings, Notifier};

pub use form::{CheckoutForm, ValidCheckout};

/// Returned to the customer once the order is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    pub order_id: OrderId,
    pub total: Money,
}

/// Validates checkout forms, persists orders and sends the follow-up mail.
pub struct CheckoutProcessor<S: Store, SS: SessionStore, N: Notifier> {
    store: Arc<S>,
    carts: CartStore<SS, StoreCatalog<S>>,
    notifier: N,
    settings: NotificationSettings,
}

impl<S: Store, SS: SessionStore, N: Notifier> CheckoutProcessor<S, SS, N> {
    pub fn new(
        store: Arc<S>,
        sessions: Arc<SS>,
        notifier: N,
        settings: NotificationSettings,
    ) -> Self {
        let carts = CartStore::new(sessions, StoreCatalog::new(Arc::clone(&store)));
        Self {
            store,
            carts,
            notifier,
            settings,
        }
    }

    /// Returns a blank form, or `EmptyCart` if there is nothing to check out.
    #[tracing::instrument(skip(self))]
    pub async fn render_form(&self, session: &SessionId) -> Result<CheckoutForm, DomainError> {
        let cart = self.carts.get(session).await?;
        if cart.is_empty() {
            return Err(DomainError::EmptyCart);
        }
        Ok(CheckoutForm::blank(Utc::now().date_naive()))
    }

    /// Places an order for the session's cart.
    ///
    /// The order is stored before any notification is attempted, and the cart
    /// is only cleared once the order exists.
    #[tracing::instrument(skip(self, form))]
    pub async fn submit(
        &self,
        session: &SessionId,
        form: &CheckoutForm,
    ) -> Result<CheckoutReceipt, DomainError> {
        let started = std::time::Instant::now();

        let cart = self.carts.get(session).await?;
        if cart.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        let valid = form.validate().map_err(DomainError::Validation)?;

        let new_order = build_order(valid, cart.items(), cart.total());
        let order = self.store.insert_order(new_order).await?;
        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(order_id = %order.id, total = %order.total, "order placed");

        self.notify(&order, cart.items()).await;

        if let Err(e) = self.carts.clear(session).await {
            tracing::warn!(order_id = %order.id, error = %e, "order placed but cart was not cleared");
        }

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());

        Ok(CheckoutReceipt {
            order_id: order.id,
            total: order.total,
        })
    }

    async fn notify(&self, order: &Order, items: &[CartItem]) {
        let confirmation = match &self.settings.confirmation_template_id {
            Some(template_id) => {
                let offset = self.settings.display_offset;
                let data = messages::customer_template_data(order, items, offset);
                self.notifier
                    .send_templated(&order.customer_email, template_id, data)
                    .await
            }
            None => {
                let subject = messages::customer_subject(&self.settings.store_name, order);
                let body = messages::customer_html(order, self.settings.display_offset);
                self.notifier
                    .send(&order.customer_email, &subject, &body)
                    .await
            }
        };
        if let Err(e) = confirmation {
            metrics::counter!("notifications_failed_total").increment(1);
            tracing::warn!(order_id = %order.id, error = %e, "customer confirmation failed");
        }

        let Some(admin_email) = &self.settings.admin_email else {
            return;
        };
        let subject = messages::admin_subject(order);
        let body = messages::admin_html(order);
        if let Err(e) = self.notifier.send(admin_email, &subject, &body).await {
            metrics::counter!("notifications_failed_total").increment(1);
            tracing::warn!(order_id = %order.id, error = %e, "admin alert failed");
        }
    }
}

fn build_order(valid: ValidCheckout, items: &[CartItem], total: Money) -> NewOrder {
    let details = items
        .iter()
        .map(|item| NewOrderDetail {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        })
        .collect();

    NewOrder {
        customer_email: valid.customer_email,
        customer_name: valid.customer_name,
        customer_phone: valid.customer_phone,
        order_date: Utc::now(),
        requested_delivery_date: valid.requested_delivery_date,
        notes: valid.notes,
        total,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{InMemoryNotifier, SentMessage};
    use common::{OrderStatus, ProductId};
    use store::{InMemorySessionStore, InMemoryStore, NewProduct, StoreExt};

    struct Fixture {
        store: Arc<InMemoryStore>,
        carts: CartStore<InMemorySessionStore, StoreCatalog<InMemoryStore>>,
        notifier: InMemoryNotifier,
        checkout: CheckoutProcessor<InMemoryStore, InMemorySessionStore, InMemoryNotifier>,
        cake: ProductId,
    }

    async fn fixture(settings: NotificationSettings) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let cake = store
            .insert_product(NewProduct::new("Pastel", Money::from_cents(37000)).with_stock(10))
            .await
            .unwrap()
            .id;
        let notifier = InMemoryNotifier::new();
        let carts = CartStore::new(
            Arc::clone(&sessions),
            StoreCatalog::new(Arc::clone(&store)),
        );
        let checkout =
            CheckoutProcessor::new(Arc::clone(&store), sessions, notifier.clone(), settings);
        Fixture {
            store,
            carts,
            notifier,
            checkout,
            cake,
        }
    }

    fn form() -> CheckoutForm {
        CheckoutForm {
            customer_name: "Ana Mora".to_string(),
            customer_email: "ana@example.com".to_string(),
            customer_phone: "8888-1234".to_string(),
            requested_delivery_date: "2026-12-24".to_string(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn render_form_requires_items() {
        let f = fixture(NotificationSettings::new("Shop")).await;
        let session = SessionId::new();

        assert!(matches!(
            f.checkout.render_form(&session).await,
            Err(DomainError::EmptyCart)
        ));

        f.carts.add(&session, f.cake).await.unwrap();
        let blank = f.checkout.render_form(&session).await.unwrap();
        let tomorrow = Utc::now().date_naive().succ_opt().unwrap();
        assert_eq!(
            blank.requested_delivery_date,
            tomorrow.format("%Y-%m-%d").to_string()
        );
    }

    #[tokio::test]
    async fn submit_places_order_and_clears_cart() {
        let f = fixture(NotificationSettings::new("Shop")).await;
        let session = SessionId::new();
        f.carts.add(&session, f.cake).await.unwrap();
        f.carts.add(&session, f.cake).await.unwrap();

        let receipt = f.checkout.submit(&session, &form()).await.unwrap();

        assert_eq!(receipt.total, Money::from_cents(74000));
        let order = f.store.get_order(receipt.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.details.len(), 1);
        assert_eq!(order.details[0].quantity, 2);
        assert_eq!(order.details[0].unit_price, Money::from_cents(37000));
        assert!(f.carts.get(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_cart_creates_nothing() {
        let f = fixture(NotificationSettings::new("Shop")).await;

        let result = f.checkout.submit(&SessionId::new(), &form()).await;

        assert!(matches!(result, Err(DomainError::EmptyCart)));
        assert_eq!(f.store.order_count().await, 0);
        assert_eq!(f.notifier.sent_count().await, 0);
    }

    #[tokio::test]
    async fn invalid_form_has_no_side_effects() {
        let f = fixture(NotificationSettings::new("Shop")).await;
        let session = SessionId::new();
        f.carts.add(&session, f.cake).await.unwrap();
        let mut bad = form();
        bad.customer_email = String::new();

        let result = f.checkout.submit(&session, &bad).await;

        assert!(matches!(result, Err(DomainError::Validation(ref e)) if e.get("customer_email").is_some()));
        assert_eq!(f.store.order_count().await, 0);
        assert_eq!(f.carts.get(&session).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn notification_failure_does_not_undo_order() {
        let f = fixture(NotificationSettings::new("Shop").with_admin_email("ops@example.com")).await;
        let session = SessionId::new();
        f.carts.add(&session, f.cake).await.unwrap();
        f.notifier.set_fail(true).await;

        let receipt = f.checkout.submit(&session, &form()).await.unwrap();

        assert!(f.store.find_order(receipt.order_id).await.unwrap().is_some());
        assert!(f.carts.get(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sends_html_confirmation_and_admin_alert() {
        let f = fixture(NotificationSettings::new("Shop").with_admin_email("ops@example.com")).await;
        let session = SessionId::new();
        f.carts.add(&session, f.cake).await.unwrap();

        f.checkout.submit(&session, &form()).await.unwrap();

        let sent = f.notifier.sent().await;
        assert_eq!(sent.len(), 2);
        assert!(matches!(&sent[0], SentMessage::Html { to, .. } if to == "ana@example.com"));
        assert_eq!(sent[1].to(), "ops@example.com");
    }

    #[tokio::test]
    async fn uses_template_when_configured() {
        let f = fixture(NotificationSettings::new("Shop").with_confirmation_template("d-abc")).await;
        let session = SessionId::new();
        f.carts.add(&session, f.cake).await.unwrap();

        let receipt = f.checkout.submit(&session, &form()).await.unwrap();

        let sent = f.notifier.sent().await;
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            SentMessage::Templated {
                template_id, data, ..
            } => {
                assert_eq!(template_id, "d-abc");
                assert_eq!(data["order_id"], receipt.order_id.as_i64());
                assert_eq!(data["items"][0]["quantity"], 1);
            }
            other => panic!("expected templated message, got {other:?}"),
        }
    }
}
