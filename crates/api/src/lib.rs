//! HTTP API server for the storefront.
//!
//! Serves the public catalog, the session cart, checkout, and the
//! back-office order screens, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post, put};
use domain::{LogNotifier, NotificationSettings};
use mailer::HttpMailer;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{InMemorySessionStore, Money, NewProduct, Store};
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use state::{AppState, SharedNotifier};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    // Cart and checkout need a browser session; the rest does not.
    let storefront = Router::new()
        .route("/cart", get(routes::cart::view::<S>))
        .route(
            "/cart/items/{product_id}",
            post(routes::cart::add::<S>)
                .put(routes::cart::set_quantity::<S>)
                .delete(routes::cart::remove::<S>),
        )
        .route(
            "/checkout",
            get(routes::checkout::form::<S>).post(routes::checkout::submit::<S>),
        )
        .route_layer(middleware::from_fn(session::ensure_session));

    Router::new()
        .route("/health", get(routes::system::health::<S>))
        .route("/products", get(routes::catalog::list::<S>))
        .route("/products/{id}", get(routes::catalog::get::<S>))
        .route("/checkout/success/{id}", get(routes::checkout::success))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/edit", get(routes::orders::edit::<S>))
        .route("/orders/{id}/status", put(routes::orders::change_status::<S>))
        .merge(storefront)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state from configuration.
///
/// Mail goes through the HTTP mail API when a key is configured and is
/// only logged otherwise.
pub fn create_default_state<S: Store + 'static>(
    store: Arc<S>,
    config: &Config,
    backend: &'static str,
) -> Arc<AppState<S>> {
    let notifier: SharedNotifier = match config.mailer() {
        Some(mailer) => {
            tracing::info!(api_url = %mailer.api_url, "sending mail through HTTP API");
            Arc::new(HttpMailer::new(mailer))
        }
        None => {
            tracing::info!("no mail API key configured, notifications are logged only");
            Arc::new(LogNotifier)
        }
    };

    let mut settings = NotificationSettings::new(config.mail_from_name.clone())
        .with_display_offset(config.display_offset());
    if let Some(admin) = &config.admin_notification_email {
        settings = settings.with_admin_email(admin.clone());
    }
    if let Some(template) = &config.confirmation_template_id {
        settings = settings.with_confirmation_template(template.clone());
    }

    let sessions = Arc::new(InMemorySessionStore::with_idle_timeout(
        config.session_idle_timeout(),
    ));

    Arc::new(AppState::new(store, sessions, notifier, settings, backend))
}

/// Periodically drops idle sessions so abandoned carts do not pile up.
pub fn spawn_session_reaper(
    sessions: Arc<InMemorySessionStore>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                tracing::info!(purged, "expired idle sessions");
            }
        }
    })
}

/// Fills an empty store with a small catalog so the in-memory backend is usable.
pub async fn seed_demo_products<S: Store>(store: &S) -> store::Result<usize> {
    if !store.list_products().await?.is_empty() {
        return Ok(0);
    }

    let cakes = store.insert_category("Cakes").await?;
    let products = [
        NewProduct::new("Chocolate Cake", Money::from_cents(2500))
            .with_stock(10)
            .with_image_url("/images/chocolate-cake.jpg")
            .in_category(cakes.id),
        NewProduct::new("Lemon Tart", Money::from_cents(1800))
            .with_stock(8)
            .in_category(cakes.id),
        NewProduct::new("Cupcake Box", Money::from_cents(1200)).with_stock(24),
        NewProduct::new("Gift Card", Money::from_cents(5000)),
    ];

    let count = products.len();
    for product in products {
        store.insert_product(product).await?;
    }
    tracing::info!(count, "seeded demo products");
    Ok(count)
}
