//! Shared application state.

use std::sync::Arc;

use chrono::FixedOffset;
use domain::{
    CartStore, CheckoutProcessor, NotificationSettings, Notifier, OrderService, StoreCatalog,
};
use store::{InMemorySessionStore, Store};

/// Notifier shared by every request.
pub type SharedNotifier = Arc<dyn Notifier>;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub catalog: StoreCatalog<S>,
    pub carts: CartStore<InMemorySessionStore, StoreCatalog<S>>,
    pub checkout: CheckoutProcessor<S, InMemorySessionStore, SharedNotifier>,
    pub orders: OrderService<S>,
    pub sessions: Arc<InMemorySessionStore>,
    pub backend: &'static str,
    /// Offset order dates are rendered in.
    pub display_offset: FixedOffset,
}

impl<S: Store> AppState<S> {
    pub fn new(
        store: Arc<S>,
        sessions: Arc<InMemorySessionStore>,
        notifier: SharedNotifier,
        settings: NotificationSettings,
        backend: &'static str,
    ) -> Self {
        let catalog = StoreCatalog::new(Arc::clone(&store));
        let display_offset = settings.display_offset;
        Self {
            carts: CartStore::new(Arc::clone(&sessions), catalog.clone()),
            checkout: CheckoutProcessor::new(
                Arc::clone(&store),
                Arc::clone(&sessions),
                notifier,
                settings,
            ),
            orders: OrderService::new(store),
            catalog,
            sessions,
            backend,
            display_offset,
        }
    }
}
