use std::sync::Arc;

use common::{Money, ProductId};
use serde::Serialize;
use store::{SessionId, SessionStore};

use super::session::CartSession;
use super::{Cart, CartItem};
use crate::catalog::CatalogReader;
use crate::error::DomainError;

/// Session key the cart is stored under.
pub const CART_SESSION_KEY: &str = "cart";

/// Cart state returned after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub total: Money,
    /// Subtotal of the line that was touched, if it is still in the cart.
    pub line_subtotal: Option<Money>,
    /// True when the touched line was removed.
    pub removed: bool,
}

impl CartSummary {
    fn new(cart: Cart, touched: ProductId, removed: bool) -> Self {
        let line_subtotal = cart.line(touched).map(CartItem::subtotal);
        let total = cart.total();
        Self {
            items: cart.into_items(),
            total,
            line_subtotal,
            removed,
        }
    }
}

/// Per-session cart operations.
pub struct CartStore<SS: SessionStore, C: CatalogReader> {
    session: CartSession<SS>,
    catalog: C,
}

impl<SS: SessionStore, C: CatalogReader> CartStore<SS, C> {
    pub fn new(sessions: Arc<SS>, catalog: C) -> Self {
        Self {
            session: CartSession::new(sessions, CART_SESSION_KEY),
            catalog,
        }
    }

    /// Returns the cart for `session` (empty if none).
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, session: &SessionId) -> Result<Cart, DomainError> {
        self.session.load(session).await
    }

    /// Adds one unit of a product, snapshotting its name and price.
    #[tracing::instrument(skip(self))]
    pub async fn add(
        &self,
        session: &SessionId,
        product_id: ProductId,
    ) -> Result<CartSummary, DomainError> {
        let product = self.catalog.find_product(product_id).await?;

        let mut cart = self.session.load(session).await?;
        cart.add(&product);
        self.session.save(session, &cart).await?;

        tracing::debug!(%product_id, lines = cart.len(), "added product to cart");
        Ok(CartSummary::new(cart, product_id, false))
    }

    /// Removes a product's line. Missing lines are a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn remove(
        &self,
        session: &SessionId,
        product_id: ProductId,
    ) -> Result<CartSummary, DomainError> {
        let mut cart = self.session.load(session).await?;
        let removed = cart.remove(product_id);
        if removed {
            self.session.save(session, &cart).await?;
        }
        Ok(CartSummary::new(cart, product_id, removed))
    }

    /// Sets a line's quantity; zero or less removes it.
    #[tracing::instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        session: &SessionId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartSummary, DomainError> {
        let mut cart = self.session.load(session).await?;
        if cart.line(product_id).is_none() {
            return Ok(CartSummary::new(cart, product_id, false));
        }
        let removed = cart.set_quantity(product_id, quantity);
        self.session.save(session, &cart).await?;
        Ok(CartSummary::new(cart, product_id, removed))
    }

    /// Empties the cart by dropping its session key.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, session: &SessionId) -> Result<(), DomainError> {
        self.session.clear(session).await
    }
}

impl<SS: SessionStore, C: CatalogReader + Clone> Clone for CartStore<SS, C> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            catalog: self.catalog.clone(),
        }
    }
}
