use std::sync::Arc;

use store::{SessionId, SessionStore};

use super::Cart;
use crate::error::DomainError;

/// Reads and writes one session's cart as JSON under a fixed key.
pub(super) struct CartSession<SS: SessionStore> {
    sessions: Arc<SS>,
    key: &'static str,
}

impl<SS: SessionStore> CartSession<SS> {
    pub(super) fn new(sessions: Arc<SS>, key: &'static str) -> Self {
        Self { sessions, key }
    }

    /// Loads the cart, treating a missing or unreadable payload as empty.
    pub(super) async fn load(&self, session: &SessionId) -> Result<Cart, DomainError> {
        let Some(payload) = self.sessions.get(session, self.key).await? else {
            return Ok(Cart::new());
        };

        match serde_json::from_str(&payload) {
            Ok(cart) => Ok(cart),
            Err(e) => {
                tracing::warn!(%session, error = %e, "discarding unreadable cart payload");
                Ok(Cart::new())
            }
        }
    }

    pub(super) async fn save(&self, session: &SessionId, cart: &Cart) -> Result<(), DomainError> {
        let payload = serde_json::to_string(cart)?;
        self.sessions.set(session, self.key, payload).await?;
        Ok(())
    }

    pub(super) async fn clear(&self, session: &SessionId) -> Result<(), DomainError> {
        self.sessions.remove(session, self.key).await?;
        Ok(())
    }
}

impl<SS: SessionStore> Clone for CartSession<SS> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            key: self.key,
        }
    }
}
