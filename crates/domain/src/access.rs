//! Roles, capabilities and the order edit guard.

use std::str::FromStr;

use common::OrderStatus;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Back-office roles known to the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    OrderManager,
    ProductManager,
}

impl Role {
    /// Returns true if holding this role grants `capability`.
    pub fn grants(&self, capability: Capability) -> bool {
        match (self, capability) {
            (Role::Admin, _) => true,
            (Role::OrderManager, Capability::ManageOrders) => true,
            (Role::OrderManager, Capability::Administer) => false,
            (Role::ProductManager, _) => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::OrderManager => "OrderManager",
            Role::ProductManager => "ProductManager",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Role::Admin, Role::OrderManager, Role::ProductManager]
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::Unauthorized(format!("unknown role: {}", s.trim())))
    }
}

/// What an actor is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// View orders and move them between statuses.
    ManageOrders,
    /// Elevated rights, including reopening Completed or Cancelled orders.
    Administer,
}

/// Answers capability questions for the acting principal.
pub trait AccessControl: Send + Sync {
    fn has_capability(&self, capability: Capability) -> bool;
}

/// An authenticated back-office user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Principal {
    pub email: String,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn new(email: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            email: email.into(),
            roles,
        }
    }

    pub fn admin(email: impl Into<String>) -> Self {
        Self::new(email, vec![Role::Admin])
    }

    pub fn order_manager(email: impl Into<String>) -> Self {
        Self::new(email, vec![Role::OrderManager])
    }
}

impl AccessControl for Principal {
    fn has_capability(&self, capability: Capability) -> bool {
        self.roles.iter().any(|role| role.grants(capability))
    }
}

/// Fails unless the actor may manage orders at all.
pub fn ensure_can_manage_orders(access: &dyn AccessControl) -> Result<(), DomainError> {
    if access.has_capability(Capability::ManageOrders) {
        Ok(())
    } else {
        Err(DomainError::Unauthorized(
            "You do not have permission to manage orders".to_string(),
        ))
    }
}

/// Fails unless the actor may edit an order currently in `status`.
///
/// Completed and Cancelled orders can only be changed by an administrator.
pub fn ensure_can_edit(access: &dyn AccessControl, status: OrderStatus) -> Result<(), DomainError> {
    ensure_can_manage_orders(access)?;

    if status.is_terminal() && !access.has_capability(Capability::Administer) {
        return Err(DomainError::Unauthorized(format!(
            "This order is already {status}; only an administrator can change it"
        )));
    }

    Ok(())
}
