//! Per-session shopping cart.

mod service;
mod session;

use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogProduct;

pub use self::service::{CART_SESSION_KEY, CartStore, CartSummary};

/// One cart line. Name and price are captured when the product is first added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CartItem {
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// The lines in a cart, in the order they were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn line(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Sum of every line subtotal.
    pub fn total(&self) -> Money {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    /// Adds one unit of `product`.
    ///
    /// An existing line keeps its original price snapshot.
    pub fn add(&mut self, product: &CatalogProduct) -> &CartItem {
        let index = match self
            .items
            .iter()
            .position(|i| i.product_id == product.id)
        {
            Some(index) => {
                self.items[index].quantity = self.items[index].quantity.saturating_add(1);
                index
            }
            None => {
                self.items.push(CartItem {
                    product_id: product.id,
                    name: product.name.clone(),
                    unit_price: product.price,
                    quantity: 1,
                    image_url: product.image_url.clone(),
                });
                self.items.len() - 1
            }
        };
        &self.items[index]
    }

    /// Removes the line for `product_id`. Returns true if a line was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() != before
    }

    /// Overwrites the quantity of an existing line.
    ///
    /// A quantity of zero or less removes the line. Returns true if the line
    /// was removed. Missing lines are left alone.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove(product_id);
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = quantity;
        }
        false
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
