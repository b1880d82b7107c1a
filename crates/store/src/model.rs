//! Rows persisted by the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{CategoryId, Money, OrderDetailId, OrderId, OrderStatus, ProductId};

/// Row version used for optimistic concurrency control.
///
/// A freshly inserted order is at version 1; every status write bumps it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version of a newly inserted row.
    pub fn first() -> Self {
        Self(1)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub image_url: Option<String>,
    /// `None` means stock is not tracked for this product.
    pub stock: Option<i64>,
    pub category_id: Option<CategoryId>,
}

impl Product {
    /// Adds `delta` to the tracked stock.
    ///
    /// Returns false (and leaves the product untouched) when stock is not
    /// tracked. Stock may go negative.
    pub fn apply_stock_delta(&mut self, delta: i64) -> bool {
        match self.stock.as_mut() {
            Some(stock) => {
                *stock += delta;
                true
            }
            None => false,
        }
    }
}

/// Fields for inserting a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub stock: Option<i64>,
    pub category_id: Option<CategoryId>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        Self {
            name: name.into(),
            price,
            image_url: None,
            stock: None,
            category_id: None,
        }
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = Some(stock);
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn in_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: OrderDetailId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price captured at purchase time.
    pub unit_price: Money,
}

impl OrderDetail {
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A placed order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub order_date: DateTime<Utc>,
    pub requested_delivery_date: NaiveDate,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub total: Money,
    pub details: Vec<OrderDetail>,
    pub version: Version,
}

/// A line to insert along with a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderDetail {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

impl NewOrderDetail {
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// An order to insert. Always starts out Pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub order_date: DateTime<Utc>,
    pub requested_delivery_date: NaiveDate,
    pub notes: Option<String>,
    pub total: Money,
    pub details: Vec<NewOrderDetail>,
}

impl NewOrder {
    /// Materializes the inserted row once ids have been assigned.
    pub(crate) fn into_order(self, id: OrderId, detail_ids: &[OrderDetailId]) -> Order {
        let details = self
            .details
            .into_iter()
            .zip(detail_ids)
            .map(|(line, detail_id)| OrderDetail {
                id: *detail_id,
                order_id: id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();

        Order {
            id,
            customer_email: self.customer_email,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            order_date: self.order_date,
            requested_delivery_date: self.requested_delivery_date,
            notes: self.notes,
            status: OrderStatus::Pending,
            total: self.total,
            details,
            version: Version::first(),
        }
    }
}

/// A signed change to one product's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockDelta {
    pub product_id: ProductId,
    pub delta: i64,
}

/// A version-checked status write, committed together with its stock deltas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub order_id: OrderId,
    pub expected_version: Version,
    pub status: OrderStatus,
    pub stock_deltas: Vec<StockDelta>,
}

/// Which orders to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderFilter {
    #[default]
    All,
    /// Orders that are neither Completed nor Cancelled.
    Active,
    Status(OrderStatus),
}

impl OrderFilter {
    pub fn matches(&self, status: OrderStatus) -> bool {
        match self {
            OrderFilter::All => true,
            OrderFilter::Active => !status.is_terminal(),
            OrderFilter::Status(wanted) => *wanted == status,
        }
    }
}
