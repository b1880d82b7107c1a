use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};

use crate::{
    Category, CategoryId, Money, NewOrder, NewProduct, Order, OrderDetail, OrderDetailId,
    OrderFilter, OrderId, OrderStatus, Product, ProductId, Result, StatusUpdate, StoreError,
    Version,
    store::{Store, validate_new_order},
};

const ORDER_COLUMNS: &str = "id, customer_email, customer_name, customer_phone, order_date, \
     requested_delivery_date, notes, status, total, version";

const PRODUCT_COLUMNS: &str = "id, name, price, image_url, stock, category_id";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price")?),
            image_url: row.try_get("image_url")?,
            stock: row.try_get("stock")?,
            category_id: row
                .try_get::<Option<i64>, _>("category_id")?
                .map(CategoryId::new),
        })
    }

    /// Maps an order row; lines are attached by the caller.
    fn row_to_order(row: &PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            customer_email: row.try_get("customer_email")?,
            customer_name: row.try_get("customer_name")?,
            customer_phone: row.try_get("customer_phone")?,
            order_date: row.try_get("order_date")?,
            requested_delivery_date: row.try_get("requested_delivery_date")?,
            notes: row.try_get("notes")?,
            status,
            total: Money::from_cents(row.try_get("total")?),
            details: Vec::new(),
            version: Version::new(row.try_get("version")?),
        })
    }

    fn row_to_detail(row: &PgRow) -> Result<OrderDetail> {
        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| StoreError::Corrupt(format!("quantity out of range: {quantity}")))?;

        Ok(OrderDetail {
            id: OrderDetailId::new(row.try_get("id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity,
            unit_price: Money::from_cents(row.try_get("price")?),
        })
    }

    async fn fetch_order(conn: &mut PgConnection, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&mut *conn)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut order = Self::row_to_order(&row)?;

        let detail_rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, price
            FROM order_details
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(id.as_i64())
        .fetch_all(&mut *conn)
        .await?;

        order.details = detail_rows
            .iter()
            .map(Self::row_to_detail)
            .collect::<Result<_>>()?;
        Ok(Some(order))
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_category(&self, name: &str) -> Result<Category> {
        let id: i64 = sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(Category {
            id: CategoryId::new(id),
            name: name.to_string(),
        })
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let name: Option<String> = sqlx::query_scalar("SELECT name FROM categories WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        Ok(name.map(|name| Category { id, name }))
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (name, price, image_url, stock, category_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(&product.image_url)
        .bind(product.stock)
        .bind(product.category_id.map(|id| id.as_i64()))
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_product(row)
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProductNotFound(id));
        }
        Ok(())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        validate_new_order(&order)?;

        // Start a transaction
        let mut tx = self.pool.begin().await?;

        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (customer_email, customer_name, customer_phone, order_date,
                                requested_delivery_date, notes, status, total, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&order.customer_email)
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(order.order_date)
        .bind(order.requested_delivery_date)
        .bind(&order.notes)
        .bind(OrderStatus::Pending.as_str())
        .bind(order.total.cents())
        .bind(Version::first().as_i64())
        .fetch_one(&mut *tx)
        .await?;

        let mut detail_ids = Vec::with_capacity(order.details.len());
        for line in &order.details {
            let detail_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO order_details (order_id, product_id, quantity, price)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(order_id)
            .bind(line.product_id.as_i64())
            .bind(i64::from(line.quantity))
            .bind(line.unit_price.cents())
            .fetch_one(&mut *tx)
            .await?;
            detail_ids.push(OrderDetailId::new(detail_id));
        }

        tx.commit().await?;
        Ok(order.into_order(OrderId::new(order_id), &detail_ids))
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_order(&mut *conn, id).await
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders");
        match filter {
            OrderFilter::All => {}
            OrderFilter::Active => sql.push_str(" WHERE status NOT IN ($1, $2)"),
            OrderFilter::Status(_) => sql.push_str(" WHERE status = $1"),
        }
        sql.push_str(" ORDER BY order_date DESC, id DESC");

        let mut query = sqlx::query(&sql);
        match filter {
            OrderFilter::All => {}
            OrderFilter::Active => {
                query = query
                    .bind(OrderStatus::Completed.as_str())
                    .bind(OrderStatus::Cancelled.as_str());
            }
            OrderFilter::Status(status) => query = query.bind(status.as_str()),
        }

        let rows = query.fetch_all(&self.pool).await?;
        let mut orders = rows
            .iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<i64> = orders.iter().map(|o| o.id.as_i64()).collect();
        let detail_rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, price
            FROM order_details
            WHERE order_id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderDetail>> = HashMap::new();
        for row in &detail_rows {
            let detail = Self::row_to_detail(row)?;
            by_order.entry(detail.order_id).or_default().push(detail);
        }
        for order in &mut orders {
            order.details = by_order.remove(&order.id).unwrap_or_default();
        }

        Ok(orders)
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(id));
        }
        Ok(())
    }

    async fn update_order_status(&self, update: StatusUpdate) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE orders
            SET status = $1, version = version + 1
            WHERE id = $2 AND version = $3
            RETURNING id
            "#,
        )
        .bind(update.status.as_str())
        .bind(update.order_id.as_i64())
        .bind(update.expected_version.as_i64())
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                .bind(update.order_id.as_i64())
                .fetch_optional(&mut *tx)
                .await?;

            // Dropping the transaction rolls it back
            return Err(StoreError::ConcurrencyConflict {
                order_id: update.order_id,
                expected: update.expected_version,
                actual: actual.map(Version::new),
            });
        }

        for delta in &update.stock_deltas {
            let result = sqlx::query(
                "UPDATE products SET stock = stock + $1 WHERE id = $2 AND stock IS NOT NULL",
            )
            .bind(delta.delta)
            .bind(delta.product_id.as_i64())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tracing::debug!(
                    product_id = %delta.product_id,
                    "skipping stock delta for missing or untracked product"
                );
            }
        }

        let order = Self::fetch_order(&mut *tx, update.order_id)
            .await?
            .ok_or(StoreError::OrderNotFound(update.order_id))?;

        tx.commit().await?;
        Ok(order)
    }
}
