use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, LineId, OrderId, ProductId};
use domain::{
    LineRecord, Money, Order, OrderNumber, OrderRecord, OrderRepository, OrderStatus,
    ProductSnapshot, RepositoryError,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::error::{Result, StoreError};

const ORDER_COLUMNS: &str =
    "id, order_number, user_id, status, shipping_address, notes, created_at, updated_at";

type RepoResult<T> = std::result::Result<T, RepositoryError>;

/// Row selection used by the order queries.
#[derive(Debug, Clone, Copy)]
enum OrderFilter<'a> {
    All,
    Id(OrderId),
    Number(&'a str),
    Customer(CustomerId),
    Status(OrderStatus),
}

impl OrderFilter<'_> {
    fn where_clause(&self) -> &'static str {
        match self {
            OrderFilter::All => "",
            OrderFilter::Id(_) => " WHERE id = $1",
            OrderFilter::Number(_) => " WHERE order_number = $1",
            OrderFilter::Customer(_) => " WHERE user_id = $1",
            OrderFilter::Status(_) => " WHERE status = $1",
        }
    }
}

/// PostgreSQL-backed order repository.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Creates a new PostgreSQL order repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool to `database_url` and wraps it.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn fetch(&self, filter: OrderFilter<'_>) -> Result<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders{} ORDER BY id ASC",
            filter.where_clause()
        );

        let query = sqlx::query(&sql);
        let query = match filter {
            OrderFilter::All => query,
            OrderFilter::Id(id) => query.bind(id.as_i64()),
            OrderFilter::Number(number) => query.bind(number),
            OrderFilter::Customer(customer_id) => query.bind(customer_id.as_i64()),
            OrderFilter::Status(status) => query.bind(status.as_str()),
        };

        let rows = query.fetch_all(&self.pool).await?;
        self.hydrate(rows).await
    }

    /// Maps order rows and attaches their lines with a single follow-up query.
    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        let mut records = rows
            .iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = records
            .iter()
            .filter_map(|record| record.id.map(|id| id.as_i64()))
            .collect();

        let line_rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, product_sku, quantity, unit_price, total_price
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id ASC, position ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut lines: HashMap<i64, Vec<LineRecord>> = HashMap::new();
        for row in &line_rows {
            let order_id: i64 = row.try_get("order_id")?;
            lines
                .entry(order_id)
                .or_default()
                .push(Self::row_to_line(row)?);
        }

        for record in &mut records {
            if let Some(id) = record.id {
                record.lines = lines.remove(&id.as_i64()).unwrap_or_default();
            }
        }

        records
            .into_iter()
            .map(|record| Order::from_record(record).map_err(StoreError::from))
            .collect()
    }

    /// Writes the order row and replaces its lines inside one transaction.
    async fn store(&self, order: Order) -> Result<OrderId> {
        let total = order.total_amount();
        let record = order.into_record();
        let number = record
            .order_number
            .as_ref()
            .map(|n| n.as_str().to_string())
            .ok_or_else(|| StoreError::InvalidColumn {
                column: "order_number",
                value: "<missing>".to_string(),
            })?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let id = match record.id {
            None => sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO orders (order_number, user_id, status, total_amount, shipping_address, notes, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING id
                "#,
            )
            .bind(&number)
            .bind(record.customer_id.as_i64())
            .bind(record.status.as_str())
            .bind(total.cents())
            .bind(&record.shipping_address)
            .bind(&record.notes)
            .bind(record.created_at.unwrap_or(now))
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| StoreError::from_write(e, &number))?,
            Some(id) => {
                let updated = sqlx::query(
                    r#"
                    UPDATE orders
                    SET order_number = $2, user_id = $3, status = $4, total_amount = $5,
                        shipping_address = $6, notes = $7, updated_at = $8
                    WHERE id = $1
                    "#,
                )
                .bind(id.as_i64())
                .bind(&number)
                .bind(record.customer_id.as_i64())
                .bind(record.status.as_str())
                .bind(total.cents())
                .bind(&record.shipping_address)
                .bind(&record.notes)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::from_write(e, &number))?;

                if updated.rows_affected() == 0 {
                    return Err(StoreError::MissingRow(id.as_i64()));
                }

                sqlx::query("DELETE FROM order_items WHERE order_id = $1")
                    .bind(id.as_i64())
                    .execute(&mut *tx)
                    .await?;

                id.as_i64()
            }
        };

        Self::insert_lines(&mut tx, id, &record.lines).await?;

        tx.commit().await?;
        Ok(OrderId::new(id))
    }

    async fn insert_lines(
        tx: &mut Transaction<'_, Postgres>,
        order_id: i64,
        lines: &[LineRecord],
    ) -> Result<()> {
        for (position, line) in lines.iter().enumerate() {
            let quantity = i32::try_from(line.quantity).map_err(|_| StoreError::InvalidColumn {
                column: "quantity",
                value: line.quantity.to_string(),
            })?;

            // Existing lines keep their ids; new ones draw from the sequence.
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, product_name, product_sku, quantity, unit_price, total_price, position)
                VALUES (COALESCE($1, nextval(pg_get_serial_sequence('order_items', 'id'))), $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(line.id.map(|id| id.as_i64()))
            .bind(order_id)
            .bind(line.product.product_id.as_i64())
            .bind(&line.product.name)
            .bind(&line.product.sku)
            .bind(quantity)
            .bind(line.unit_price.cents())
            .bind(line.total_price.map(|total| total.cents()))
            .bind(position as i32)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    fn row_to_order(row: &PgRow) -> Result<OrderRecord> {
        let raw_status: String = row.try_get("status")?;
        let status = OrderStatus::from_str(&raw_status).map_err(|_| StoreError::InvalidColumn {
            column: "status",
            value: raw_status.clone(),
        })?;

        Ok(OrderRecord {
            id: Some(OrderId::new(row.try_get("id")?)),
            order_number: Some(OrderNumber::new(row.try_get::<String, _>("order_number")?)),
            customer_id: CustomerId::new(row.try_get("user_id")?),
            status,
            shipping_address: row.try_get("shipping_address")?,
            notes: row.try_get("notes")?,
            lines: Vec::new(),
            created_at: Some(row.try_get::<DateTime<Utc>, _>("created_at")?),
            updated_at: Some(row.try_get::<DateTime<Utc>, _>("updated_at")?),
        })
    }

    fn row_to_line(row: &PgRow) -> Result<LineRecord> {
        let raw_quantity: i32 = row.try_get("quantity")?;
        let quantity = u32::try_from(raw_quantity).map_err(|_| StoreError::InvalidColumn {
            column: "quantity",
            value: raw_quantity.to_string(),
        })?;

        Ok(LineRecord {
            id: Some(LineId::new(row.try_get("id")?)),
            product: ProductSnapshot::new(
                ProductId::new(row.try_get("product_id")?),
                row.try_get::<String, _>("product_name")?,
                row.try_get::<String, _>("product_sku")?,
            ),
            quantity,
            unit_price: Money::from_cents(row.try_get("unit_price")?),
            total_price: row
                .try_get::<Option<i64>, _>("total_price")?
                .map(Money::from_cents),
        })
    }

    async fn first(&self, filter: OrderFilter<'_>) -> Result<Option<Order>> {
        Ok(self.fetch(filter).await?.into_iter().next())
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    #[tracing::instrument(skip(self, order), fields(order_id = ?order.id()))]
    async fn save(&self, order: Order) -> RepoResult<Order> {
        let id = self.store(order).await?;
        tracing::debug!(%id, "order row written");

        Ok(self
            .first(OrderFilter::Id(id))
            .await?
            .ok_or(StoreError::MissingRow(id.as_i64()))?)
    }

    async fn find_by_id(&self, id: OrderId) -> RepoResult<Option<Order>> {
        Ok(self.first(OrderFilter::Id(id)).await?)
    }

    async fn find_by_order_number(&self, number: &OrderNumber) -> RepoResult<Option<Order>> {
        Ok(self.first(OrderFilter::Number(number.as_str())).await?)
    }

    async fn find_all(&self) -> RepoResult<Vec<Order>> {
        Ok(self.fetch(OrderFilter::All).await?)
    }

    async fn find_by_customer(&self, customer_id: CustomerId) -> RepoResult<Vec<Order>> {
        Ok(self.fetch(OrderFilter::Customer(customer_id)).await?)
    }

    async fn find_by_status(&self, status: OrderStatus) -> RepoResult<Vec<Order>> {
        Ok(self.fetch(OrderFilter::Status(status)).await?)
    }

    async fn delete_by_id(&self, id: OrderId) -> RepoResult<()> {
        // Lines go with the order through ON DELETE CASCADE.
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn exists_by_order_number(&self, number: &OrderNumber) -> RepoResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE order_number = $1)")
                .bind(number.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(StoreError::from)?;
        Ok(exists)
    }
}
