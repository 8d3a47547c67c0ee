use async_trait::async_trait;
use common::{OrderId, Version};
use domain::Order;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{OrderStore, Result, StoreError};

/// PostgreSQL-backed order store.
///
/// Orders are stored as JSONB documents keyed by sequence number, with the
/// version in its own column so the compare-and-swap on update stays in SQL.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        tracing::info!("running order store migrations");
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let doc: serde_json::Value = row.try_get("doc")?;
        let version: i64 = row.try_get("version")?;
        let mut order: Order = serde_json::from_value(doc)?;
        order.set_version(Version::new(version));
        Ok(order)
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: &mut Order) -> Result<()> {
        order.set_version(Version::first());
        let doc = serde_json::to_value(&*order)?;

        let result = sqlx::query(
            r#"
            INSERT INTO orders (order_seq, version, doc)
            VALUES ($1, $2, $3)
            ON CONFLICT (order_seq) DO NOTHING
            "#,
        )
        .bind(order.id().sequence() as i64)
        .bind(order.version().as_i64())
        .bind(&doc)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(order.id()));
        }
        Ok(())
    }

    async fn update(&self, order: &mut Order) -> Result<()> {
        let expected = order.version();
        let next = expected.next();
        order.set_version(next);
        let doc = serde_json::to_value(&*order)?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET version = $3, doc = $4, updated_at = now()
            WHERE order_seq = $1 AND version = $2
            "#,
        )
        .bind(order.id().sequence() as i64)
        .bind(expected.as_i64())
        .bind(next.as_i64())
        .bind(&doc)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a missing row from a version mismatch.
            order.set_version(expected);
            let actual: Option<i64> =
                sqlx::query_scalar("SELECT version FROM orders WHERE order_seq = $1")
                    .bind(order.id().sequence() as i64)
                    .fetch_optional(&self.pool)
                    .await?;

            return match actual {
                None => Err(StoreError::NotFound(order.id())),
                Some(actual) => Err(StoreError::ConcurrencyConflict {
                    order_id: order.id(),
                    expected,
                    actual: Version::new(actual),
                }),
            };
        }
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT version, doc FROM orders WHERE order_seq = $1")
            .bind(order_id.sequence() as i64)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query("SELECT version, doc FROM orders ORDER BY order_seq")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn max_order_sequence(&self) -> Result<u64> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(order_seq) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(max.unwrap_or(0) as u64)
    }
}
