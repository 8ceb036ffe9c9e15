use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use super::models::{Customer, DailyOrder, DateWindow, Kasbon, Payment};

/// key: billing-store -> read side of the customer ledger
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn customer(&self, customer_id: i32) -> Result<Option<Customer>>;
    async fn orders(&self, customer_id: i32, window: DateWindow) -> Result<Vec<DailyOrder>>;
    async fn kasbons(&self, customer_id: i32, window: DateWindow) -> Result<Vec<Kasbon>>;
    async fn payments(&self, customer_id: i32, window: DateWindow) -> Result<Vec<Payment>>;
}

pub type LedgerHandle = Arc<dyn LedgerStore>;

/// key: billing-store-postgres -> sqlx implementation
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn handle(pool: PgPool) -> LedgerHandle {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn customer(&self, customer_id: i32) -> Result<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, price_per_bundle, portions_per_bundle, created_at FROM customers WHERE id = $1",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    async fn orders(&self, customer_id: i32, window: DateWindow) -> Result<Vec<DailyOrder>> {
        let orders = sqlx::query_as::<_, DailyOrder>(
            r#"
            SELECT id, customer_id, date, morning_portions, afternoon_portions,
                   evening_portions, total_portions
            FROM daily_orders
            WHERE customer_id = $1
              AND ($2::DATE IS NULL OR date >= $2)
              AND ($3::DATE IS NULL OR date <= $3)
            ORDER BY date ASC, id ASC
            "#,
        )
        .bind(customer_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn kasbons(&self, customer_id: i32, window: DateWindow) -> Result<Vec<Kasbon>> {
        let kasbons = sqlx::query_as::<_, Kasbon>(
            r#"
            SELECT id, customer_id, date, item_name, quantity, unit_price, total_amount
            FROM kasbons
            WHERE customer_id = $1
              AND ($2::DATE IS NULL OR date >= $2)
              AND ($3::DATE IS NULL OR date <= $3)
            ORDER BY date ASC, id ASC
            "#,
        )
        .bind(customer_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(kasbons)
    }

    async fn payments(&self, customer_id: i32, window: DateWindow) -> Result<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, customer_id, date, amount, description
            FROM payments
            WHERE customer_id = $1
              AND ($2::DATE IS NULL OR date >= $2)
              AND ($3::DATE IS NULL OR date <= $3)
            ORDER BY date ASC, id ASC
            "#,
        )
        .bind(customer_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }
}
