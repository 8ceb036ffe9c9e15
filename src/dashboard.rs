use crate::billing::{Kasbon, Payment};
use crate::error::AppResult;
use axum::{routing::get, Extension, Json, Router};
use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

const RECENT_ORDER_LIMIT: i64 = 10;
const RECENT_LEDGER_LIMIT: i64 = 5;

#[derive(Debug, Serialize, FromRow)]
pub struct RecentOrder {
    pub id: i32,
    pub date: NaiveDate,
    pub customer_id: i32,
    pub customer_name: String,
    pub morning_portions: i64,
    pub afternoon_portions: i64,
    pub evening_portions: i64,
    pub total_portions: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub today: NaiveDate,
    pub total_customers: i64,
    pub today_orders_count: i64,
    pub today_total_portions: i64,
    pub total_kasbon: i64,
    pub monthly_revenue: i64,
    pub recent_orders: Vec<RecentOrder>,
    pub recent_kasbons: Vec<Kasbon>,
    pub recent_payments: Vec<Payment>,
}

pub fn routes() -> Router {
    Router::new().route("/api/dashboard", get(dashboard))
}

/// First day of `today`'s month and first day of the following month.
pub fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today.with_day(1).unwrap_or(today);
    let (year, month) = if start.month() == 12 {
        (start.year() + 1, 1)
    } else {
        (start.year(), start.month() + 1)
    };
    let end = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(start);
    (start, end)
}

pub async fn dashboard(Extension(pool): Extension<PgPool>) -> AppResult<Json<DashboardStats>> {
    let today = Local::now().date_naive();
    Ok(Json(load_stats(&pool, today).await?))
}

pub async fn load_stats(pool: &PgPool, today: NaiveDate) -> AppResult<DashboardStats> {
    let total_customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
        .fetch_one(pool)
        .await?;

    let (today_orders_count, today_total_portions): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(total_portions), 0)::BIGINT FROM daily_orders WHERE date = $1",
    )
    .bind(today)
    .fetch_one(pool)
    .await?;

    let total_kasbon: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(total_amount), 0)::BIGINT FROM kasbons")
            .fetch_one(pool)
            .await?;

    let (month_start, month_end) = month_bounds(today);
    let monthly_revenue: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM payments WHERE date >= $1 AND date < $2",
    )
    .bind(month_start)
    .bind(month_end)
    .fetch_one(pool)
    .await?;

    let since = today - Duration::days(*crate::config::DASHBOARD_RECENT_DAYS);
    let recent_orders = sqlx::query_as::<_, RecentOrder>(
        r#"
        SELECT o.id, o.date, o.customer_id, c.name AS customer_name,
               o.morning_portions, o.afternoon_portions, o.evening_portions, o.total_portions
        FROM daily_orders o
        JOIN customers c ON c.id = o.customer_id
        WHERE o.date >= $1
        ORDER BY o.date DESC, o.id DESC
        LIMIT $2
        "#,
    )
    .bind(since)
    .bind(RECENT_ORDER_LIMIT)
    .fetch_all(pool)
    .await?;

    let recent_kasbons = sqlx::query_as::<_, Kasbon>(
        "SELECT id, customer_id, date, item_name, quantity, unit_price, total_amount \
         FROM kasbons ORDER BY date DESC, id DESC LIMIT $1",
    )
    .bind(RECENT_LEDGER_LIMIT)
    .fetch_all(pool)
    .await?;

    let recent_payments = sqlx::query_as::<_, Payment>(
        "SELECT id, customer_id, date, amount, description \
         FROM payments ORDER BY date DESC, id DESC LIMIT $1",
    )
    .bind(RECENT_LEDGER_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(DashboardStats {
        today,
        total_customers,
        today_orders_count,
        today_total_portions,
        total_kasbon,
        monthly_revenue,
        recent_orders,
        recent_kasbons,
        recent_payments,
    })
}
