use crate::billing::DailyOrder;
use crate::customers::ensure_customer;
use crate::error::{AppError, AppResult};
use crate::extractor::AuthUser;
use axum::extract::{Path, Query};
use axum::{routing::get, Extension, Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;

const ORDER_COLUMNS: &str = "id, customer_id, date, morning_portions, afternoon_portions, \
                             evening_portions, total_portions";

#[derive(Debug, Deserialize)]
pub struct OrderPayload {
    pub date: NaiveDate,
    pub customer_id: i32,
    #[serde(default)]
    pub morning_portions: i64,
    #[serde(default)]
    pub afternoon_portions: i64,
    #[serde(default)]
    pub evening_portions: i64,
}

impl OrderPayload {
    /// Total portions for the day; every period count must be non-negative.
    pub fn total_portions(&self) -> AppResult<i64> {
        let periods = [
            ("morning_portions", self.morning_portions),
            ("afternoon_portions", self.afternoon_portions),
            ("evening_portions", self.evening_portions),
        ];
        for (field, value) in periods {
            if value < 0 {
                return Err(AppError::BadRequest(format!("{field} must not be negative")));
            }
        }
        periods
            .iter()
            .try_fold(0i64, |acc, (_, value)| acc.checked_add(*value))
            .ok_or_else(|| AppError::BadRequest("portion counts too large".into()))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordFilter {
    #[serde(default)]
    pub customer_id: Option<i32>,
}

pub fn routes() -> Router {
    Router::new()
        .route("/api/orders", get(list_orders).post(create_order))
        .route(
            "/api/orders/:id",
            get(get_order).put(update_order).delete(delete_order),
        )
}

pub async fn list_orders(
    Extension(pool): Extension<PgPool>,
    Query(filter): Query<RecordFilter>,
) -> AppResult<Json<Vec<DailyOrder>>> {
    let orders = sqlx::query_as::<_, DailyOrder>(&format!(
        "SELECT {ORDER_COLUMNS} FROM daily_orders \
         WHERE ($1::INT IS NULL OR customer_id = $1) ORDER BY date DESC, id DESC"
    ))
    .bind(filter.customer_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!(?e, "DB error listing orders");
        AppError::Db(e)
    })?;
    Ok(Json(orders))
}

pub async fn get_order(
    Extension(pool): Extension<PgPool>,
    Path(id): Path<i32>,
) -> AppResult<Json<DailyOrder>> {
    let order = sqlx::query_as::<_, DailyOrder>(&format!(
        "SELECT {ORDER_COLUMNS} FROM daily_orders WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".into()))?;
    Ok(Json(order))
}

pub async fn create_order(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
    Json(payload): Json<OrderPayload>,
) -> AppResult<Json<DailyOrder>> {
    let total = payload.total_portions()?;
    ensure_customer(&pool, payload.customer_id).await?;
    let order = sqlx::query_as::<_, DailyOrder>(&format!(
        "INSERT INTO daily_orders \
         (date, customer_id, morning_portions, afternoon_portions, evening_portions, total_portions) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ORDER_COLUMNS}"
    ))
    .bind(payload.date)
    .bind(payload.customer_id)
    .bind(payload.morning_portions)
    .bind(payload.afternoon_portions)
    .bind(payload.evening_portions)
    .bind(total)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!(?e, "DB error creating order");
        AppError::Db(e)
    })?;
    tracing::info!(
        order_id = order.id,
        customer_id = order.customer_id,
        actor = user.user_id,
        "order recorded"
    );
    Ok(Json(order))
}

/// Recomputes `total_portions` from the submitted period counts.
pub async fn update_order(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<OrderPayload>,
) -> AppResult<Json<DailyOrder>> {
    let total = payload.total_portions()?;
    ensure_customer(&pool, payload.customer_id).await?;
    let order = sqlx::query_as::<_, DailyOrder>(&format!(
        "UPDATE daily_orders SET date = $2, customer_id = $3, morning_portions = $4, \
         afternoon_portions = $5, evening_portions = $6, total_portions = $7 \
         WHERE id = $1 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(id)
    .bind(payload.date)
    .bind(payload.customer_id)
    .bind(payload.morning_portions)
    .bind(payload.afternoon_portions)
    .bind(payload.evening_portions)
    .bind(total)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".into()))?;
    tracing::info!(order_id = id, actor = user.user_id, "order updated");
    Ok(Json(order))
}

pub async fn delete_order(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM daily_orders WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Order not found".into()));
    }
    tracing::warn!(order_id = id, actor = user.user_id, "order deleted");
    Ok(())
}
