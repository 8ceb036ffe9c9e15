use crate::billing::Payment;
use crate::customers::ensure_customer;
use crate::error::{AppError, AppResult};
use crate::extractor::AuthUser;
use crate::orders::RecordFilter;
use axum::extract::{Path, Query};
use axum::{routing::get, Extension, Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;

const PAYMENT_COLUMNS: &str = "id, customer_id, date, amount, description";

#[derive(Debug, Deserialize)]
pub struct PaymentPayload {
    pub date: NaiveDate,
    pub customer_id: i32,
    pub amount: i64,
    #[serde(default)]
    pub description: Option<String>,
}

impl PaymentPayload {
    pub fn validate(&self) -> AppResult<()> {
        if self.amount < 1 {
            return Err(AppError::BadRequest("amount must be at least 1".into()));
        }
        Ok(())
    }

    fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

pub fn routes() -> Router {
    Router::new()
        .route("/api/payments", get(list_payments).post(create_payment))
        .route(
            "/api/payments/:id",
            get(get_payment).put(update_payment).delete(delete_payment),
        )
}

pub async fn list_payments(
    Extension(pool): Extension<PgPool>,
    Query(filter): Query<RecordFilter>,
) -> AppResult<Json<Vec<Payment>>> {
    let payments = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments \
         WHERE ($1::INT IS NULL OR customer_id = $1) ORDER BY date DESC, id DESC"
    ))
    .bind(filter.customer_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!(?e, "DB error listing payments");
        AppError::Db(e)
    })?;
    Ok(Json(payments))
}

pub async fn get_payment(
    Extension(pool): Extension<PgPool>,
    Path(id): Path<i32>,
) -> AppResult<Json<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Payment not found".into()))?;
    Ok(Json(payment))
}

pub async fn create_payment(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
    Json(payload): Json<PaymentPayload>,
) -> AppResult<Json<Payment>> {
    payload.validate()?;
    ensure_customer(&pool, payload.customer_id).await?;
    let payment = sqlx::query_as::<_, Payment>(&format!(
        "INSERT INTO payments (date, customer_id, amount, description) \
         VALUES ($1, $2, $3, $4) RETURNING {PAYMENT_COLUMNS}"
    ))
    .bind(payload.date)
    .bind(payload.customer_id)
    .bind(payload.amount)
    .bind(payload.description())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!(?e, "DB error creating payment");
        AppError::Db(e)
    })?;
    tracing::info!(
        payment_id = payment.id,
        customer_id = payment.customer_id,
        amount = payment.amount,
        actor = user.user_id,
        "payment recorded"
    );
    Ok(Json(payment))
}

pub async fn update_payment(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<PaymentPayload>,
) -> AppResult<Json<Payment>> {
    payload.validate()?;
    ensure_customer(&pool, payload.customer_id).await?;
    let payment = sqlx::query_as::<_, Payment>(&format!(
        "UPDATE payments SET date = $2, customer_id = $3, amount = $4, description = $5 \
         WHERE id = $1 RETURNING {PAYMENT_COLUMNS}"
    ))
    .bind(id)
    .bind(payload.date)
    .bind(payload.customer_id)
    .bind(payload.amount)
    .bind(payload.description())
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Payment not found".into()))?;
    tracing::info!(payment_id = id, actor = user.user_id, "payment updated");
    Ok(Json(payment))
}

pub async fn delete_payment(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM payments WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Payment not found".into()));
    }
    tracing::warn!(payment_id = id, actor = user.user_id, "payment deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_must_be_positive() {
        let mut payload = PaymentPayload {
            date: NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(),
            customer_id: 1,
            amount: 0,
            description: None,
        };
        assert!(payload.validate().is_err());
        payload.amount = 50_000;
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn blank_description_stored_as_null() {
        let payload = PaymentPayload {
            date: NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(),
            customer_id: 1,
            amount: 10_000,
            description: Some("   ".into()),
        };
        assert_eq!(payload.description(), None);
    }
}
