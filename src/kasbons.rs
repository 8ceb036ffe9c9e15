use crate::billing::Kasbon;
use crate::customers::ensure_customer;
use crate::error::{AppError, AppResult};
use crate::extractor::AuthUser;
use crate::orders::RecordFilter;
use axum::extract::{Path, Query};
use axum::{routing::get, Extension, Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;

const MAX_ITEM_NAME_LEN: usize = 200;
const KASBON_COLUMNS: &str =
    "id, customer_id, date, item_name, quantity, unit_price, total_amount";

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct KasbonPayload {
    pub date: NaiveDate,
    pub customer_id: i32,
    pub item_name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub unit_price: i64,
}

impl KasbonPayload {
    /// `quantity * unit_price` after validating both are positive.
    pub fn total_amount(&self) -> AppResult<i64> {
        if self.item_name.trim().is_empty() {
            return Err(AppError::BadRequest("item_name required".into()));
        }
        if self.item_name.trim().chars().count() > MAX_ITEM_NAME_LEN {
            return Err(AppError::BadRequest(format!(
                "item_name must be at most {MAX_ITEM_NAME_LEN} characters"
            )));
        }
        if self.quantity < 1 {
            return Err(AppError::BadRequest("quantity must be at least 1".into()));
        }
        if self.unit_price < 1 {
            return Err(AppError::BadRequest("unit_price must be at least 1".into()));
        }
        self.quantity
            .checked_mul(self.unit_price)
            .ok_or_else(|| AppError::BadRequest("kasbon total too large".into()))
    }
}

pub fn routes() -> Router {
    Router::new()
        .route("/api/kasbons", get(list_kasbons).post(create_kasbon))
        .route(
            "/api/kasbons/:id",
            get(get_kasbon).put(update_kasbon).delete(delete_kasbon),
        )
}

pub async fn list_kasbons(
    Extension(pool): Extension<PgPool>,
    Query(filter): Query<RecordFilter>,
) -> AppResult<Json<Vec<Kasbon>>> {
    let kasbons = sqlx::query_as::<_, Kasbon>(&format!(
        "SELECT {KASBON_COLUMNS} FROM kasbons \
         WHERE ($1::INT IS NULL OR customer_id = $1) ORDER BY date DESC, id DESC"
    ))
    .bind(filter.customer_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!(?e, "DB error listing kasbons");
        AppError::Db(e)
    })?;
    Ok(Json(kasbons))
}

pub async fn get_kasbon(
    Extension(pool): Extension<PgPool>,
    Path(id): Path<i32>,
) -> AppResult<Json<Kasbon>> {
    let kasbon = sqlx::query_as::<_, Kasbon>(&format!(
        "SELECT {KASBON_COLUMNS} FROM kasbons WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Kasbon not found".into()))?;
    Ok(Json(kasbon))
}

pub async fn create_kasbon(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
    Json(payload): Json<KasbonPayload>,
) -> AppResult<Json<Kasbon>> {
    let total = payload.total_amount()?;
    ensure_customer(&pool, payload.customer_id).await?;
    let kasbon = sqlx::query_as::<_, Kasbon>(&format!(
        "INSERT INTO kasbons (date, customer_id, item_name, quantity, unit_price, total_amount) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {KASBON_COLUMNS}"
    ))
    .bind(payload.date)
    .bind(payload.customer_id)
    .bind(payload.item_name.trim())
    .bind(payload.quantity)
    .bind(payload.unit_price)
    .bind(total)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!(?e, "DB error creating kasbon");
        AppError::Db(e)
    })?;
    tracing::info!(
        kasbon_id = kasbon.id,
        customer_id = kasbon.customer_id,
        total_amount = kasbon.total_amount,
        actor = user.user_id,
        "kasbon recorded"
    );
    Ok(Json(kasbon))
}

/// Recomputes `total_amount` so an edited quantity or price never leaves a stale total.
pub async fn update_kasbon(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<KasbonPayload>,
) -> AppResult<Json<Kasbon>> {
    let total = payload.total_amount()?;
    ensure_customer(&pool, payload.customer_id).await?;
    let kasbon = sqlx::query_as::<_, Kasbon>(&format!(
        "UPDATE kasbons SET date = $2, customer_id = $3, item_name = $4, quantity = $5, \
         unit_price = $6, total_amount = $7 WHERE id = $1 RETURNING {KASBON_COLUMNS}"
    ))
    .bind(id)
    .bind(payload.date)
    .bind(payload.customer_id)
    .bind(payload.item_name.trim())
    .bind(payload.quantity)
    .bind(payload.unit_price)
    .bind(total)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Kasbon not found".into()))?;
    tracing::info!(kasbon_id = id, actor = user.user_id, "kasbon updated");
    Ok(Json(kasbon))
}

pub async fn delete_kasbon(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM kasbons WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Kasbon not found".into()));
    }
    tracing::warn!(kasbon_id = id, actor = user.user_id, "kasbon deleted");
    Ok(())
}
