use crate::billing::{Customer, PricingConfig};
use crate::error::{AppError, AppResult};
use crate::extractor::AuthUser;
use axum::extract::Path;
use axum::{routing::get, Extension, Json, Router};
use serde::Deserialize;
use sqlx::PgPool;

const MAX_NAME_LEN: usize = 100;
const CUSTOMER_COLUMNS: &str = "id, name, price_per_bundle, portions_per_bundle, created_at";

#[derive(Debug, Deserialize)]
pub struct CustomerPayload {
    pub name: String,
    #[serde(default)]
    pub price_per_bundle: Option<i64>,
    #[serde(default)]
    pub portions_per_bundle: Option<i64>,
}

impl CustomerPayload {
    /// Fills missing pricing from `fallback`. Price and bundle size must be at least 1.
    pub fn resolve(&self, fallback: PricingConfig) -> AppResult<(String, PricingConfig)> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Name required".into()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::BadRequest(format!(
                "Name must be at most {MAX_NAME_LEN} characters"
            )));
        }
        let pricing = PricingConfig {
            price_per_bundle: self.price_per_bundle.unwrap_or(fallback.price_per_bundle),
            portions_per_bundle: self
                .portions_per_bundle
                .unwrap_or(fallback.portions_per_bundle),
        };
        if pricing.price_per_bundle < 1 {
            return Err(AppError::BadRequest(
                "price_per_bundle must be at least 1".into(),
            ));
        }
        if pricing.portions_per_bundle < 1 {
            return Err(AppError::BadRequest(
                "portions_per_bundle must be at least 1".into(),
            ));
        }
        Ok((name.to_string(), pricing))
    }
}

pub fn default_pricing() -> PricingConfig {
    PricingConfig {
        price_per_bundle: *crate::config::DEFAULT_PRICE_PER_BUNDLE,
        portions_per_bundle: *crate::config::DEFAULT_PORTIONS_PER_BUNDLE,
    }
}

pub fn routes() -> Router {
    Router::new()
        .route("/api/customers", get(list_customers).post(create_customer))
        .route(
            "/api/customers/:id",
            get(get_customer)
                .put(update_customer)
                .delete(delete_customer),
        )
}

/// Records may only point at an existing customer.
pub(crate) async fn ensure_customer(pool: &PgPool, customer_id: i32) -> AppResult<()> {
    let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM customers WHERE id = $1")
        .bind(customer_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::BadRequest("Customer not found".into()));
    }
    Ok(())
}

async fn fetch_customer(pool: &PgPool, id: i32) -> AppResult<Customer> {
    sqlx::query_as::<_, Customer>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(AppError::customer_not_found)
}

pub async fn list_customers(
    Extension(pool): Extension<PgPool>,
) -> AppResult<Json<Vec<Customer>>> {
    let customers = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name ASC, id ASC"
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!(?e, "DB error listing customers");
        AppError::Db(e)
    })?;
    Ok(Json(customers))
}

pub async fn get_customer(
    Extension(pool): Extension<PgPool>,
    Path(id): Path<i32>,
) -> AppResult<Json<Customer>> {
    Ok(Json(fetch_customer(&pool, id).await?))
}

pub async fn create_customer(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
    Json(payload): Json<CustomerPayload>,
) -> AppResult<Json<Customer>> {
    let (name, pricing) = payload.resolve(default_pricing())?;
    let customer = sqlx::query_as::<_, Customer>(&format!(
        "INSERT INTO customers (name, price_per_bundle, portions_per_bundle) \
         VALUES ($1, $2, $3) RETURNING {CUSTOMER_COLUMNS}"
    ))
    .bind(&name)
    .bind(pricing.price_per_bundle)
    .bind(pricing.portions_per_bundle)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!(?e, "DB error creating customer");
        AppError::Db(e)
    })?;
    tracing::info!(customer_id = customer.id, actor = user.user_id, "customer created");
    Ok(Json(customer))
}

pub async fn update_customer(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CustomerPayload>,
) -> AppResult<Json<Customer>> {
    let existing = fetch_customer(&pool, id).await?;
    let (name, pricing) = payload.resolve(existing.pricing())?;
    let customer = sqlx::query_as::<_, Customer>(&format!(
        "UPDATE customers SET name = $2, price_per_bundle = $3, portions_per_bundle = $4 \
         WHERE id = $1 RETURNING {CUSTOMER_COLUMNS}"
    ))
    .bind(id)
    .bind(&name)
    .bind(pricing.price_per_bundle)
    .bind(pricing.portions_per_bundle)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!(?e, "DB error updating customer");
        AppError::Db(e)
    })?;
    tracing::info!(customer_id = id, actor = user.user_id, "customer updated");
    Ok(Json(customer))
}

/// Orders, kasbons and payments go with the customer (`ON DELETE CASCADE`).
pub async fn delete_customer(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::customer_not_found());
    }
    tracing::warn!(customer_id = id, actor = user.user_id, "customer deleted");
    Ok(())
}
