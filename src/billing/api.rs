use axum::{
    extract::{Extension, Path, Query},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::models::{
    CostBreakdown, DailyOrder, DateWindow, Kasbon, Payment, PricingConfig, PricingInfo,
};
use super::calculator::AmountOverflow;
use super::service::BillingService;
use super::store::LedgerHandle;
use crate::error::{AppError, AppResult};

/// key: billing-api -> rest endpoints
pub fn routes() -> Router {
    Router::new()
        .route("/api/customer_summary/:id", get(customer_summary))
        .route("/api/pricing_info/:id", get(get_pricing_info))
        .route("/api/cost_breakdown/:id", get(cost_breakdown))
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl WindowQuery {
    pub fn window(&self) -> AppResult<DateWindow> {
        Ok(DateWindow::new(
            parse_date("start_date", self.start_date.as_deref())?,
            parse_date("end_date", self.end_date.as_deref())?,
        ))
    }
}

fn parse_date(field: &str, raw: Option<&str>) -> AppResult<Option<NaiveDate>> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| AppError::BadRequest(format!("{field} must be formatted as YYYY-MM-DD")))
}

#[derive(Debug, Serialize)]
pub struct CustomerSummaryResponse {
    pub customer_id: i32,
    pub customer_name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_portions: i64,
    pub total_bundles: i64,
    pub charged_portions: i64,
    pub remaining_portions: i64,
    pub catering_cost: i64,
    pub total_kasbon: i64,
    pub total_payments: i64,
    pub total_bill: i64,
    pub remaining_balance: i64,
    pub effective_price_per_portion: f64,
    pub bundle_info: PricingConfig,
    pub orders: Vec<DailyOrder>,
    pub kasbons: Vec<Kasbon>,
    pub payments: Vec<Payment>,
}

pub async fn customer_summary(
    Extension(ledger): Extension<LedgerHandle>,
    Path(customer_id): Path<i32>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<CustomerSummaryResponse>> {
    let window = query.window()?;
    let summary = BillingService::new(ledger)
        .customer_summary(customer_id, window)
        .await?
        .ok_or_else(AppError::customer_not_found)?;

    Ok(Json(CustomerSummaryResponse {
        customer_id: summary.customer.id,
        customer_name: summary.customer.name,
        start_date: window.start,
        end_date: window.end,
        total_portions: summary.total_portions,
        total_bundles: summary.total_bundles,
        charged_portions: summary.charged_portions,
        remaining_portions: summary.remaining_portions,
        catering_cost: summary.catering_cost,
        total_kasbon: summary.total_kasbon,
        total_payments: summary.total_payments,
        total_bill: summary.total_bill,
        remaining_balance: summary.remaining_balance,
        effective_price_per_portion: summary.price_per_portion,
        bundle_info: summary.bundle_info,
        orders: summary.orders,
        kasbons: summary.kasbons,
        payments: summary.payments,
    }))
}

pub async fn get_pricing_info(
    Extension(ledger): Extension<LedgerHandle>,
    Path(customer_id): Path<i32>,
) -> AppResult<Json<PricingInfo>> {
    let info = BillingService::new(ledger)
        .pricing_info(customer_id)
        .await?
        .ok_or_else(AppError::customer_not_found)?;
    Ok(Json(info))
}

#[derive(Debug, Default, Deserialize)]
pub struct BreakdownQuery {
    #[serde(default)]
    pub portions: Option<String>,
}

impl BreakdownQuery {
    pub fn portions(&self) -> AppResult<i64> {
        self.portions
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|portions| *portions >= 0)
            .ok_or_else(|| AppError::BadRequest("Valid portions parameter required".into()))
    }
}

pub async fn cost_breakdown(
    Extension(ledger): Extension<LedgerHandle>,
    Path(customer_id): Path<i32>,
    Query(query): Query<BreakdownQuery>,
) -> AppResult<Json<CostBreakdown>> {
    // rejected before the customer is looked up
    let portions = query.portions()?;
    let breakdown = BillingService::new(ledger)
        .cost_breakdown(customer_id, portions)
        .await
        .map_err(preview_error)?
        .ok_or_else(AppError::customer_not_found)?;
    Ok(Json(breakdown))
}

fn preview_error(err: anyhow::Error) -> AppError {
    if err.is::<AmountOverflow>() {
        AppError::BadRequest("portions parameter is too large".into())
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_accepts_iso_dates_and_blanks() {
        let query = WindowQuery {
            start_date: Some("2025-01-01".into()),
            end_date: Some("".into()),
        };
        let window = query.window().unwrap();
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(window.end, None);
    }

    #[test]
    fn window_rejects_other_formats() {
        let query = WindowQuery {
            start_date: Some("01/02/2025".into()),
            end_date: None,
        };
        assert!(matches!(query.window(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn portions_must_be_non_negative_integers() {
        let parse = |raw: Option<&str>| {
            BreakdownQuery {
                portions: raw.map(str::to_string),
            }
            .portions()
        };
        assert_eq!(parse(Some("0")).unwrap(), 0);
        assert_eq!(parse(Some("12")).unwrap(), 12);
        assert!(parse(None).is_err());
        assert!(parse(Some("-1")).is_err());
        assert!(parse(Some("lots")).is_err());
    }

    #[test]
    fn oversized_preview_is_a_client_error() {
        let err = preview_error(anyhow::Error::new(AmountOverflow));
        assert!(matches!(err, AppError::BadRequest(_)));
        let err = preview_error(anyhow::anyhow!("ledger unavailable"));
        assert!(matches!(err, AppError::Message(_)));
    }
}
