use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// key: billing-pricing -> bundle price and size, read once per calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub price_per_bundle: i64,
    pub portions_per_bundle: i64,
}

/// key: billing-customer -> pricing owner
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub price_per_bundle: i64,
    pub portions_per_bundle: i64,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn pricing(&self) -> PricingConfig {
        PricingConfig {
            price_per_bundle: self.price_per_bundle,
            portions_per_bundle: self.portions_per_bundle,
        }
    }
}

/// key: billing-order -> portions per meal period for one day
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct DailyOrder {
    pub id: i32,
    pub customer_id: i32,
    pub date: NaiveDate,
    pub morning_portions: i64,
    pub afternoon_portions: i64,
    pub evening_portions: i64,
    pub total_portions: i64,
}

/// key: billing-kasbon -> ad-hoc credit charge
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Kasbon {
    pub id: i32,
    pub customer_id: i32,
    pub date: NaiveDate,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_amount: i64,
}

/// key: billing-payment -> money received
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i32,
    pub customer_id: i32,
    pub date: NaiveDate,
    pub amount: i64,
    pub description: Option<String>,
}

/// Inclusive date window; a missing side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

/// key: billing-bundle-cost -> rounded-up bundle billing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BundleCost {
    pub billed_bundles: i64,
    pub charged_portions: i64,
    pub catering_cost: i64,
}

/// key: billing-summary -> per-customer snapshot over a window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingSummary {
    pub customer: Customer,
    pub orders: Vec<DailyOrder>,
    pub kasbons: Vec<Kasbon>,
    pub payments: Vec<Payment>,
    pub total_portions: i64,
    pub total_bundles: i64,
    pub charged_portions: i64,
    pub remaining_portions: i64,
    pub catering_cost: i64,
    pub total_kasbon: i64,
    pub total_payments: i64,
    pub total_bill: i64,
    pub remaining_balance: i64,
    pub price_per_portion: f64,
    pub bundle_info: PricingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    Owes,
    Settled,
    Overpaid,
}

impl BillingSummary {
    pub fn balance_status(&self) -> BalanceStatus {
        match self.remaining_balance {
            balance if balance > 0 => BalanceStatus::Owes,
            0 => BalanceStatus::Settled,
            _ => BalanceStatus::Overpaid,
        }
    }
}

/// key: billing-breakdown-detail -> bundle arithmetic behind a preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BundleBreakdown {
    pub bundles_ordered: i64,
    pub price_per_bundle: i64,
    pub portions_per_bundle: i64,
    pub total_bundle_cost: i64,
}

/// key: billing-breakdown -> what-if pricing for an arbitrary portion count
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub total_portions: i64,
    pub total_bundles: i64,
    pub charged_portions: i64,
    pub remaining_portions: i64,
    pub total_cost: i64,
    pub effective_cost_per_portion: f64,
    pub breakdown: Option<BundleBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingInfo {
    pub price_per_bundle: i64,
    pub portions_per_bundle: i64,
    pub effective_price_per_portion: f64,
    pub pricing_description: String,
}
