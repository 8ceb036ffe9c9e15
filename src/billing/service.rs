use anyhow::Result;

use super::calculator::{build_customer_summary, calculate_cost_breakdown, pricing_info};
use super::models::{BillingSummary, CostBreakdown, DateWindow, PricingInfo};
use super::store::LedgerHandle;

/// key: billing-service -> loads one customer's ledger and hands it to the calculator
#[derive(Clone)]
pub struct BillingService {
    store: LedgerHandle,
}

impl BillingService {
    pub fn new(store: LedgerHandle) -> Self {
        Self { store }
    }

    /// `None` when the customer does not exist.
    pub async fn customer_summary(
        &self,
        customer_id: i32,
        window: DateWindow,
    ) -> Result<Option<BillingSummary>> {
        let Some(customer) = self.store.customer(customer_id).await? else {
            return Ok(None);
        };

        let orders = self.store.orders(customer_id, window).await?;
        let kasbons = self.store.kasbons(customer_id, window).await?;
        let payments = self.store.payments(customer_id, window).await?;

        let summary = build_customer_summary(&customer, orders, kasbons, payments)?;
        tracing::debug!(
            %customer_id,
            total_portions = summary.total_portions,
            total_bill = summary.total_bill,
            remaining_balance = summary.remaining_balance,
            "built customer summary"
        );
        Ok(Some(summary))
    }

    pub async fn pricing_info(&self, customer_id: i32) -> Result<Option<PricingInfo>> {
        let customer = self.store.customer(customer_id).await?;
        Ok(customer.as_ref().map(pricing_info))
    }

    pub async fn cost_breakdown(
        &self,
        customer_id: i32,
        portions: i64,
    ) -> Result<Option<CostBreakdown>> {
        let customer = self.store.customer(customer_id).await?;
        let breakdown = customer
            .map(|customer| calculate_cost_breakdown(&customer, portions))
            .transpose()?;
        Ok(breakdown)
    }
}
