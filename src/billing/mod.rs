pub mod api;
pub mod calculator;
pub mod models;
pub mod service;
pub mod store;

pub use api::{
    cost_breakdown as billing_cost_breakdown, customer_summary as billing_customer_summary,
    get_pricing_info as billing_pricing_info, BreakdownQuery, CustomerSummaryResponse,
    WindowQuery,
};
pub use calculator::{
    build_customer_summary, calculate_catering_cost, calculate_cost_breakdown,
    effective_price_per_portion, pricing_info, AmountOverflow,
};
pub use models::{
    BalanceStatus, BillingSummary, BundleBreakdown, BundleCost, CostBreakdown, Customer,
    DailyOrder, DateWindow, Kasbon, Payment, PricingConfig, PricingInfo,
};
pub use service::BillingService;
pub use store::{LedgerHandle, LedgerStore, PgLedgerStore};
