pub mod auth;
pub mod billing;
pub mod config;
pub mod customers;
pub mod dashboard;
pub mod error;
pub mod extractor;
pub mod format;
pub mod kasbons;
pub mod orders;
pub mod payments;
pub mod report;
pub mod routes;

pub use billing::{
    build_customer_summary, calculate_catering_cost, calculate_cost_breakdown, BillingSummary,
    CostBreakdown,
};
