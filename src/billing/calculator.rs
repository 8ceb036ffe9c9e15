//! Bundle pricing arithmetic. Everything here is pure: callers load the records,
//! these functions only fold over them.

use super::models::{
    BillingSummary, BundleBreakdown, BundleCost, CostBreakdown, Customer, DailyOrder, Kasbon,
    Payment, PricingConfig, PricingInfo,
};
use crate::format::format_currency;

/// A bill whose portions or rupiah amounts do not fit in an `i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("billing amount exceeds the supported range")]
pub struct AmountOverflow;

fn checked_sum(mut values: impl Iterator<Item = i64>) -> Result<i64, AmountOverflow> {
    values.try_fold(0i64, |acc, value| acc.checked_add(value).ok_or(AmountOverflow))
}

/// Bills whole bundles only; a partially filled bundle is charged in full.
///
/// A non-positive bundle size yields an all-zero cost instead of dividing by it.
pub fn calculate_catering_cost(
    price_per_bundle: i64,
    portions_per_bundle: i64,
    total_portions: i64,
) -> Result<BundleCost, AmountOverflow> {
    if portions_per_bundle <= 0 || total_portions <= 0 {
        return Ok(BundleCost::default());
    }

    let mut billed_bundles = total_portions / portions_per_bundle;
    if total_portions % portions_per_bundle != 0 {
        billed_bundles += 1;
    }

    Ok(BundleCost {
        billed_bundles,
        charged_portions: billed_bundles
            .checked_mul(portions_per_bundle)
            .ok_or(AmountOverflow)?,
        catering_cost: billed_bundles
            .checked_mul(price_per_bundle)
            .ok_or(AmountOverflow)?,
    })
}

/// Unrounded per-portion price, zero when the bundle size is non-positive.
pub fn effective_price_per_portion(pricing: PricingConfig) -> f64 {
    if pricing.portions_per_bundle <= 0 {
        return 0.0;
    }
    pricing.price_per_bundle as f64 / pricing.portions_per_bundle as f64
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn build_customer_summary(
    customer: &Customer,
    orders: Vec<DailyOrder>,
    kasbons: Vec<Kasbon>,
    payments: Vec<Payment>,
) -> Result<BillingSummary, AmountOverflow> {
    let pricing = customer.pricing();

    let total_portions = checked_sum(orders.iter().map(|order| order.total_portions))?;
    let cost = calculate_catering_cost(
        pricing.price_per_bundle,
        pricing.portions_per_bundle,
        total_portions,
    )?;
    let remaining_portions = (cost.charged_portions - total_portions).max(0);

    let total_kasbon = checked_sum(kasbons.iter().map(|kasbon| kasbon.total_amount))?;
    let total_payments = checked_sum(payments.iter().map(|payment| payment.amount))?;

    let total_bill = cost
        .catering_cost
        .checked_add(total_kasbon)
        .ok_or(AmountOverflow)?;
    let remaining_balance = total_bill
        .checked_sub(total_payments)
        .ok_or(AmountOverflow)?;

    Ok(BillingSummary {
        customer: customer.clone(),
        orders,
        kasbons,
        payments,
        total_portions,
        total_bundles: cost.billed_bundles,
        charged_portions: cost.charged_portions,
        remaining_portions,
        catering_cost: cost.catering_cost,
        total_kasbon,
        total_payments,
        total_bill,
        remaining_balance,
        price_per_portion: round_cents(effective_price_per_portion(pricing)),
        bundle_info: pricing,
    })
}

pub fn calculate_cost_breakdown(
    customer: &Customer,
    portions: i64,
) -> Result<CostBreakdown, AmountOverflow> {
    if portions == 0 {
        return Ok(CostBreakdown {
            total_portions: 0,
            total_bundles: 0,
            charged_portions: 0,
            remaining_portions: 0,
            total_cost: 0,
            effective_cost_per_portion: 0.0,
            breakdown: None,
        });
    }

    let pricing = customer.pricing();
    let cost = calculate_catering_cost(
        pricing.price_per_bundle,
        pricing.portions_per_bundle,
        portions,
    )?;

    Ok(CostBreakdown {
        total_portions: portions,
        total_bundles: cost.billed_bundles,
        charged_portions: cost.charged_portions,
        remaining_portions: (cost.charged_portions - portions).max(0),
        total_cost: cost.catering_cost,
        effective_cost_per_portion: effective_price_per_portion(pricing),
        breakdown: Some(BundleBreakdown {
            bundles_ordered: cost.billed_bundles,
            price_per_bundle: pricing.price_per_bundle,
            portions_per_bundle: pricing.portions_per_bundle,
            total_bundle_cost: cost.catering_cost,
        }),
    })
}

pub fn pricing_info(customer: &Customer) -> PricingInfo {
    let pricing = customer.pricing();
    let per_portion = effective_price_per_portion(pricing);
    PricingInfo {
        price_per_bundle: pricing.price_per_bundle,
        portions_per_bundle: pricing.portions_per_bundle,
        effective_price_per_portion: per_portion,
        pricing_description: format!(
            "{} per {} porsi ({}/porsi)",
            format_currency(pricing.price_per_bundle),
            pricing.portions_per_bundle,
            format_currency(per_portion.round_ties_even() as i64),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn customer(price_per_bundle: i64, portions_per_bundle: i64) -> Customer {
        Customer {
            id: 1,
            name: "Bu Sari".into(),
            price_per_bundle,
            portions_per_bundle,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn order(id: i32, date: NaiveDate, morning: i64, afternoon: i64, evening: i64) -> DailyOrder {
        DailyOrder {
            id,
            customer_id: 1,
            date,
            morning_portions: morning,
            afternoon_portions: afternoon,
            evening_portions: evening,
            total_portions: morning + afternoon + evening,
        }
    }

    fn kasbon(id: i32, quantity: i64, unit_price: i64) -> Kasbon {
        Kasbon {
            id,
            customer_id: 1,
            date: day(3),
            item_name: "Es teh".into(),
            quantity,
            unit_price,
            total_amount: quantity * unit_price,
        }
    }

    fn payment(id: i32, amount: i64) -> Payment {
        Payment {
            id,
            customer_id: 1,
            date: day(5),
            amount,
            description: None,
        }
    }

    #[test]
    fn single_portion_bundles() {
        let cost = calculate_catering_cost(8500, 1, 10).unwrap();
        assert_eq!(
            cost,
            BundleCost {
                billed_bundles: 10,
                charged_portions: 10,
                catering_cost: 85_000,
            }
        );
    }

    #[test]
    fn partial_bundle_rounds_up() {
        let cost = calculate_catering_cost(20_000, 5, 12).unwrap();
        assert_eq!(cost.billed_bundles, 3);
        assert_eq!(cost.charged_portions, 15);
        assert_eq!(cost.catering_cost, 60_000);
    }

    #[test]
    fn zero_portions_bill_nothing() {
        for portions_per_bundle in [1, 3, 7] {
            assert_eq!(
                calculate_catering_cost(20_000, portions_per_bundle, 0),
                Ok(BundleCost::default())
            );
        }
    }

    #[test]
    fn non_positive_bundle_size_is_zeroed() {
        assert_eq!(calculate_catering_cost(8500, 0, 12), Ok(BundleCost::default()));
        assert_eq!(calculate_catering_cost(8500, -2, 12), Ok(BundleCost::default()));
    }

    #[test]
    fn charged_portions_stay_within_one_bundle() {
        for portions_per_bundle in 1..=9 {
            for total in 0..=60 {
                let cost = calculate_catering_cost(12_000, portions_per_bundle, total).unwrap();
                assert!(cost.charged_portions >= total);
                assert!(cost.charged_portions - total < portions_per_bundle);
                assert_eq!(cost.catering_cost, cost.billed_bundles * 12_000);
            }
        }
    }

    #[test]
    fn exact_bundle_has_no_leftover() {
        let summary = build_customer_summary(
            &customer(20_000, 5),
            vec![order(1, day(2), 2, 2, 1)],
            vec![],
            vec![],
        )
        .unwrap();
        assert_eq!(summary.total_bundles, 1);
        assert_eq!(summary.remaining_portions, 0);
    }

    #[test]
    fn summary_reconciles_charges_and_payments() {
        let summary = build_customer_summary(
            &customer(8500, 1),
            vec![order(1, day(2), 2, 2, 1), order(2, day(3), 1, 3, 1)],
            vec![kasbon(1, 3, 5000)],
            vec![payment(1, 50_000)],
        )
        .unwrap();
        assert_eq!(summary.total_portions, 10);
        assert_eq!(summary.catering_cost, 85_000);
        assert_eq!(summary.total_kasbon, 15_000);
        assert_eq!(summary.total_bill, 100_000);
        assert_eq!(summary.remaining_balance, 50_000);
        assert_eq!(summary.price_per_portion, 8500.0);
    }

    #[test]
    fn overpayment_goes_negative() {
        let summary = build_customer_summary(
            &customer(8500, 1),
            vec![order(1, day(2), 1, 0, 0)],
            vec![],
            vec![payment(1, 10_000)],
        )
        .unwrap();
        assert_eq!(summary.total_bill, 8500);
        assert_eq!(summary.remaining_balance, -1500);
        assert_eq!(
            summary.balance_status(),
            crate::billing::models::BalanceStatus::Overpaid
        );
    }

    #[test]
    fn exact_payment_settles_balance() {
        let summary = build_customer_summary(
            &customer(8500, 1),
            vec![order(1, day(2), 1, 1, 0)],
            vec![kasbon(1, 1, 3000)],
            vec![payment(1, 20_000)],
        )
        .unwrap();
        assert_eq!(summary.remaining_balance, 0);
        assert_eq!(
            summary.balance_status(),
            crate::billing::models::BalanceStatus::Settled
        );
    }

    #[test]
    fn leftover_portions_in_partial_bundle() {
        let summary = build_customer_summary(
            &customer(20_000, 5),
            vec![order(1, day(2), 4, 4, 4)],
            vec![],
            vec![],
        )
        .unwrap();
        assert_eq!(summary.total_bundles, 3);
        assert_eq!(summary.charged_portions, 15);
        assert_eq!(summary.remaining_portions, 3);
        assert_eq!(summary.price_per_portion, 4000.0);
    }

    #[test]
    fn price_per_portion_is_rounded_for_display_only() {
        let summary = build_customer_summary(
            &customer(10_000, 3),
            vec![order(1, day(2), 4, 0, 0)],
            vec![],
            vec![],
        )
        .unwrap();
        assert_eq!(summary.price_per_portion, 3333.33);
        assert_eq!(summary.catering_cost, 20_000);
    }

    #[test]
    fn summary_is_deterministic() {
        let build = || {
            build_customer_summary(
                &customer(20_000, 5),
                vec![order(1, day(2), 1, 2, 3), order(2, day(4), 0, 1, 0)],
                vec![kasbon(1, 2, 3000)],
                vec![payment(1, 25_000)],
            )
            .unwrap()
        };
        let first = build();
        let second = build();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn zero_portion_preview_short_circuits() {
        let breakdown = calculate_cost_breakdown(&customer(20_000, 5), 0).unwrap();
        assert_eq!(breakdown.total_cost, 0);
        assert_eq!(breakdown.effective_cost_per_portion, 0.0);
        assert!(breakdown.breakdown.is_none());
    }

    #[test]
    fn preview_uses_bundle_rounding() {
        let breakdown = calculate_cost_breakdown(&customer(20_000, 5), 7).unwrap();
        assert_eq!(breakdown.total_bundles, 2);
        assert_eq!(breakdown.charged_portions, 10);
        assert_eq!(breakdown.remaining_portions, 3);
        assert_eq!(breakdown.total_cost, 40_000);
        assert_eq!(breakdown.effective_cost_per_portion, 4000.0);
        let detail = breakdown.breakdown.unwrap();
        assert_eq!(detail.bundles_ordered, 2);
        assert_eq!(detail.total_bundle_cost, 40_000);
    }

    #[test]
    fn pricing_description_is_human_readable() {
        let info = pricing_info(&customer(20_000, 5));
        assert_eq!(info.effective_price_per_portion, 4000.0);
        assert_eq!(
            info.pricing_description,
            "Rp 20.000 per 5 porsi (Rp 4.000/porsi)"
        );
    }

    #[test]
    fn cost_overflow_is_reported() {
        assert_eq!(
            calculate_catering_cost(8500, 1, 10_000_000_000_000_000),
            Err(AmountOverflow)
        );
        assert_eq!(calculate_catering_cost(2, 1, i64::MAX), Err(AmountOverflow));
        let largest = calculate_catering_cost(1, 1, i64::MAX).unwrap();
        assert_eq!(largest.charged_portions, i64::MAX);
        assert_eq!(largest.catering_cost, i64::MAX);
    }

    #[test]
    fn preview_overflow_is_reported() {
        assert_eq!(
            calculate_cost_breakdown(&customer(8500, 1), i64::MAX),
            Err(AmountOverflow)
        );
        let preview = calculate_cost_breakdown(&customer(20_000, 5), i64::MAX / 20_000).unwrap();
        assert!(preview.charged_portions >= i64::MAX / 20_000);
    }

    #[test]
    fn summary_totals_overflow_is_reported() {
        let huge_orders = build_customer_summary(
            &customer(8500, 1),
            vec![
                order(1, day(2), i64::MAX / 2, 0, 0),
                order(2, day(3), i64::MAX / 2, 0, 0),
                order(3, day(4), 2, 0, 0),
            ],
            vec![],
            vec![],
        );
        assert_eq!(huge_orders, Err(AmountOverflow));

        let huge_kasbon = build_customer_summary(
            &customer(8500, 1),
            vec![order(1, day(2), 1, 0, 0)],
            vec![kasbon(1, 1, i64::MAX)],
            vec![],
        );
        assert_eq!(huge_kasbon, Err(AmountOverflow));

        let huge_payments = build_customer_summary(
            &customer(1, 1),
            vec![],
            vec![],
            vec![payment(1, i64::MAX), payment(2, 1)],
        );
        assert_eq!(huge_payments, Err(AmountOverflow));
    }

    #[test]
    fn pricing_description_rounds_half_to_even() {
        let info = pricing_info(&customer(10_001, 2));
        assert_eq!(info.effective_price_per_portion, 5000.5);
        assert_eq!(
            info.pricing_description,
            "Rp 10.001 per 2 porsi (Rp 5.000/porsi)"
        );
        let info = pricing_info(&customer(10_003, 2));
        assert_eq!(
            info.pricing_description,
            "Rp 10.003 per 2 porsi (Rp 5.002/porsi)"
        );
    }
}
