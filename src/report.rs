//! Printable billing document built as plain label/value rows and tables.
//! `render_text` produces the fixed-width download.

use axum::{
    extract::{Extension, Path, Query},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use crate::billing::calculator::effective_price_per_portion;
use crate::billing::{
    BalanceStatus, BillingService, BillingSummary, DateWindow, LedgerHandle, WindowQuery,
};
use crate::error::{AppError, AppResult};
use crate::format::{day_name, format_currency, format_date};

pub const REPORT_TITLE: &str = "RINGKASAN TAGIHAN CATERING";

pub fn routes() -> Router {
    Router::new().route("/summary/:id/report", get(download_report))
}

/// Label/value block such as the customer or financial summary.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSection {
    pub title: String,
    pub rows: Vec<(String, String)>,
}

/// Itemised detail table.
#[derive(Debug, Clone, Serialize)]
pub struct ReportTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub title: String,
    pub period: String,
    pub customer_name: String,
    pub sections: Vec<ReportSection>,
    pub tables: Vec<ReportTable>,
    pub balance_status: BalanceStatus,
    pub printed_at: NaiveDateTime,
}

fn section(title: &str, rows: Vec<(&str, String)>) -> ReportSection {
    ReportSection {
        title: title.to_string(),
        rows: rows
            .into_iter()
            .map(|(label, value)| (label.to_string(), value))
            .collect(),
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl SummaryReport {
    pub fn build(summary: &BillingSummary, window: DateWindow, printed_at: NaiveDateTime) -> Self {
        let period = match (window.start, window.end) {
            (Some(start), Some(end)) => {
                format!("Periode: {} - {}", format_date(start), format_date(end))
            }
            _ => "Periode: Keseluruhan Data".to_string(),
        };

        let customer = &summary.customer;
        let per_portion = effective_price_per_portion(customer.pricing()) as i64;

        let sections = vec![
            section(
                "Informasi Customer",
                vec![
                    ("Nama Customer", customer.name.clone()),
                    ("Harga per Bundle", format_currency(customer.price_per_bundle)),
                    ("Porsi per Bundle", format!("{} porsi", customer.portions_per_bundle)),
                    ("Harga Efektif per Porsi", format_currency(per_portion)),
                ],
            ),
            section(
                "Ringkasan Pesanan",
                vec![
                    ("Total Porsi Dipesan", format!("{} porsi", summary.total_portions)),
                    ("Total Bundle Ditagih", format!("{} bundle", summary.total_bundles)),
                    ("Total Porsi Ditagih", format!("{} porsi", summary.charged_portions)),
                    ("Porsi Bonus/Sisa", format!("{} porsi", summary.remaining_portions)),
                    ("Biaya Catering", format_currency(summary.catering_cost)),
                ],
            ),
            section(
                "Ringkasan Keuangan",
                vec![
                    ("Biaya Catering", format_currency(summary.catering_cost)),
                    ("Total Kasbon", format_currency(summary.total_kasbon)),
                    ("Total Tagihan", format_currency(summary.total_bill)),
                    ("Total Pembayaran", format_currency(summary.total_payments)),
                    ("Sisa Saldo", format_currency(summary.remaining_balance)),
                ],
            ),
        ];

        let mut tables = Vec::new();
        if !summary.orders.is_empty() {
            tables.push(ReportTable {
                title: "Detail Pesanan".into(),
                headers: strings(&["Hari", "Tanggal", "Pagi", "Siang", "Sore", "Total"]),
                rows: summary
                    .orders
                    .iter()
                    .map(|order| {
                        vec![
                            day_name(order.date).to_string(),
                            format_date(order.date),
                            order.morning_portions.to_string(),
                            order.afternoon_portions.to_string(),
                            order.evening_portions.to_string(),
                            order.total_portions.to_string(),
                        ]
                    })
                    .collect(),
            });
        }
        if !summary.kasbons.is_empty() {
            tables.push(ReportTable {
                title: "Detail Kasbon".into(),
                headers: strings(&["Hari", "Tanggal", "Item", "Qty", "Harga Satuan", "Total"]),
                rows: summary
                    .kasbons
                    .iter()
                    .map(|kasbon| {
                        vec![
                            day_name(kasbon.date).to_string(),
                            format_date(kasbon.date),
                            kasbon.item_name.clone(),
                            kasbon.quantity.to_string(),
                            format_currency(kasbon.unit_price),
                            format_currency(kasbon.total_amount),
                        ]
                    })
                    .collect(),
            });
        }
        if !summary.payments.is_empty() {
            tables.push(ReportTable {
                title: "Detail Pembayaran".into(),
                headers: strings(&["Hari", "Tanggal", "Jumlah", "Keterangan"]),
                rows: summary
                    .payments
                    .iter()
                    .map(|payment| {
                        let description = payment
                            .description
                            .as_deref()
                            .map(str::trim)
                            .filter(|text| !text.is_empty())
                            .unwrap_or("-");
                        vec![
                            day_name(payment.date).to_string(),
                            format_date(payment.date),
                            format_currency(payment.amount),
                            description.to_string(),
                        ]
                    })
                    .collect(),
            });
        }

        Self {
            title: REPORT_TITLE.to_string(),
            period,
            customer_name: customer.name.clone(),
            sections,
            tables,
            balance_status: summary.balance_status(),
            printed_at,
        }
    }

    /// `ringkasan_<name>_<yyyymmdd>.txt`
    pub fn file_name(&self) -> String {
        format!(
            "ringkasan_{}_{}.txt",
            self.customer_name.trim().replace(' ', "_"),
            self.printed_at.format("%Y%m%d")
        )
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        out.push_str(&"=".repeat(self.title.chars().count()));
        out.push_str("\n\n");
        out.push_str(&self.period);
        out.push_str("\n\n");

        for section in &self.sections {
            out.push_str(&section.title);
            out.push('\n');
            let width = section
                .rows
                .iter()
                .map(|(label, _)| label.chars().count())
                .max()
                .unwrap_or(0);
            for (label, value) in &section.rows {
                out.push_str(&format!("  {}:{} {}\n", label, pad(label, width), value));
            }
            out.push('\n');
        }

        out.push_str(match self.balance_status {
            BalanceStatus::Owes => "Status: BELUM LUNAS\n\n",
            BalanceStatus::Settled => "Status: LUNAS\n\n",
            BalanceStatus::Overpaid => "Status: LEBIH BAYAR\n\n",
        });

        for table in &self.tables {
            out.push_str(&table.title);
            out.push('\n');
            render_table(&mut out, &table.headers, &table.rows);
            out.push('\n');
        }

        out.push_str(&format!(
            "Dicetak pada: {}\n",
            self.printed_at.format("%d/%m/%Y %H:%M:%S")
        ));
        out
    }
}

fn pad(text: &str, width: usize) -> String {
    " ".repeat(width.saturating_sub(text.chars().count()))
}

fn render_table(out: &mut String, headers: &[String], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{}{}", cell, pad(cell, *width)))
            .collect();
        format!("  | {} |\n", padded.join(" | "))
    };
    let rule = format!(
        "  +{}+\n",
        widths
            .iter()
            .map(|width| "-".repeat(width + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    out.push_str(&rule);
    out.push_str(&line(headers));
    out.push_str(&rule);
    for row in rows {
        out.push_str(&line(row));
    }
    out.push_str(&rule);
}

pub async fn download_report(
    Extension(ledger): Extension<LedgerHandle>,
    Path(customer_id): Path<i32>,
    Query(query): Query<WindowQuery>,
) -> AppResult<impl IntoResponse> {
    let window = query.window()?;
    let summary = BillingService::new(ledger)
        .customer_summary(customer_id, window)
        .await?
        .ok_or_else(AppError::customer_not_found)?;

    let report = SummaryReport::build(&summary, window, Local::now().naive_local());
    let disposition = format!("inline; filename={}", report.file_name());
    tracing::info!(%customer_id, file = %report.file_name(), "rendered billing report");

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.render_text(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::{build_customer_summary, Customer, DailyOrder, Kasbon, Payment};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn printed_at() -> NaiveDateTime {
        date(31).and_hms_opt(17, 30, 0).unwrap()
    }

    fn summary() -> BillingSummary {
        summary_with_payment(50_000)
    }

    fn summary_with_payment(amount: i64) -> BillingSummary {
        let customer = Customer {
            id: 4,
            name: "Kantor Desa Suka Maju".into(),
            price_per_bundle: 8500,
            portions_per_bundle: 1,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        };
        build_customer_summary(
            &customer,
            vec![DailyOrder {
                id: 1,
                customer_id: 4,
                date: date(6),
                morning_portions: 4,
                afternoon_portions: 4,
                evening_portions: 2,
                total_portions: 10,
            }],
            vec![Kasbon {
                id: 1,
                customer_id: 4,
                date: date(7),
                item_name: "Kopi sachet".into(),
                quantity: 3,
                unit_price: 5000,
                total_amount: 15_000,
            }],
            vec![Payment {
                id: 1,
                customer_id: 4,
                date: date(8),
                amount,
                description: Some("  ".into()),
            }],
        )
        .unwrap()
    }

    #[test]
    fn report_lists_totals_and_details() {
        let window = DateWindow::new(Some(date(1)), Some(date(31)));
        let report = SummaryReport::build(&summary(), window, printed_at());
        let text = report.render_text();

        assert!(text.starts_with(REPORT_TITLE));
        assert!(text.contains("Periode: 01/01/2025 - 31/01/2025"));
        assert!(text.contains("Rp 85.000"));
        assert!(text.contains("Rp 100.000"));
        assert!(text.contains("Rp 50.000"));
        assert!(text.contains("Status: BELUM LUNAS"));
        assert!(text.contains("Senin"));
        assert!(text.contains("06/01/2025"));
        assert!(text.contains("Kopi sachet"));
        assert!(text.contains("Dicetak pada: 31/01/2025 17:30:00"));
        assert_eq!(report.tables.len(), 3);
        // blank payment notes fall back to a dash
        assert_eq!(report.tables[2].rows[0][3], "-");
    }

    #[test]
    fn paid_in_full_is_settled() {
        let report = SummaryReport::build(
            &summary_with_payment(100_000),
            DateWindow::default(),
            printed_at(),
        );
        assert_eq!(report.balance_status, BalanceStatus::Settled);
        let text = report.render_text();
        assert!(text.contains("Status: LUNAS"));
        assert!(!text.contains("BELUM LUNAS"));
        assert!(text.contains("Rp 0"));
    }

    #[test]
    fn overpayment_is_flagged() {
        let report = SummaryReport::build(
            &summary_with_payment(120_000),
            DateWindow::default(),
            printed_at(),
        );
        assert_eq!(report.balance_status, BalanceStatus::Overpaid);
        let text = report.render_text();
        assert!(text.contains("Status: LEBIH BAYAR"));
        assert!(text.contains("Rp -20.000"));
    }

    #[test]
    fn open_window_prints_whole_history() {
        let report = SummaryReport::build(&summary(), DateWindow::default(), printed_at());
        assert_eq!(report.period, "Periode: Keseluruhan Data");

        let half_open = DateWindow::new(Some(date(1)), None);
        let report = SummaryReport::build(&summary(), half_open, printed_at());
        assert_eq!(report.period, "Periode: Keseluruhan Data");
    }

    #[test]
    fn file_name_replaces_spaces() {
        let report = SummaryReport::build(&summary(), DateWindow::default(), printed_at());
        assert_eq!(
            report.file_name(),
            "ringkasan_Kantor_Desa_Suka_Maju_20250131.txt"
        );
    }

    #[test]
    fn empty_ledgers_skip_detail_tables() {
        let mut summary = summary();
        summary.orders.clear();
        summary.kasbons.clear();
        summary.payments.clear();
        let report = SummaryReport::build(&summary, DateWindow::default(), printed_at());
        assert!(report.tables.is_empty());
    }
}
