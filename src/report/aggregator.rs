use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::money;
use crate::types::{DailySalesBucket, DateRange, Receipt, ReportData, SummaryStats};

#[derive(Default)]
struct DayTotals {
    sales: u64,
    paid: u64,
    cash: Decimal,
}

/// Fold receipts into one bucket per date of `range` plus whole-range stats.
///
/// A receipt counts toward its day's `total_sales` whatever its status, but
/// toward `total_cash` only when paid. Averages divide paid cash by paid
/// receipts, per day and overall. Receipts dated outside `range` are ignored
/// even though the Gateway was asked to pre-filter.
pub fn aggregate(receipts: &[Receipt], range: DateRange) -> ReportData {
    let mut days: BTreeMap<NaiveDate, DayTotals> =
        range.days().map(|d| (d, DayTotals::default())).collect();

    let mut total_sales = 0u64;
    let mut total_paid_sales = 0u64;
    let mut total_cash = Decimal::ZERO;
    let mut status_breakdown: BTreeMap<String, u64> = BTreeMap::new();
    let mut dropped = 0usize;

    for receipt in receipts {
        let Some(day) = receipt.created_date().and_then(|d| days.get_mut(&d)) else {
            dropped += 1;
            continue;
        };
        if !receipt.timestamps_consistent() {
            warn!(receipt_id = %receipt.id, "receipt paid_at precedes created_at");
        }

        day.sales += 1;
        total_sales += 1;
        *status_breakdown.entry(receipt.status.clone()).or_insert(0) += 1;

        if receipt.is_paid() {
            day.cash += receipt.final_amount;
            day.paid += 1;
            total_paid_sales += 1;
            total_cash += receipt.final_amount;
        }
    }

    if dropped > 0 {
        debug!(dropped, "ignored receipts outside report range");
    }

    let daily_sales = days
        .into_iter()
        .map(|(date, t)| DailySalesBucket {
            date,
            total_sales: t.sales,
            total_cash: t.cash,
            average_per_sale: money::average(t.cash, t.paid),
        })
        .collect();

    ReportData {
        daily_sales,
        summary: SummaryStats {
            total_sales,
            total_paid_sales,
            total_cash,
            average_sale_amount: money::average(total_cash, total_paid_sales),
            status_breakdown,
        },
    }
}
