pub mod aggregator;
pub mod export;

pub use aggregator::aggregate;
pub use export::Sheet;

use tracing::info;

use crate::error::Result;
use crate::gateway::{Gateway, ReceiptFilter};
use crate::types::{DateRange, ReportData};

/// Fetch receipts for `range` and aggregate them. Gateway failures are not
/// retried on this read path.
pub async fn generate_report(gateway: &dyn Gateway, range: DateRange) -> Result<ReportData> {
    let filter = ReceiptFilter {
        internal_name: None,
        date_range: Some(range),
    };
    let receipts = gateway.list_receipts(&filter).await?;
    let report = aggregate(&receipts, range);

    info!(
        event = "REPORT",
        start = %range.start(),
        end = %range.end(),
        days = range.num_days(),
        fetched = receipts.len(),
        counted = report.summary.total_sales,
        paid = report.summary.total_paid_sales,
        "REPORT | {} → {} | fetched: {} | counted: {} | paid: {}",
        range.start(),
        range.end(),
        receipts.len(),
        report.summary.total_sales,
        report.summary.total_paid_sales,
    );

    Ok(report)
}
