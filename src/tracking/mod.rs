pub mod classifier;

pub use classifier::classify;

use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::gateway::{Gateway, ReceiptFilter};
use crate::types::{DateRange, TrackedReceipt};

/// Receipts tagged with `internal_name` created inside `range`, classified
/// and ordered by `(created_at, id)`.
///
/// The range filter is re-applied here whatever the Gateway returns.
pub async fn track_by_internal_name(
    gateway: &dyn Gateway,
    internal_name: &str,
    range: DateRange,
) -> Result<Vec<TrackedReceipt>> {
    let internal_name = internal_name.trim();
    if internal_name.is_empty() {
        return Err(AppError::Validation("internalName must not be empty".to_string()));
    }

    let filter = ReceiptFilter {
        internal_name: Some(internal_name.to_string()),
        date_range: Some(range),
    };
    let receipts = gateway.list_receipts(&filter).await?;
    let fetched = receipts.len();

    let mut tracked: Vec<TrackedReceipt> = receipts
        .into_iter()
        .filter(|r| range.contains_ts(r.created_at))
        .map(|receipt| {
            if !receipt.timestamps_consistent() {
                warn!(receipt_id = %receipt.id, "receipt paid_at precedes created_at");
            }
            let friendly_status = classify(&receipt.status);
            TrackedReceipt {
                receipt,
                friendly_status,
            }
        })
        .collect();

    tracked.sort_by(|a, b| {
        a.receipt
            .created_at
            .cmp(&b.receipt.created_at)
            .then_with(|| a.receipt.id.cmp(&b.receipt.id))
    });

    info!(
        event = "TRACK",
        internal_name = %internal_name,
        fetched,
        kept = tracked.len(),
        "TRACK | {internal_name} | fetched: {fetched} | kept: {}",
        tracked.len(),
    );

    Ok(tracked)
}
