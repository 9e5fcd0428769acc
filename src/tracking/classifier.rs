use crate::types::{FriendlyStatus, RawStatus};

impl RawStatus {
    /// Case-insensitive; anything unrecognised is kept verbatim in `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "paid" => RawStatus::Paid,
            "succeeded" => RawStatus::Succeeded,
            "pending" => RawStatus::Pending,
            "open" => RawStatus::Open,
            "draft" => RawStatus::Draft,
            "processing" => RawStatus::Processing,
            "past_due" => RawStatus::PastDue,
            "unresolved" => RawStatus::Unresolved,
            "failed" => RawStatus::Failed,
            "uncollectible" => RawStatus::Uncollectible,
            "refunded" => RawStatus::Refunded,
            "partially_refunded" => RawStatus::PartiallyRefunded,
            "canceled" | "cancelled" => RawStatus::Canceled,
            "void" => RawStatus::Void,
            _ => RawStatus::Other(raw.to_string()),
        }
    }

    /// Total: every raw status maps to exactly one display status.
    pub fn friendly(&self) -> FriendlyStatus {
        match self {
            RawStatus::Paid | RawStatus::Succeeded => FriendlyStatus::Paid,
            RawStatus::Pending
            | RawStatus::Open
            | RawStatus::Draft
            | RawStatus::Processing
            | RawStatus::PastDue
            | RawStatus::Unresolved => FriendlyStatus::Pending,
            RawStatus::Failed | RawStatus::Uncollectible => FriendlyStatus::Failed,
            RawStatus::Refunded | RawStatus::PartiallyRefunded => FriendlyStatus::Refunded,
            RawStatus::Canceled | RawStatus::Void => FriendlyStatus::Canceled,
            RawStatus::Other(_) => FriendlyStatus::Unknown,
        }
    }
}

/// Display status for a raw platform status string.
pub fn classify(raw: &str) -> FriendlyStatus {
    RawStatus::parse(raw).friendly()
}
