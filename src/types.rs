use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::MAX_RANGE_DAYS;
use crate::error::{AppError, Result};
use crate::money;

// ---------------------------------------------------------------------------
// Date range
// ---------------------------------------------------------------------------

/// Inclusive range of UTC calendar dates, at most `MAX_RANGE_DAYS` long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(AppError::InvalidRange { start, end });
        }
        let days = (end - start).num_days() + 1;
        if days > MAX_RANGE_DAYS {
            return Err(AppError::Validation(format!(
                "date range spans {days} days, at most {MAX_RANGE_DAYS} allowed"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_date("startDate", start)?, parse_date("endDate", end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn num_days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// True when the Unix timestamp falls on a date inside the range.
    pub fn contains_ts(&self, ts: i64) -> bool {
        utc_date(ts).is_some_and(|d| self.contains(d))
    }

    /// Every date of the range, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// `[start 00:00:00, end+1 00:00:00)` in Unix seconds, for Gateway-side filters.
    pub fn bounds_ts(&self) -> (i64, i64) {
        let start = self.start.and_hms_opt(0, 0, 0).map(|t| t.and_utc().timestamp()).unwrap_or(0);
        let end = self
            .end
            .checked_add_days(Days::new(1))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|t| t.and_utc().timestamp())
            .unwrap_or(i64::MAX);
        (start, end)
    }
}

fn parse_date(field: &str, s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{field} must be a YYYY-MM-DD date, got '{s}'")))
}

/// UTC calendar date of a Unix timestamp.
pub fn utc_date(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

// ---------------------------------------------------------------------------
// Receipt (owned by the Gateway, read-only here)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(alias = "final_amount", default, serialize_with = "rust_decimal::serde::float::serialize")]
    pub final_amount: Decimal,
    #[serde(alias = "settled_usd_amount", default, serialize_with = "rust_decimal::serde::float::serialize")]
    pub settled_usd_amount: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub currency: String,
    /// Unix seconds.
    #[serde(alias = "created_at")]
    pub created_at: i64,
    /// Unix seconds; present iff payment settled.
    #[serde(alias = "paid_at", default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
    #[serde(default)]
    pub plan: PlanRef,
    #[serde(default)]
    pub member: MemberRef,
}

impl Receipt {
    pub fn created_date(&self) -> Option<NaiveDate> {
        utc_date(self.created_at)
    }

    pub fn raw_status(&self) -> RawStatus {
        RawStatus::parse(&self.status)
    }

    pub fn is_paid(&self) -> bool {
        self.raw_status().friendly() == FriendlyStatus::Paid
    }

    /// `paidAt`, when present, must not precede `createdAt`.
    pub fn timestamps_consistent(&self) -> bool {
        self.paid_at.map_or(true, |p| p >= self.created_at)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(alias = "formatted_price", default, deserialize_with = "null_as_default")]
    pub formatted_price: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRef {
    #[serde(default)]
    pub user: UserRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
}

/// The platform sends `null` for blank strings.
fn null_as_default<'de, D, T>(de: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Status taxonomy
// ---------------------------------------------------------------------------

/// Raw receipt statuses the platform is known to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawStatus {
    Paid,
    Succeeded,
    Pending,
    Open,
    Draft,
    Processing,
    PastDue,
    Unresolved,
    Failed,
    Uncollectible,
    Refunded,
    PartiallyRefunded,
    Canceled,
    Void,
    Other(String),
}

/// Display vocabulary for receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendlyStatus {
    Paid,
    Pending,
    Failed,
    Refunded,
    Canceled,
    Unknown,
}

// ---------------------------------------------------------------------------
// Products and checkout links (owned by the Gateway once created)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub visibility: String,
    pub verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLink {
    pub id: String,
    pub plan_id: String,
    pub internal_name: String,
    pub title: String,
    /// Decimal as string; currency-agnostic at this boundary.
    pub price: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Derived, per-request results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySalesBucket {
    pub date: NaiveDate,
    pub total_sales: u64,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_cash: Decimal,
    #[serde(serialize_with = "money::serialize_rounded")]
    pub average_per_sale: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_sales: u64,
    pub total_paid_sales: u64,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_cash: Decimal,
    #[serde(serialize_with = "money::serialize_rounded")]
    pub average_sale_amount: Decimal,
    pub status_breakdown: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub daily_sales: Vec<DailySalesBucket>,
    pub summary: SummaryStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedReceipt {
    #[serde(flatten)]
    pub receipt: Receipt,
    pub friendly_status: FriendlyStatus,
}

/// A checkout link that could not be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedCheckout {
    /// 1-based generation index.
    pub index: u32,
    pub internal_name: String,
    pub kind: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResult {
    pub product: Product,
    /// Successful links in generation order.
    pub checkout_links: Vec<CheckoutLink>,
    pub tracking_setup: bool,
    /// Same order and length as `checkout_links`.
    pub internal_names: Vec<String>,
    pub failed: Vec<FailedCheckout>,
}
