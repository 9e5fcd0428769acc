pub mod http;
pub mod latency;

#[cfg(test)]
pub mod fake;

pub use http::HttpGateway;
pub use latency::LatencyStats;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::{CheckoutLink, DateRange, Product, Receipt};

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCheckoutLinkRequest {
    pub product_id: String,
    pub internal_name: String,
    pub title: String,
    pub price: String,
    pub currency: String,
    pub description: Option<String>,
}

/// Receipt listing filter. Both fields are optional; `None` means unfiltered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiptFilter {
    pub internal_name: Option<String>,
    pub date_range: Option<DateRange>,
}

/// The external platform. The only source of truth for products, checkout
/// links and receipts; every call may suspend.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn create_product(&self, req: &CreateProductRequest) -> GatewayResult<Product>;

    async fn create_checkout_link(&self, req: &CreateCheckoutLinkRequest) -> GatewayResult<CheckoutLink>;

    async fn list_receipts(&self, filter: &ReceiptFilter) -> GatewayResult<Vec<Receipt>>;
}
