use crate::error::{AppError, Result};

pub const GATEWAY_API_URL: &str = "https://api.whop.com/api/v2";

/// Upper bound on checkout links per workflow run (platform reasonable-use limit).
pub const MAX_CHECKOUT_COUNT: u32 = 50;

/// Longest inclusive date range accepted by report and tracking queries.
pub const MAX_RANGE_DAYS: i64 = 366;

/// Total attempts for a Gateway write, first try included.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Backoff before retry N (milliseconds). The last value is reused if attempts outgrow the table.
pub const RETRY_BACKOFF_MS: &[u64] = &[250, 500, 1000];

/// Receipts requested per page from the Gateway.
pub const RECEIPT_PAGE_SIZE: usize = 100;

/// Hard cap on pages followed for a single receipt listing.
pub const MAX_RECEIPT_PAGES: u32 = 100;

/// Maximum length of the title slug embedded in internal names.
pub const INTERNAL_NAME_SLUG_MAX: usize = 32;

#[derive(Debug, Clone)]
pub struct Config {
    pub gateway_api_url: String,
    /// Bearer token for the platform. Never logged.
    pub gateway_api_key: String,
    pub log_level: String,
    pub api_port: u16,
    /// Per-call Gateway deadline (GATEWAY_TIMEOUT_SECS)
    pub gateway_timeout_secs: u64,
    /// Permits of the shared Gateway limiter used by workflow runs (WORKFLOW_CONCURRENCY)
    pub workflow_concurrency: usize,
    /// Price attached to every generated checkout link (CHECKOUT_PRICE)
    pub checkout_price: String,
    /// Currency attached to every generated checkout link (CHECKOUT_CURRENCY)
    pub checkout_currency: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let gateway_api_key = std::env::var("GATEWAY_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::Config("GATEWAY_API_KEY must be set".to_string()))?;

        Ok(Self {
            gateway_api_url: std::env::var("GATEWAY_API_URL")
                .unwrap_or_else(|_| GATEWAY_API_URL.to_string()),
            gateway_api_key,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            gateway_timeout_secs: std::env::var("GATEWAY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".to_string())
                .parse::<u64>()
                .unwrap_or(15),
            workflow_concurrency: std::env::var("WORKFLOW_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .unwrap_or(4),
            checkout_price: std::env::var("CHECKOUT_PRICE")
                .unwrap_or_else(|_| "10.00".to_string()),
            checkout_currency: std::env::var("CHECKOUT_CURRENCY")
                .unwrap_or_else(|_| "usd".to_string()),
        })
    }
}
