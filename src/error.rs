use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use chrono::NaiveDate;
use thiserror::Error;

/// Failures reported by the external platform.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("rate limited by platform")]
    RateLimited,

    #[error("gateway call timed out after {0}s")]
    Timeout(u64),

    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    #[error("gateway rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected gateway response: {0}")]
    Decode(String),

    #[error("receipt listing has {total_pages} pages, more than the {cap} page limit")]
    Truncated { total_pages: u64, cap: u32 },
}

impl GatewayError {
    /// Transient errors are worth retrying; everything else is surfaced at once.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimited | GatewayError::Timeout(_) | GatewayError::Unavailable(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        if self.is_transient() {
            "gateway_transient"
        } else {
            "gateway_permanent"
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid range: start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("product creation failed: {0}")]
    ProductCreation(GatewayError),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Malformed or incomplete request bodies are caller input errors.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    /// Machine-readable error kind carried next to the message.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::InvalidRange { .. } => "invalid_range_error",
            AppError::ProductCreation(_) => "product_creation_error",
            AppError::Gateway(_) => "gateway_error",
            AppError::Http(_) => "http_error",
            AppError::Json(_) => "json_error",
            AppError::Config(_) => "config_error",
            AppError::Io(_) => "io_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidRange { .. } => StatusCode::BAD_REQUEST,
            AppError::ProductCreation(_) | AppError::Gateway(_) | AppError::Http(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({
            "success": false,
            "message": self.to_string(),
            "error": self.kind(),
        });
        (self.status(), Json(body)).into_response()
    }
}
