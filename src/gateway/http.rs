use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use tracing::{debug, warn};

use crate::config::{Config, MAX_RECEIPT_PAGES, RECEIPT_PAGE_SIZE};
use crate::error::{AppError, GatewayError, Result};
use crate::gateway::{
    CreateCheckoutLinkRequest, CreateProductRequest, Gateway, GatewayResult, LatencyStats,
    ReceiptFilter,
};
use crate::types::{CheckoutLink, Product, Receipt};

/// `Gateway` backed by the platform's REST API.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
    latency: Arc<LatencyStats>,
}

impl HttpGateway {
    pub fn new(cfg: &Config, latency: Arc<LatencyStats>) -> Result<Self> {
        let timeout = Duration::from_secs(cfg.gateway_timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AppError::Http)?;
        Ok(Self {
            client,
            base_url: cfg.gateway_api_url.trim_end_matches('/').to_string(),
            api_key: cfg.gateway_api_key.clone(),
            timeout,
            latency,
        })
    }

    /// Run one call under the per-call deadline and record its latency.
    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> GatewayResult<T>
    where
        F: Future<Output = GatewayResult<T>>,
    {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, fut).await {
            Ok(r) => r,
            Err(_) => Err(GatewayError::Timeout(self.timeout.as_secs())),
        };
        self.latency.record(operation, started.elapsed());
        outcome
    }

    async fn send_json(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> GatewayResult<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .client
            .request(method, &url)
            .bearer_auth(&self.api_key)
            .query(query);
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(map_status(status, &text));
        }
        serde_json::from_str(&text).map_err(|e| GatewayError::Decode(format!("{path}: {e}")))
    }

    fn transport_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.timeout.as_secs())
        } else if e.is_decode() {
            GatewayError::Decode(e.to_string())
        } else {
            GatewayError::Unavailable(e.to_string())
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn create_product(&self, req: &CreateProductRequest) -> GatewayResult<Product> {
        let mut body = serde_json::json!({
            "title": req.title,
            "visibility": "visible",
        });
        if let Some(description) = &req.description {
            body["description"] = serde_json::Value::from(description.as_str());
        }
        let v = self
            .timed("create_product", self.send_json(Method::POST, "/products", &[], Some(&body)))
            .await?;
        parse_product(&v)
    }

    async fn create_checkout_link(&self, req: &CreateCheckoutLinkRequest) -> GatewayResult<CheckoutLink> {
        let mut plan = serde_json::json!({
            "product_id": req.product_id,
            "title": req.title,
            "initial_price": req.price,
            "base_currency": req.currency,
            "plan_type": "one_time",
            "internal_notes": req.internal_name,
        });
        if let Some(description) = &req.description {
            plan["description"] = serde_json::Value::from(description.as_str());
        }
        let body = serde_json::json!({
            "plan": plan,
            "metadata": { "internal_name": req.internal_name },
        });
        let v = self
            .timed(
                "create_checkout_link",
                self.send_json(Method::POST, "/checkout_configurations", &[], Some(&body)),
            )
            .await?;
        parse_checkout_link(&v, req)
    }

    async fn list_receipts(&self, filter: &ReceiptFilter) -> GatewayResult<Vec<Receipt>> {
        let mut base_query: Vec<(&str, String)> = vec![("per", RECEIPT_PAGE_SIZE.to_string())];
        if let Some(name) = &filter.internal_name {
            base_query.push(("internal_name", name.clone()));
        }
        if let Some(range) = &filter.date_range {
            let (after, before) = range.bounds_ts();
            base_query.push(("created_after", after.to_string()));
            base_query.push(("created_before", before.to_string()));
        }

        let mut receipts = Vec::new();
        let mut page = 1u32;

        loop {
            let mut query = base_query.clone();
            query.push(("page", page.to_string()));

            let v = self
                .timed("list_receipts", self.send_json(Method::GET, "/receipts", &query, None))
                .await?;

            let items = match v.get("data").and_then(|d| d.as_array()) {
                Some(a) => a,
                None => {
                    return Err(GatewayError::Decode(
                        "/receipts response had no data array".to_string(),
                    ))
                }
            };

            let total_pages = v
                .get("pagination")
                .and_then(|p| p.get("total_pages"))
                .and_then(|t| t.as_u64())
                .unwrap_or(1);
            if total_pages > u64::from(MAX_RECEIPT_PAGES) {
                warn!("Receipt listing refused: {total_pages} pages exceeds {MAX_RECEIPT_PAGES}");
                return Err(GatewayError::Truncated {
                    total_pages,
                    cap: MAX_RECEIPT_PAGES,
                });
            }

            for item in items {
                let receipt = serde_json::from_value::<Receipt>(item.clone()).map_err(|e| {
                    let id = item.get("id").and_then(|i| i.as_str()).unwrap_or("?");
                    GatewayError::Decode(format!("receipt {id} on page {page}: {e}"))
                })?;
                receipts.push(receipt);
            }

            debug!(page, total_pages, rows = items.len(), "receipt page fetched");

            if items.is_empty() || u64::from(page) >= total_pages {
                break;
            }
            page += 1;
        }

        Ok(receipts)
    }
}

fn map_status(status: StatusCode, body: &str) -> GatewayError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return GatewayError::RateLimited;
    }
    if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        return GatewayError::Unavailable(format!("HTTP {status}"));
    }
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| body.chars().take(200).collect());
    GatewayError::Rejected {
        status: status.as_u16(),
        message,
    }
}

fn str_field(v: &serde_json::Value, key: &str) -> Option<String> {
    v.get(key).and_then(|x| match x {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn parse_product(v: &serde_json::Value) -> GatewayResult<Product> {
    let id = str_field(v, "id")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GatewayError::Decode("product response missing id".to_string()))?;

    Ok(Product {
        id,
        title: str_field(v, "title").unwrap_or_default(),
        description: str_field(v, "description").filter(|s| !s.is_empty()),
        visibility: str_field(v, "visibility").unwrap_or_else(|| "visible".to_string()),
        verified: v.get("verified").and_then(|x| x.as_bool()).unwrap_or(false),
        created_at: str_field(v, "created_at").unwrap_or_default(),
        updated_at: str_field(v, "updated_at").unwrap_or_default(),
    })
}

/// Fields the platform echoes back are preferred; the request fills gaps.
fn parse_checkout_link(
    v: &serde_json::Value,
    req: &CreateCheckoutLinkRequest,
) -> GatewayResult<CheckoutLink> {
    let id = str_field(v, "id")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GatewayError::Decode("checkout response missing id".to_string()))?;
    let plan = v.get("plan").unwrap_or(&serde_json::Value::Null);
    let plan_id = str_field(plan, "id")
        .or_else(|| str_field(v, "plan_id"))
        .ok_or_else(|| GatewayError::Decode(format!("checkout {id} missing plan id")))?;

    Ok(CheckoutLink {
        id,
        plan_id,
        internal_name: req.internal_name.clone(),
        title: str_field(plan, "title").unwrap_or_else(|| req.title.clone()),
        price: str_field(plan, "initial_price").unwrap_or_else(|| req.price.clone()),
        currency: str_field(plan, "base_currency").unwrap_or_else(|| req.currency.clone()),
        description: str_field(plan, "description").or_else(|| req.description.clone()),
    })
}
