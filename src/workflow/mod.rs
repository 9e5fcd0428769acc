pub mod naming;
pub mod retry;

pub use retry::RetryPolicy;

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{info, warn};

use crate::config::{Config, MAX_CHECKOUT_COUNT};
use crate::error::{AppError, GatewayError, Result};
use crate::gateway::{CreateCheckoutLinkRequest, CreateProductRequest, Gateway};
use crate::types::{CheckoutLink, FailedCheckout, Product, WorkflowResult};

/// Drives "create product, then N checkout links" against the Gateway.
///
/// The limiter is shared with every other run so the platform's rate limit
/// is respected across concurrent requests.
pub struct Orchestrator {
    gateway: Arc<dyn Gateway>,
    limiter: Arc<Semaphore>,
    retry: RetryPolicy,
    price: String,
    currency: String,
}

impl Orchestrator {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        limiter: Arc<Semaphore>,
        retry: RetryPolicy,
        price: String,
        currency: String,
    ) -> Self {
        Self { gateway, limiter, retry, price, currency }
    }

    pub fn from_config(cfg: &Config, gateway: Arc<dyn Gateway>) -> Self {
        Self::new(
            gateway,
            Arc::new(Semaphore::new(cfg.workflow_concurrency)),
            RetryPolicy::default(),
            cfg.checkout_price.clone(),
            cfg.checkout_currency.clone(),
        )
    }

    async fn permit(&self) -> std::result::Result<SemaphorePermit<'_>, GatewayError> {
        self.limiter
            .acquire()
            .await
            .map_err(|_| GatewayError::Unavailable("gateway limiter closed".to_string()))
    }

    pub async fn run_workflow(
        &self,
        title: &str,
        description: Option<&str>,
        checkout_count: u32,
    ) -> Result<WorkflowResult> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
        if !(1..=MAX_CHECKOUT_COUNT).contains(&checkout_count) {
            return Err(AppError::Validation(format!(
                "checkoutCount must be between 1 and {MAX_CHECKOUT_COUNT}, got {checkout_count}"
            )));
        }
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        // Step 1: exactly one product; failure aborts before any link is attempted.
        let product_req = CreateProductRequest {
            title: title.to_string(),
            description: description.clone(),
        };
        let product = self
            .retry
            .run("create_product", || async {
                let _permit = self.permit().await?;
                self.gateway.create_product(&product_req).await
            })
            .await
            .map_err(AppError::ProductCreation)?;

        let suffix = naming::run_suffix();
        let names = naming::internal_names(title, checkout_count, &suffix);
        info!(
            event = "WORKFLOW_START",
            product_id = %product.id,
            checkout_count,
            run_suffix = %suffix,
            "WORKFLOW START | product: {} | links: {checkout_count} | suffix: {suffix}",
            product.id,
        );

        // join_all yields results in generation order regardless of completion order.
        let attempts = names.iter().enumerate().map(|(i, name)| {
            let index = i as u32 + 1;
            let req = CreateCheckoutLinkRequest {
                product_id: product.id.clone(),
                internal_name: name.clone(),
                title: format!("{title} #{index}"),
                price: self.price.clone(),
                currency: self.currency.clone(),
                description: description.clone(),
            };
            async move {
                let outcome = self
                    .retry
                    .run("create_checkout_link", || async {
                        let _permit = self.permit().await?;
                        self.gateway.create_checkout_link(&req).await
                    })
                    .await;
                (index, req.internal_name, outcome)
            }
        });
        let outcomes = join_all(attempts).await;

        Ok(collect_outcomes(product, checkout_count, outcomes))
    }
}

fn collect_outcomes(
    product: Product,
    checkout_count: u32,
    outcomes: Vec<(u32, String, std::result::Result<CheckoutLink, GatewayError>)>,
) -> WorkflowResult {
    let mut checkout_links = Vec::with_capacity(outcomes.len());
    let mut internal_names = Vec::with_capacity(outcomes.len());
    let mut failed = Vec::new();

    for (index, internal_name, outcome) in outcomes {
        match outcome {
            Ok(link) => {
                internal_names.push(internal_name);
                checkout_links.push(link);
            }
            Err(e) => {
                warn!(
                    event = "CHECKOUT_FAILED",
                    index,
                    internal_name = %internal_name,
                    kind = e.kind(),
                    "CHECKOUT FAILED | #{index} {internal_name} | {e}",
                );
                failed.push(FailedCheckout {
                    index,
                    internal_name,
                    kind: e.kind().to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let tracking_setup = failed.is_empty() && checkout_links.len() == checkout_count as usize;
    info!(
        event = "WORKFLOW_DONE",
        product_id = %product.id,
        created = checkout_links.len(),
        failed = failed.len(),
        tracking_setup,
        "WORKFLOW DONE | product: {} | created: {}/{checkout_count} | tracking: {tracking_setup}",
        product.id,
        checkout_links.len(),
    );

    WorkflowResult {
        product,
        checkout_links,
        tracking_setup,
        internal_names,
        failed,
    }
}
