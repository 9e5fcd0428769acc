//! Scriptable in-memory gateway for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::gateway::{
    CreateCheckoutLinkRequest, CreateProductRequest, Gateway, GatewayResult, ReceiptFilter,
};
use crate::types::{CheckoutLink, Product, Receipt};

/// What to do with calls whose checkout title ends in `#{index}`.
#[derive(Debug, Clone)]
pub enum Script {
    /// Fail with this error the given number of times, then succeed.
    FailTimes(usize, GatewayError),
    /// Always fail with this error.
    Always(GatewayError),
}

#[derive(Default)]
pub struct FakeGateway {
    pub product_script: Mutex<Option<Script>>,
    checkout_scripts: Mutex<HashMap<u32, Script>>,
    pub receipts: Mutex<Vec<Receipt>>,
    pub list_error: Mutex<Option<GatewayError>>,
    pub checkout_delay: Mutex<Option<Duration>>,
    pub product_calls: AtomicUsize,
    pub checkout_calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub last_filter: Mutex<Option<ReceiptFilter>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_receipts(receipts: Vec<Receipt>) -> Self {
        let gw = Self::default();
        *gw.receipts.lock().unwrap() = receipts;
        gw
    }

    pub fn script_checkout(&self, index: u32, script: Script) {
        self.checkout_scripts.lock().unwrap().insert(index, script);
    }

    pub fn script_product(&self, script: Script) {
        *self.product_script.lock().unwrap() = Some(script);
    }

    fn take_failure(script: &mut Option<Script>) -> Option<GatewayError> {
        match script {
            Some(Script::Always(e)) => Some(e.clone()),
            Some(Script::FailTimes(n, e)) if *n > 0 => {
                *n -= 1;
                Some(e.clone())
            }
            _ => None,
        }
    }
}

fn index_from_title(title: &str) -> u32 {
    title
        .rsplit('#')
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn create_product(&self, req: &CreateProductRequest) -> GatewayResult<Product> {
        self.product_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = Self::take_failure(&mut self.product_script.lock().unwrap()) {
            return Err(e);
        }
        Ok(Product {
            id: "prod_test".to_string(),
            title: req.title.clone(),
            description: req.description.clone(),
            visibility: "visible".to_string(),
            verified: false,
            created_at: "1700000000".to_string(),
            updated_at: "1700000000".to_string(),
        })
    }

    async fn create_checkout_link(&self, req: &CreateCheckoutLinkRequest) -> GatewayResult<CheckoutLink> {
        self.checkout_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let index = index_from_title(&req.title);
        let delay = *self.checkout_delay.lock().unwrap();
        if let Some(d) = delay {
            // Later links finish first so completion order differs from generation order.
            tokio::time::sleep(d / index.max(1)).await;
        }

        let failure = {
            let mut scripts = self.checkout_scripts.lock().unwrap();
            let mut slot = scripts.remove(&index);
            let failure = Self::take_failure(&mut slot);
            if let Some(s) = slot {
                scripts.insert(index, s);
            }
            failure
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if let Some(e) = failure {
            return Err(e);
        }

        Ok(CheckoutLink {
            id: format!("ch_{index}"),
            plan_id: format!("plan_{index}"),
            internal_name: req.internal_name.clone(),
            title: req.title.clone(),
            price: req.price.clone(),
            currency: req.currency.clone(),
            description: req.description.clone(),
        })
    }

    async fn list_receipts(&self, filter: &ReceiptFilter) -> GatewayResult<Vec<Receipt>> {
        *self.last_filter.lock().unwrap() = Some(filter.clone());
        if let Some(e) = self.list_error.lock().unwrap().clone() {
            return Err(e);
        }
        Ok(self.receipts.lock().unwrap().clone())
    }
}
