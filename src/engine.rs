use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::Result;
use crate::gateway::Gateway;
use crate::report;
use crate::tracking;
use crate::types::{DateRange, ReportData, TrackedReceipt, WorkflowResult};
use crate::workflow::Orchestrator;

/// The three caller-facing operations. Holds no per-request state; the only
/// thing shared between calls is the Gateway and the orchestrator's limiter.
pub struct Engine {
    gateway: Arc<dyn Gateway>,
    orchestrator: Orchestrator,
}

impl Engine {
    pub fn new(gateway: Arc<dyn Gateway>, orchestrator: Orchestrator) -> Self {
        Self { gateway, orchestrator }
    }

    pub async fn generate_report(&self, start: NaiveDate, end: NaiveDate) -> Result<ReportData> {
        let range = DateRange::new(start, end)?;
        report::generate_report(self.gateway.as_ref(), range).await
    }

    pub async fn complete_workflow(
        &self,
        title: &str,
        description: Option<&str>,
        checkout_count: u32,
    ) -> Result<WorkflowResult> {
        self.orchestrator
            .run_workflow(title, description, checkout_count)
            .await
    }

    pub async fn track_checkout_links(
        &self,
        internal_name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TrackedReceipt>> {
        let range = DateRange::new(start, end)?;
        tracking::track_by_internal_name(self.gateway.as_ref(), internal_name, range).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::Semaphore;

    use super::*;
    use crate::error::AppError;
    use crate::gateway::fake::FakeGateway;
    use crate::workflow::RetryPolicy;

    fn engine(gw: Arc<FakeGateway>) -> Engine {
        let orchestrator = Orchestrator::new(
            gw.clone(),
            Arc::new(Semaphore::new(2)),
            RetryPolicy::immediate(),
            "5.00".to_string(),
            "usd".to_string(),
        );
        Engine::new(gw, orchestrator)
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[tokio::test]
    async fn inverted_range_never_reaches_gateway() {
        let gw = Arc::new(FakeGateway::new());
        let engine = engine(gw.clone());

        let err = engine.generate_report(date(5), date(4)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRange { .. }));
        let err = engine.track_checkout_links("x", date(5), date(4)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRange { .. }));
        assert!(gw.last_filter.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn report_has_one_bucket_per_day() {
        let gw = Arc::new(FakeGateway::new());
        let report = engine(gw).generate_report(date(1), date(30)).await.unwrap();
        assert_eq!(report.daily_sales.len(), 30);
        assert!(report.daily_sales.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(report.summary.total_sales, 0);
    }

    #[tokio::test]
    async fn workflow_passes_through() {
        let gw = Arc::new(FakeGateway::new());
        let result = engine(gw).complete_workflow("Bronze", None, 3).await.unwrap();
        assert_eq!(result.checkout_links.len(), 3);
        assert!(result.checkout_links.iter().all(|l| l.price == "5.00"));
    }
}
