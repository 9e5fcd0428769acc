use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::AppError;
use crate::gateway::latency::{LatencyStats, LatencySummary};
use crate::report::Sheet;
use crate::types::{DateRange, ReportData, TrackedReceipt, WorkflowResult};

#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<Engine>,
    pub latency: Arc<LatencyStats>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/generate-report", post(generate_report))
        .route("/api/report-sheets", post(report_sheets))
        .route("/api/complete-workflow", post(complete_workflow))
        .route("/api/track-checkout-links", post(track_checkout_links))
        .route("/api/stats/latency", get(get_stats_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportBody {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteWorkflowBody {
    pub product_title: String,
    pub product_description: Option<String>,
    pub checkout_count: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackCheckoutLinksBody {
    pub internal_name: String,
    pub start_date: String,
    pub end_date: String,
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
        })
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn generate_report(
    State(state): State<ApiState>,
    body: Result<Json<GenerateReportBody>, JsonRejection>,
) -> Result<Json<ApiResponse<ReportData>>, AppError> {
    let Json(body) = body?;
    let range = DateRange::parse(&body.start_date, &body.end_date)?;
    let report = state.engine.generate_report(range.start(), range.end()).await?;
    let message = format!(
        "Report generated for {} day(s), {} sale(s)",
        report.daily_sales.len(),
        report.summary.total_sales
    );
    Ok(ApiResponse::ok(message, report))
}

/// Same report, shaped as exporter-ready tables.
async fn report_sheets(
    State(state): State<ApiState>,
    body: Result<Json<GenerateReportBody>, JsonRejection>,
) -> Result<Json<ApiResponse<Vec<Sheet>>>, AppError> {
    let Json(body) = body?;
    let range = DateRange::parse(&body.start_date, &body.end_date)?;
    let report = state.engine.generate_report(range.start(), range.end()).await?;
    Ok(ApiResponse::ok("Report sheets generated", report.to_sheets()))
}

async fn complete_workflow(
    State(state): State<ApiState>,
    body: Result<Json<CompleteWorkflowBody>, JsonRejection>,
) -> Result<Json<ApiResponse<WorkflowResult>>, AppError> {
    let Json(body) = body?;
    let checkout_count = u32::try_from(body.checkout_count).map_err(|_| {
        AppError::Validation(format!("checkoutCount out of range: {}", body.checkout_count))
    })?;
    let result = state
        .engine
        .complete_workflow(
            &body.product_title,
            body.product_description.as_deref(),
            checkout_count,
        )
        .await?;

    let message = if result.failed.is_empty() {
        format!(
            "Workflow completed: created {} checkout link(s)",
            result.checkout_links.len()
        )
    } else {
        format!(
            "Workflow partially completed: created {} of {checkout_count} checkout links, {} failed",
            result.checkout_links.len(),
            result.failed.len()
        )
    };
    Ok(ApiResponse::ok(message, result))
}

async fn track_checkout_links(
    State(state): State<ApiState>,
    body: Result<Json<TrackCheckoutLinksBody>, JsonRejection>,
) -> Result<Json<ApiResponse<Vec<TrackedReceipt>>>, AppError> {
    let Json(body) = body?;
    let range = DateRange::parse(&body.start_date, &body.end_date)?;
    let receipts = state
        .engine
        .track_checkout_links(&body.internal_name, range.start(), range.end())
        .await?;
    let message = format!("Found {} receipt(s)", receipts.len());
    Ok(ApiResponse::ok(message, receipts))
}

async fn get_stats_latency(
    State(state): State<ApiState>,
) -> Json<BTreeMap<&'static str, LatencySummary>> {
    Json(state.latency.summary())
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tokio::sync::Semaphore;
    use tower::ServiceExt;

    use super::*;
    use crate::gateway::fake::{FakeGateway, Script};
    use crate::error::GatewayError;
    use crate::workflow::{Orchestrator, RetryPolicy};

    fn app(gw: Arc<FakeGateway>) -> Router {
        let orchestrator = Orchestrator::new(
            gw.clone(),
            Arc::new(Semaphore::new(2)),
            RetryPolicy::immediate(),
            "10.00".to_string(),
            "usd".to_string(),
        );
        router(ApiState {
            engine: Arc::new(Engine::new(gw, orchestrator)),
            latency: Arc::new(LatencyStats::new()),
        })
    }

    async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn report_route_wraps_data() {
        let (status, v) = post_json(
            app(Arc::new(FakeGateway::new())),
            "/api/generate-report",
            serde_json::json!({ "startDate": "2024-01-01", "endDate": "2024-01-03" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["success"], true);
        assert_eq!(v["data"]["dailySales"].as_array().unwrap().len(), 3);
        assert_eq!(v["data"]["summary"]["averageSaleAmount"], 0.0);
    }

    #[tokio::test]
    async fn sheets_route_returns_three_tables() {
        let (status, v) = post_json(
            app(Arc::new(FakeGateway::new())),
            "/api/report-sheets",
            serde_json::json!({ "startDate": "2024-01-01", "endDate": "2024-01-02" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let sheets = v["data"].as_array().unwrap();
        assert_eq!(sheets.len(), 3);
        assert_eq!(sheets[0]["name"], "Daily Sales");
        assert_eq!(sheets[0]["rows"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn inverted_range_is_bad_request() {
        let (status, v) = post_json(
            app(Arc::new(FakeGateway::new())),
            "/api/track-checkout-links",
            serde_json::json!({ "internalName": "x", "startDate": "2024-01-03", "endDate": "2024-01-01" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["success"], false);
        assert_eq!(v["error"], "invalid_range_error");
    }

    #[tokio::test]
    async fn malformed_date_is_validation_error() {
        let (status, v) = post_json(
            app(Arc::new(FakeGateway::new())),
            "/api/generate-report",
            serde_json::json!({ "startDate": "01/01/2024", "endDate": "2024-01-03" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["error"], "validation_error");
    }

    #[tokio::test]
    async fn partial_workflow_is_success_with_failures_listed() {
        let gw = Arc::new(FakeGateway::new());
        gw.script_checkout(2, Script::Always(GatewayError::Rejected {
            status: 400,
            message: "nope".to_string(),
        }));
        let (status, v) = post_json(
            app(gw),
            "/api/complete-workflow",
            serde_json::json!({ "productTitle": "Gold", "productDescription": "", "checkoutCount": 3 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["success"], true);
        assert_eq!(v["data"]["trackingSetup"], false);
        assert_eq!(v["data"]["checkoutLinks"].as_array().unwrap().len(), 2);
        assert_eq!(v["data"]["internalNames"].as_array().unwrap().len(), 2);
        assert_eq!(v["data"]["failed"][0]["index"], 2);
        assert!(v["data"]["product"].get("description").is_none());
        assert!(v["message"].as_str().unwrap().contains("2 of 3"));
    }

    #[tokio::test]
    async fn product_failure_is_bad_gateway() {
        let gw = Arc::new(FakeGateway::new());
        gw.script_product(Script::Always(GatewayError::RateLimited));
        let (status, v) = post_json(
            app(gw),
            "/api/complete-workflow",
            serde_json::json!({ "productTitle": "Gold", "checkoutCount": 3 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(v["error"], "product_creation_error");
        assert!(v.get("data").is_none());
    }

    #[tokio::test]
    async fn missing_body_field_uses_error_envelope() {
        let gw = Arc::new(FakeGateway::new());
        let (status, v) = post_json(
            app(gw.clone()),
            "/api/complete-workflow",
            serde_json::json!({ "checkoutCount": 3 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["success"], false);
        assert_eq!(v["error"], "validation_error");
        assert!(v["message"].as_str().unwrap().contains("productTitle"));
        assert_eq!(gw.product_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unparsable_body_uses_error_envelope() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/generate-report")
            .header("content-type", "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let resp = app(Arc::new(FakeGateway::new())).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["error"], "validation_error");
    }

    #[tokio::test]
    async fn negative_count_is_validation_error() {
        let (status, v) = post_json(
            app(Arc::new(FakeGateway::new())),
            "/api/complete-workflow",
            serde_json::json!({ "productTitle": "Gold", "checkoutCount": -1 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["error"], "validation_error");
    }
}
