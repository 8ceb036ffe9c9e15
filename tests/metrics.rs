use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{routing::get, Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use catering::billing::{
    self, Customer, DailyOrder, DateWindow, Kasbon, LedgerHandle, LedgerStore, Payment,
};
use tower::ServiceExt;

struct EmptyLedger;

#[async_trait]
impl LedgerStore for EmptyLedger {
    async fn customer(&self, _customer_id: i32) -> Result<Option<Customer>> {
        Ok(None)
    }

    async fn orders(&self, _customer_id: i32, _window: DateWindow) -> Result<Vec<DailyOrder>> {
        Ok(Vec::new())
    }

    async fn kasbons(&self, _customer_id: i32, _window: DateWindow) -> Result<Vec<Kasbon>> {
        Ok(Vec::new())
    }

    async fn payments(&self, _customer_id: i32, _window: DateWindow) -> Result<Vec<Payment>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn metrics_returns_ok_after_billing_traffic() {
    let ledger: LedgerHandle = Arc::new(EmptyLedger);
    let (layer, handle) = PrometheusMetricLayer::pair();
    let app = Router::new()
        .route("/metrics", get(move || async move { handle.render() }))
        .merge(billing::api::routes())
        .layer(layer)
        .layer(Extension(ledger));

    let summary = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/customer_summary/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(summary.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
