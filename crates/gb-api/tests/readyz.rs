use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::{body::Body, http::Request, http::StatusCode};
use gb_common::store::MemoryStore;
use tower::ServiceExt;

async fn readyz_status(app: axum::Router) -> StatusCode {
    app.oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn readyz_returns_service_unavailable_when_not_ready() {
    let state = gb_api::test_state("test-key");
    state.readiness.store(false, Ordering::SeqCst);

    assert_eq!(
        readyz_status(gb_api::create_router(state)).await,
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn readyz_follows_store_availability() {
    let store = Arc::new(MemoryStore::new());
    let app = gb_api::create_router(gb_api::test_state_with_store("test-key", store.clone()));

    assert_eq!(readyz_status(app.clone()).await, StatusCode::OK);

    store.set_offline(true);
    assert_eq!(readyz_status(app).await, StatusCode::SERVICE_UNAVAILABLE);
}
