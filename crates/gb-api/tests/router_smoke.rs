use axum::{body::Body, http::Request, http::StatusCode};
use tower::ServiceExt;

#[tokio::test]
async fn livez_healthy_and_api_requires_key() {
    let app = gb_api::create_router(gb_api::test_state("test-key"));

    let livez_response = app
        .clone()
        .oneshot(Request::builder().uri("/livez").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(livez_response.status(), StatusCode::OK);

    let unauthorized = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/projects")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

    let public_read = app
        .oneshot(
            Request::builder()
                .uri("/api/projects")
                .header("x-api-key", "test-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(public_read.status(), StatusCode::OK);
}

#[tokio::test]
async fn writes_need_an_end_user() {
    let app = gb_api::create_router(gb_api::test_state("test-key"));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/projects")
                .header("x-api-key", "test-key")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"title":"Landing page"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn out_of_range_page_is_a_bad_request() {
    let app = gb_api::create_router(gb_api::test_state("test-key"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/projects?limit=500")
                .header("x-api-key", "test-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
