use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const KEY: &str = "test-key";

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", KEY)
        .header("x-request-id", "flow-test");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn bid(amount: i64) -> Value {
    json!({
        "bid_amount": amount,
        "timeline": "3 weeks",
        "cover_letter": "I have shipped similar systems."
    })
}

#[tokio::test]
async fn proposal_to_contract_through_the_router() {
    let app = gb_api::create_router(gb_api::test_state(KEY));
    let owner = Uuid::new_v4();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let (status, project) = send(
        &app,
        "POST",
        "/api/projects",
        Some(owner),
        Some(json!({
            "title": "Booking engine",
            "currency": "usd",
            "deliverables": [{ "title": "API" }, { "title": "Admin UI" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = project["id"].as_i64().unwrap();

    let uri = format!("/api/projects/{project_id}/proposals");
    let (status, winner) = send(&app, "POST", &uri, Some(alice), Some(bid(4_000))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, loser) = send(&app, "POST", &uri, Some(bob), Some(bid(3_500))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "POST", &uri, Some(bob), Some(bid(3_000))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let winner_id = winner["id"].as_str().unwrap();
    let loser_id = loser["id"].as_str().unwrap();

    // Only the owner may accept.
    let accept = format!("/api/proposals/{winner_id}/accept");
    let (status, body) = send(&app, "POST", &accept, Some(bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
    assert_eq!(body["request_id"], "flow-test");

    let (status, accepted) = send(&app, "POST", &accept, Some(owner), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(accepted["replayed"], false);
    assert_eq!(accepted["rejected_proposals"], 1);
    assert_eq!(accepted["contract"]["budget_amount"], 4_000);
    assert_eq!(accepted["contract"]["currency"], "USD");
    assert_eq!(accepted["contract"]["milestones"].as_array().unwrap().len(), 2);
    let contract_id = accepted["contract"]["id"].as_str().unwrap().to_string();

    let (status, replay) = send(&app, "POST", &accept, Some(owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replay["replayed"], true);
    assert_eq!(replay["contract"]["id"], contract_id.as_str());

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/proposals/{loser_id}/accept"),
        Some(owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let (_, project) = send(
        &app,
        "GET",
        &format!("/api/projects/{project_id}"),
        Some(owner),
        None,
    )
    .await;
    assert_eq!(project["status"], "in_progress");
    assert_eq!(project["freelancer_id"], alice.to_string());

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/proposals/{winner_id}"),
        Some(alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let contract_uri = format!("/api/contracts/{contract_id}");
    let (status, _) = send(&app, "GET", &contract_uri, Some(bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, progressed) = send(
        &app,
        "POST",
        &format!("{contract_uri}/progress"),
        Some(alice),
        Some(json!({ "progress": 60 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progressed["progress"], 60);

    let (status, _) = send(
        &app,
        "POST",
        &format!("{contract_uri}/progress"),
        Some(alice),
        Some(json!({ "progress": 101 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, completed) = send(
        &app,
        "POST",
        &format!("{contract_uri}/complete"),
        Some(owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "completed");
    assert_eq!(completed["progress"], 100);

    let (_, project) = send(
        &app,
        "GET",
        &format!("/api/projects/{project_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(project["status"], "completed");

    let (_, mine) = send(&app, "GET", "/api/contracts", Some(alice), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn saved_job_toggle_through_the_router() {
    let app = gb_api::create_router(gb_api::test_state(KEY));
    let owner = Uuid::new_v4();
    let reader = Uuid::new_v4();

    let (_, project) = send(
        &app,
        "POST",
        "/api/projects",
        Some(owner),
        Some(json!({ "title": "Data pipeline", "currency": "EUR" })),
    )
    .await;
    let uri = format!("/api/saved-jobs/{}", project["id"]);

    let (status, _) = send(&app, "PUT", &uri, Some(reader), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "PUT", &uri, Some(reader), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "duplicate");

    let (_, body) = send(&app, "GET", &uri, Some(reader), None).await;
    assert_eq!(body["saved"], true);

    let (_, body) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(body["saved"], false);

    for _ in 0..2 {
        let (status, _) = send(&app, "DELETE", &uri, Some(reader), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (_, list) = send(&app, "GET", "/api/saved-jobs", Some(reader), None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn recruitment_board_through_the_router() {
    let app = gb_api::create_router(gb_api::test_state(KEY));
    let employer = Uuid::new_v4();
    let applicant = Uuid::new_v4();

    let (status, job) = send(
        &app,
        "POST",
        "/api/recruitment/jobs",
        Some(employer),
        Some(json!({
            "title": "Backend engineer",
            "company": "Acme",
            "employment_type": "full_time",
            "salary_min": 1000,
            "salary_max": 2000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let job_id = job["id"].as_i64().unwrap();

    let applications = format!("/api/recruitment/jobs/{job_id}/applications");
    let (status, application) = send(
        &app,
        "POST",
        &applications,
        Some(applicant),
        Some(json!({ "cover_letter": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "GET", &applications, Some(applicant), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let review = format!("/api/applications/{}/review", application["id"].as_str().unwrap());
    let (status, reviewed) = send(
        &app,
        "POST",
        &review,
        Some(employer),
        Some(json!({ "status": "shortlisted" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["status"], "shortlisted");

    let (status, closed) = send(
        &app,
        "POST",
        &format!("/api/recruitment/jobs/{job_id}/close"),
        Some(employer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["status"], "closed");

    let (_, open) = send(
        &app,
        "GET",
        "/api/recruitment/jobs?open_only=true",
        None,
        None,
    )
    .await;
    assert!(open["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn project_without_currency_takes_no_bids() {
    let app = gb_api::create_router(gb_api::test_state(KEY));
    let owner = Uuid::new_v4();

    let (status, body) = send(
        &app,
        "POST",
        "/api/projects",
        Some(owner),
        Some(json!({ "title": "Mobile app", "budget_max": 900 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");

    let (_, list) = send(&app, "GET", "/api/projects", None, None).await;
    assert!(list["items"].as_array().unwrap().is_empty());
}
