//! HTTP-level integration tests for the procurement API.
//!
//! These prove the deployed contract end to end: request validation, the
//! authorization matrix, versioning and the decision protocol, all through
//! the router.
//!
//! Requires a running PostgreSQL database.
//! Run with: DATABASE_URL="postgresql:///tender" cargo test -p tender_server --test http_integration -- --ignored --nocapture

use std::sync::Arc;

use axum::body::Body;
use http_body_util::BodyExt;
use hyper::{Request, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use tender_core::{BidService, TenderService};
use tender_postgres::{schema, PgStores};
use tender_server::router::build_router;

/// Identities seeded for one test run. Usernames are tagged with a fresh
/// uuid so reruns against the same database stay independent.
struct Seed {
    org_id: Uuid,
    buyer: String,
    voters: [String; 3],
    supplier: String,
}

async fn build_test_app() -> (axum::Router, Seed) {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("failed to connect to test database");

    schema::bootstrap(&pool).await.expect("schema bootstrap");

    let tag = Uuid::new_v4().simple().to_string();
    let org_id: Uuid = sqlx::query_scalar(
        "INSERT INTO organization (name, type) VALUES ($1, 'LLC') RETURNING id",
    )
    .bind(format!("org-{tag}"))
    .fetch_one(&pool)
    .await
    .expect("seed organization");

    let voters = [
        format!("jambo-{tag}"),
        format!("ignat-{tag}"),
        format!("test-user-{tag}"),
    ];
    for username in &voters {
        let user_id: Uuid =
            sqlx::query_scalar("INSERT INTO employee (username) VALUES ($1) RETURNING id")
                .bind(username)
                .fetch_one(&pool)
                .await
                .expect("seed employee");
        sqlx::query(
            "INSERT INTO organization_responsible (organization_id, user_id) VALUES ($1, $2)",
        )
        .bind(org_id)
        .bind(user_id)
        .execute(&pool)
        .await
        .expect("seed responsible");
    }

    let supplier = format!("eger-{tag}");
    sqlx::query("INSERT INTO employee (username) VALUES ($1)")
        .bind(&supplier)
        .execute(&pool)
        .await
        .expect("seed supplier");

    let stores = PgStores::new(pool);
    let tender_store = Arc::new(stores.tenders);
    let bid_store = Arc::new(stores.bids);
    let checkers = Arc::new(stores.checkers);

    let tenders = Arc::new(TenderService::new(
        tender_store.clone(),
        tender_store.clone(),
        tender_store,
        bid_store.clone(),
        bid_store.clone(),
        checkers.clone(),
    ));
    let bids = Arc::new(BidService::new(
        bid_store.clone(),
        bid_store.clone(),
        bid_store.clone(),
        bid_store.clone(),
        bid_store,
        checkers,
    ));

    let buyer = voters[0].clone();
    (
        build_router(tenders, bids),
        Seed {
            org_id,
            buyer,
            voters,
            supplier,
        },
    )
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn put(uri: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

async fn published_tender(app: &axum::Router, seed: &Seed) -> String {
    let (status, tender) = send(
        app,
        post_json(
            "/api/tenders/new",
            json!({
                "name": "road works",
                "description": "resurfacing",
                "serviceType": "Construction",
                "organizationId": seed.org_id,
                "creatorUsername": seed.buyer,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create tender: {tender}");
    let tender_id = tender["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        app,
        put(&format!(
            "/api/tenders/{tender_id}/status?status=Published&username={}",
            seed.buyer
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "publish tender: {body}");
    tender_id
}

async fn published_bid(app: &axum::Router, seed: &Seed, tender_id: &str) -> String {
    let (status, bid) = send(
        app,
        post_json(
            "/api/bids/new",
            json!({
                "name": "our offer",
                "description": "we can do it",
                "tenderId": tender_id,
                "authorType": "User",
                "authorId": employee_id(app, seed).await,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create bid: {bid}");
    let bid_id = bid["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        app,
        put(&format!(
            "/api/bids/{bid_id}/status?status=Published&username={}",
            seed.supplier
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "publish bid: {body}");
    bid_id
}

/// The API asserts identity by username; bid creation wants the author id,
/// which `/api/bids/my` exposes once a bid exists. For the first bid the
/// test reads it from the database seed instead — simplest is to resolve
/// through a throwaway query.
async fn employee_id(_app: &axum::Router, seed: &Seed) -> Uuid {
    let database_url = std::env::var("DATABASE_URL").unwrap();
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .unwrap();
    sqlx::query_scalar("SELECT id FROM employee WHERE username = $1")
        .bind(&seed.supplier)
        .fetch_one(&pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore]
async fn ping_responds_ok() {
    let (app, _) = build_test_app().await;
    let (status, body) = send(&app, get("/api/ping")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}

#[tokio::test]
#[ignore]
async fn invalid_feed_parameters_are_rejected() {
    let (app, _) = build_test_app().await;

    let (status, body) = send(&app, get("/api/tenders?limit=-1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["reason"].is_string());

    let (status, _) = send(&app, get("/api/tenders?offset=-1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn unknown_user_is_unauthorized() {
    let (app, _) = build_test_app().await;
    let (status, body) = send(&app, get("/api/tenders/my?username=nobody-at-all")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["reason"].is_string());
}

#[tokio::test]
#[ignore]
async fn rejection_cancels_the_bid() {
    let (app, seed) = build_test_app().await;
    let tender_id = published_tender(&app, &seed).await;
    let bid_id = published_bid(&app, &seed, &tender_id).await;

    let (status, bid) = send(
        &app,
        put(&format!(
            "/api/bids/{bid_id}/submit_decision?decision=Rejected&username={}",
            seed.buyer
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "submit decision: {bid}");
    assert_eq!(bid["status"], "Canceled");
    assert_eq!(bid["version"], 3);
}

#[tokio::test]
#[ignore]
async fn quorum_approval_closes_the_tender() {
    let (app, seed) = build_test_app().await;
    let tender_id = published_tender(&app, &seed).await;
    let bid_id = published_bid(&app, &seed, &tender_id).await;

    let mut last = Value::Null;
    for voter in &seed.voters {
        let (status, bid) = send(
            &app,
            put(&format!(
                "/api/bids/{bid_id}/submit_decision?decision=Approved&username={voter}"
            )),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "vote by {voter}: {bid}");
        last = bid;
    }

    assert_eq!(last["status"], "Published");
    assert_eq!(last["version"], 2);

    let (status, tender_status) = send(
        &app,
        get(&format!(
            "/api/tenders/{tender_id}/status?username={}",
            seed.buyer
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tender_status, Value::String("Closed".into()));
}

#[tokio::test]
#[ignore]
async fn double_vote_is_forbidden() {
    let (app, seed) = build_test_app().await;
    let tender_id = published_tender(&app, &seed).await;
    let bid_id = published_bid(&app, &seed, &tender_id).await;

    let vote = format!(
        "/api/bids/{bid_id}/submit_decision?decision=Approved&username={}",
        seed.buyer
    );
    let (status, _) = send(&app, put(&vote)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, put(&vote)).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
}

#[tokio::test]
#[ignore]
async fn edit_and_rollback_restore_content() {
    let (app, seed) = build_test_app().await;
    let tender_id = published_tender(&app, &seed).await;

    let (status, edited) = send(
        &app,
        Request::builder()
            .method("PATCH")
            .uri(format!(
                "/api/tenders/{tender_id}/edit?username={}",
                seed.buyer
            ))
            .header("content-type", "application/json")
            .body(Body::from(json!({"name": "bridge works"}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{edited}");
    assert_eq!(edited["name"], "bridge works");
    assert_eq!(edited["version"], 3);

    let (status, rolled) = send(
        &app,
        put(&format!(
            "/api/tenders/{tender_id}/rollback/2?username={}",
            seed.buyer
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{rolled}");
    assert_eq!(rolled["name"], "road works");
    assert_eq!(rolled["version"], 4);
}

#[tokio::test]
#[ignore]
async fn feed_hides_unpublished_tenders() {
    let (app, seed) = build_test_app().await;
    let published = published_tender(&app, &seed).await;

    // A second tender stays in Created.
    let (status, draft) = send(
        &app,
        post_json(
            "/api/tenders/new",
            json!({
                "name": "draft tender",
                "description": "unpublished",
                "serviceType": "Delivery",
                "organizationId": seed.org_id,
                "creatorUsername": seed.buyer,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{draft}");
    let draft_id = draft["id"].as_str().unwrap();

    let (status, feed) = send(&app, get("/api/tenders")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = feed
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&published.as_str()));
    assert!(!ids.contains(&draft_id));
}
