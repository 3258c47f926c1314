//! Drives the assembled router in-process: register/login, animal CRUD with
//! weight history, feeding records, and the upcoming-feedings queue, all
//! against an in-memory store and a pinned clock.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use herptrack_api::{AppStateInner, router};
use herptrack_db::Database;
use herptrack_schedule::FixedClock;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()
}

fn app() -> Router {
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: "test-secret".into(),
        clock: Arc::new(FixedClock(now())),
    });
    router(state)
}

async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "hunter22",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
}

async fn create_animal(app: &Router, token: &str, body: Value) -> Value {
    let (status, body) = send(app, "POST", "/animals", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body
}

#[tokio::test]
async fn register_and_login_roundtrip() {
    let app = app();
    register(&app, "sam").await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "sam", "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["username"], "sam");
    assert_eq!(body["user"]["email"], "sam@example.com");
    // The hash never leaves the store.
    assert!(body["user"].get("password").is_none());

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "sam", "password": "wrong-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication failed");

    // Unknown user reads the same as a bad password.
    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "nobody", "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication failed");
}

#[tokio::test]
async fn duplicate_registrations_conflict() {
    let app = app();
    register(&app, "sam").await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": "sam",
            "email": "other@example.com",
            "password": "hunter22",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "username already exists");

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": "pat",
            "email": "sam@example.com",
            "password": "hunter22",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "email already exists");
}

#[tokio::test]
async fn register_validation_names_the_field() {
    let app = app();
    let cases = [
        (json!({ "username": "sam", "email": "not-an-email", "password": "hunter22" }), "email"),
        (json!({ "username": "sam", "email": "sam@example.com", "password": "12345" }), "password"),
        (json!({ "username": "   ", "email": "sam@example.com", "password": "hunter22" }), "username"),
    ];
    for (body, field) in cases {
        let (status, body) = send(&app, "POST", "/auth/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], field);
    }
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = app();

    let (status, _) = send(&app, "GET", "/animals", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/animals", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn animal_crud_with_weight_history() {
    let app = app();
    let token = register(&app, "sam").await;

    let animal = create_animal(
        &app,
        &token,
        json!({ "name": "Nagini", "breed": "Ball Python", "weight": 150.5 }),
    )
    .await;
    let id = animal["id"].as_str().unwrap().to_string();
    assert_eq!(animal["feeding_frequency_days"], 7);
    assert_eq!(animal["feeding_status"]["status"], "never_fed");
    assert_eq!(animal["feeding_status"]["priority"], 4);

    let (status, fetched) = send(&app, "GET", &format!("/animals/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Nagini");
    assert_eq!(fetched["weight"], 150.5);

    // Initial weight seeds one history row.
    let (_, history) = send(
        &app,
        "GET",
        &format!("/animals/{id}/weight-history"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["weight"], 150.5);

    // Re-submitting the same weight adds nothing.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/animals/{id}"),
        Some(&token),
        Some(json!({ "weight": 150.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, history) = send(
        &app,
        "GET",
        &format!("/animals/{id}/weight-history"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    // A new value appends exactly one row.
    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/animals/{id}"),
        Some(&token),
        Some(json!({ "weight": 162.25 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["weight"], 162.25);
    let (_, history) = send(
        &app,
        "GET",
        &format!("/animals/{id}/weight-history"),
        Some(&token),
        None,
    )
    .await;
    let weights: Vec<_> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["weight"].clone())
        .collect();
    assert_eq!(weights.len(), 2);
    assert!(weights.contains(&json!(162.25)));

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/animals/{id}"),
        Some(&token),
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "name");

    let (status, _) = send(&app, "DELETE", &format!("/animals/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &format!("/animals/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn animal_validation_rejects_out_of_range_fields() {
    let app = app();
    let token = register(&app, "sam").await;

    let cases = [
        (json!({ "name": "Rex", "feeding_frequency_days": 0 }), "feeding_frequency_days"),
        (json!({ "name": "Rex", "feeding_frequency_days": 366 }), "feeding_frequency_days"),
        (json!({ "name": "Rex", "weight": 0.0 }), "weight"),
        (json!({ "name": "Rex", "weight": 10000000.0 }), "weight"),
        (json!({ "name": "" }), "name"),
    ];
    for (body, field) in cases {
        let (status, body) = send(&app, "POST", "/animals", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], field);
    }
}

#[tokio::test]
async fn feeding_records_drive_the_last_feeding_pointer() {
    let app = app();
    let token = register(&app, "sam").await;
    let animal = create_animal(&app, &token, json!({ "name": "Nagini" })).await;
    let id = animal["id"].as_str().unwrap().to_string();
    assert!(animal["last_feeding_date"].is_null());

    let (status, event) = send(
        &app,
        "POST",
        "/feedings",
        Some(&token),
        Some(json!({
            "animal_id": id,
            "feeding_date": "2024-01-01T00:00:00Z",
            "notes": "two mice",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(event["notes"], "two mice");

    // Fed 9 days before the pinned clock on a 7-day schedule.
    let (_, fetched) = send(&app, "GET", &format!("/animals/{id}"), Some(&token), None).await;
    assert_eq!(fetched["last_feeding_date"], "2024-01-01T00:00:00Z");
    assert_eq!(fetched["feeding_status"]["status"], "overdue");
    assert_eq!(fetched["feeding_status"]["days_since_last_fed"], 9);
    assert_eq!(fetched["feeding_status"]["days_overdue"], 2);
    assert_eq!(fetched["feeding_status"]["is_due_today"], true);

    // Backfilling an older event still rewrites the pointer (last write,
    // not max).
    let (status, _) = send(
        &app,
        "POST",
        "/feedings",
        Some(&token),
        Some(json!({ "animal_id": id, "feeding_date": "2023-12-25T00:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, fetched) = send(&app, "GET", &format!("/animals/{id}"), Some(&token), None).await;
    assert_eq!(fetched["last_feeding_date"], "2023-12-25T00:00:00Z");

    // Newest-first listing, filterable by animal.
    let (_, events) = send(&app, "GET", "/feedings", Some(&token), None).await;
    let events = events.as_array().unwrap().clone();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["feeding_date"], "2024-01-01T00:00:00Z");
    let (_, filtered) = send(
        &app,
        "GET",
        &format!("/feedings?animal_id={id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(filtered.as_array().unwrap().len(), 2);

    // Deleting an event leaves the pointer alone.
    let event_id = events[1]["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/feedings/{event_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, fetched) = send(&app, "GET", &format!("/animals/{id}"), Some(&token), None).await;
    assert_eq!(fetched["last_feeding_date"], "2023-12-25T00:00:00Z");
}

#[tokio::test]
async fn upcoming_feedings_queue_orders_by_priority() {
    let app = app();
    let token = register(&app, "sam").await;

    // Listed alphabetically: alpha (overdue), bravo (due today), charlie
    // (never fed), delta (recent), echo (overdue).
    create_animal(
        &app,
        &token,
        json!({ "name": "alpha", "last_feeding_date": "2024-01-01T00:00:00Z" }),
    )
    .await;
    create_animal(
        &app,
        &token,
        json!({
            "name": "bravo",
            "last_feeding_date": "2024-01-09T00:00:00Z",
            "feeding_frequency_days": 2,
        }),
    )
    .await;
    create_animal(&app, &token, json!({ "name": "charlie" })).await;
    create_animal(
        &app,
        &token,
        json!({ "name": "delta", "last_feeding_date": "2024-01-09T12:00:00Z" }),
    )
    .await;
    create_animal(
        &app,
        &token,
        json!({ "name": "echo", "last_feeding_date": "2023-12-20T00:00:00Z" }),
    )
    .await;

    let (status, queue) = send(&app, "GET", "/animals/upcoming-feedings", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<_> = queue
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap().to_string())
        .collect();
    // Never-fed first, then the two overdue animals in input order (stable
    // ties), then due-today; the recently fed animal is dropped.
    assert_eq!(names, vec!["charlie", "alpha", "echo", "bravo"]);
    assert_eq!(queue[0]["feeding_status"]["priority"], 4);
    assert_eq!(queue[1]["feeding_status"]["priority"], 3);
    assert_eq!(queue[2]["feeding_status"]["priority"], 3);
    assert_eq!(queue[3]["feeding_status"]["priority"], 2);

    // Same snapshot, same queue.
    let (_, again) = send(&app, "GET", "/animals/upcoming-feedings", Some(&token), None).await;
    assert_eq!(queue, again);
}

#[tokio::test]
async fn users_cannot_see_each_others_animals() {
    let app = app();
    let owner = register(&app, "sam").await;
    let intruder = register(&app, "pat").await;

    let animal = create_animal(&app, &owner, json!({ "name": "Nagini" })).await;
    let id = animal["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "GET", &format!("/animals/{id}"), Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/animals/{id}"),
        Some(&intruder),
        Some(json!({ "name": "Stolen" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/feedings",
        Some(&intruder),
        Some(json!({ "animal_id": id, "feeding_date": "2024-01-09T00:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, animals) = send(&app, "GET", "/animals", Some(&intruder), None).await;
    assert!(animals.as_array().unwrap().is_empty());

    // Owner still sees everything untouched.
    let (status, fetched) = send(&app, "GET", &format!("/animals/{id}"), Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Nagini");
}
