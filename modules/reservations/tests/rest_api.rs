//! REST surface through the full router: bearer auth, role resolution and
//! problem documents.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use common::memory_db;
use http_body_util::BodyExt;
use reservations::config::ReservationsConfig;
use reservations::contract::model::{Profile, Role};
use reservations::domain::repo::ProfilesRepository;
use reservations::infra::storage::SeaOrmProfilesRepository;
use reservations::Reservations;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const STUDENT: &str = "student-token";
const OTHER: &str = "other-token";
const STAFF: &str = "staff-token";

async fn app() -> Router {
    let db = memory_db().await;
    let staff_id = Uuid::new_v4();
    SeaOrmProfilesRepository::new(db.clone())
        .insert(&Profile {
            id: staff_id,
            role: Some(Role::Staff),
            email: Some("staff@uni.test".into()),
            created_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    let cfg: ReservationsConfig = serde_json::from_value(json!({
        "mutation_timeout": "5s",
        "seed_rooms": ["Room B", "Room A"],
        "api_tokens": {
            "student-token": { "id": Uuid::new_v4(), "email": "s@uni.test" },
            "other-token": { "id": Uuid::new_v4(), "email": "o@uni.test" },
            "staff-token": { "id": staff_id, "email": "staff@uni.test" },
        }
    }))
    .unwrap();

    Reservations::init(db, cfg).await.unwrap().router()
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, content_type, json)
}

async fn first_room(app: &Router) -> String {
    let (status, _, rooms) = call(app, "GET", "/rooms", Some(STUDENT), None).await;
    assert_eq!(status, StatusCode::OK);
    rooms[0]["id"].as_str().unwrap().to_string()
}

fn draft(room_id: &str) -> Value {
    json!({
        "room_id": room_id,
        "title": "Reading group",
        "start_time": "2099-05-01T09:00:00Z",
        "end_time": "2099-05-01T10:00:00Z"
    })
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = app().await;
    let (status, _, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_or_unknown_token_is_401_problem() {
    let app = app().await;
    for token in [None, Some("nope")] {
        let (status, ct, body) = call(&app, "GET", "/reservations", token, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(ct.as_deref(), Some("application/problem+json"));
        assert_eq!(body["code"], "RESERVATIONS_UNAUTHENTICATED");
        assert_eq!(body["instance"], "/reservations");
    }
}

#[tokio::test]
async fn me_bootstraps_a_student_profile() {
    let app = app().await;
    let (status, _, me) = call(&app, "GET", "/me", Some(STUDENT), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "student");
    assert_eq!(me["email"], "s@uni.test");
    assert_eq!(me["can_create"], true);

    let (_, _, staff) = call(&app, "GET", "/me", Some(STAFF), None).await;
    assert_eq!(staff["role"], "staff");
    assert_eq!(staff["can_create"], false);
}

#[tokio::test]
async fn rooms_are_seeded_and_sorted() {
    let app = app().await;
    let (_, _, rooms) = call(&app, "GET", "/rooms", Some(STUDENT), None).await;
    let names: Vec<_> = rooms
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Room A", "Room B"]);
}

#[tokio::test]
async fn full_lifecycle_over_http() {
    let app = app().await;
    let room = first_room(&app).await;

    let (status, _, _) = call(&app, "POST", "/reservations", Some(STAFF), Some(draft(&room))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, created) =
        call(&app, "POST", "/reservations", Some(STUDENT), Some(draft(&room))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["allowed_actions"], json!(["cancel"]));
    let id = created["id"].as_str().unwrap().to_string();

    // Another student sees no actions and may not cancel.
    let (_, _, seen) = call(&app, "GET", &format!("/reservations/{id}"), Some(OTHER), None).await;
    assert_eq!(seen["allowed_actions"], json!([]));
    let (status, _, body) =
        call(&app, "POST", &format!("/reservations/{id}/cancel"), Some(OTHER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "RESERVATIONS_FORBIDDEN");

    let (status, _, t) =
        call(&app, "POST", &format!("/reservations/{id}/approve"), Some(STAFF), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(t["changed"], true);
    assert_eq!(t["reservation"]["status"], "approved");

    let (status, _, again) =
        call(&app, "POST", &format!("/reservations/{id}/approve"), Some(STAFF), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["changed"], false);

    let (status, ct, body) =
        call(&app, "POST", &format!("/reservations/{id}/cancel"), Some(STUDENT), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(ct.as_deref(), Some("application/problem+json"));
    assert_eq!(body["status"], 409);

    let (status, _, edited) = call(
        &app,
        "PATCH",
        &format!("/reservations/{id}"),
        Some(STAFF),
        Some(json!({ "title": "Moved reading group" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["title"], "Moved reading group");
    assert_eq!(edited["allowed_actions"], json!(["edit", "delete"]));

    let (status, _, _) =
        call(&app, "DELETE", &format!("/reservations/{id}"), Some(STAFF), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, body) =
        call(&app, "GET", &format!("/reservations/{id}"), Some(STAFF), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "RESERVATIONS_NOT_FOUND");
}

#[tokio::test]
async fn list_filters_and_validation() {
    let app = app().await;
    let room = first_room(&app).await;
    call(&app, "POST", "/reservations", Some(STUDENT), Some(draft(&room))).await;
    let mut later = draft(&room);
    later["start_time"] = json!("2099-06-01T09:00:00Z");
    later["end_time"] = json!("2099-06-01T11:00:00Z");
    call(&app, "POST", "/reservations", Some(OTHER), Some(later)).await;

    let (_, _, all) = call(&app, "GET", "/reservations", Some(STAFF), None).await;
    assert_eq!(all["total"], 2);
    assert_eq!(all["reservations"][0]["start_time"], "2099-05-01T09:00:00Z");

    let (_, _, mine) = call(&app, "GET", "/reservations?mine=true", Some(OTHER), None).await;
    assert_eq!(mine["total"], 1);

    let (status, _, body) =
        call(&app, "GET", "/reservations?status=bogus", Some(STAFF), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "RESERVATIONS_VALIDATION");

    let (status, _, _) = call(
        &app,
        "GET",
        "/reservations?from=2099-07-01T00:00:00Z&to=2099-01-01T00:00:00Z",
        Some(STAFF),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_window_is_400() {
    let app = app().await;
    let room = first_room(&app).await;
    let mut body = draft(&room);
    body["end_time"] = json!("2099-05-01T08:00:00Z");

    let (status, _, problem) = call(&app, "POST", "/reservations", Some(STUDENT), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["title"], "Validation error");
}

#[tokio::test]
async fn stats_reflect_the_store() {
    let app = app().await;
    let room = first_room(&app).await;
    call(&app, "POST", "/reservations", Some(STUDENT), Some(draft(&room))).await;

    let (status, _, stats) = call(&app, "GET", "/stats", Some(STUDENT), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, json!({ "rooms": 2, "reservations": 1, "pending": 1, "my_upcoming": 1 }));
}
