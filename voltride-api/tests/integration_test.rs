use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use voltride_api::{
    app,
    sessions::SessionRegistry,
    state::{AppState, AuthConfig},
};
use voltride_catalog::Fleet;
use voltride_core::{CodePolicy, SessionConfig};

fn test_state(max_code_attempts: Option<u32>) -> AppState {
    let fleet = Arc::new(Fleet::demo());
    let config = SessionConfig {
        code_policy: CodePolicy::Fixed,
        max_code_attempts,
        ..SessionConfig::default()
    };
    AppState {
        sessions: Arc::new(SessionRegistry::new(config, fleet.clone())),
        fleet,
        auth: AuthConfig {
            secret: "test-secret".to_string(),
            expiration: 3600,
        },
    }
}

fn test_app(max_code_attempts: Option<u32>) -> Router {
    app(test_state(max_code_attempts))
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
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
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn guest_token(app: &Router) -> String {
    let (status, body) = send(app, "POST", "/v1/auth/guest", None, None).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_rider_routes_require_token() {
    let app = test_app(None);
    let (status, _) = send(&app, "GET", "/v1/bookings/current", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/v1/vehicles", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_vehicle_listing_and_search() {
    let app = test_app(None);
    let token = guest_token(&app).await;

    let (status, body) = send(&app, "GET", "/v1/vehicles", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 6);

    let (_, body) = send(&app, "GET", "/v1/vehicles?q=van", Some(&token), None).await;
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["id"], "demo-4");
    assert_eq!(hits[0]["type"], "Van");

    let (status, _) = send(&app, "GET", "/v1/vehicles/demo-99", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_unlock_and_end_trip() {
    let app = test_app(None);
    let token = guest_token(&app).await;

    let (status, body) = send(&app, "GET", "/v1/bookings/current", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "IDLE");
    assert_eq!(body["remaining_display"], "00:00");

    let (status, body) =
        send(&app, "POST", "/v1/bookings", Some(&token), Some(json!({ "vehicle_id": "demo-2" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "PENDING_VERIFICATION");
    assert_eq!(body["vehicle_id"], "demo-2");
    assert_eq!(body["pending_code"], "123456");
    assert_eq!(body["vehicle"]["name"], "Sedan");

    let (status, body) =
        send(&app, "POST", "/v1/bookings/verify", Some(&token), Some(json!({ "code": "000000" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "code_mismatch");

    let (status, body) =
        send(&app, "POST", "/v1/bookings/verify", Some(&token), Some(json!({ "code": " 123456 " }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "ACTIVE");
    assert_eq!(body["remaining_seconds"], 900);
    assert_eq!(body["verified"], true);
    assert!(body["pending_code"].is_null());

    let (status, body) = send(&app, "POST", "/v1/bookings/end", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["closed"], true);
    assert_eq!(body["phase"], "IDLE");
    assert!(body["vehicle_id"].is_null());

    let (_, body) = send(&app, "POST", "/v1/bookings/end", Some(&token), None).await;
    assert_eq!(body["closed"], false);
}

#[tokio::test]
async fn test_errors_are_distinguishable() {
    let app = test_app(None);
    let token = guest_token(&app).await;

    let (status, body) =
        send(&app, "POST", "/v1/bookings", Some(&token), Some(json!({ "vehicle_id": "v-404" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "unknown_vehicle");

    let (status, body) =
        send(&app, "POST", "/v1/bookings/verify", Some(&token), Some(json!({ "code": "123456" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "no_active_session");
}

#[tokio::test]
async fn test_cancel_then_rebook_other_vehicle() {
    let app = test_app(None);
    let token = guest_token(&app).await;

    send(&app, "POST", "/v1/bookings", Some(&token), Some(json!({ "vehicle_id": "demo-1" }))).await;
    let (_, body) = send(&app, "POST", "/v1/bookings/cancel", Some(&token), None).await;
    assert_eq!(body["closed"], true);
    assert_eq!(body["phase"], "IDLE");

    let (_, body) =
        send(&app, "POST", "/v1/bookings", Some(&token), Some(json!({ "vehicle_id": "demo-5" }))).await;
    assert_eq!(body["vehicle_id"], "demo-5");
    assert_eq!(body["vehicle"]["type"], "Coupe");
}

#[tokio::test]
async fn test_riders_have_independent_sessions() {
    let app = test_app(None);
    let first = guest_token(&app).await;
    let second = guest_token(&app).await;

    send(&app, "POST", "/v1/bookings", Some(&first), Some(json!({ "vehicle_id": "demo-3" }))).await;

    let (_, body) = send(&app, "GET", "/v1/bookings/current", Some(&second), None).await;
    assert_eq!(body["phase"], "IDLE");
    let (_, body) = send(&app, "GET", "/v1/bookings/current", Some(&first), None).await;
    assert_eq!(body["phase"], "PENDING_VERIFICATION");
}

#[tokio::test]
async fn test_attempt_limit_reported() {
    let app = test_app(Some(2));
    let token = guest_token(&app).await;
    send(&app, "POST", "/v1/bookings", Some(&token), Some(json!({ "vehicle_id": "demo-1" }))).await;

    let (status, body) =
        send(&app, "POST", "/v1/bookings/verify", Some(&token), Some(json!({ "code": "1" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["attempts_remaining"], 1);

    let (status, body) =
        send(&app, "POST", "/v1/bookings/verify", Some(&token), Some(json!({ "code": "2" }))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "attempts_exhausted");

    let (_, body) = send(&app, "GET", "/v1/bookings/current", Some(&token), None).await;
    assert_eq!(body["phase"], "IDLE");
}

#[tokio::test]
async fn test_closed_bookings_release_rider_sessions() {
    let state = test_state(None);
    let sessions = state.sessions.clone();
    let app = app(state);

    for _ in 0..20 {
        let token = guest_token(&app).await;
        let (status, _) = send(&app, "POST", "/v1/bookings", Some(&token), Some(json!({ "vehicle_id": "demo-1" }))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, "POST", "/v1/bookings/cancel", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["closed"], true);
    }
    assert!(sessions.is_empty());

    let token = guest_token(&app).await;
    send(&app, "POST", "/v1/bookings", Some(&token), Some(json!({ "vehicle_id": "demo-1" }))).await;
    send(&app, "POST", "/v1/bookings/verify", Some(&token), Some(json!({ "code": "123456" }))).await;
    assert_eq!(sessions.len(), 1);

    let (status, body) = send(&app, "POST", "/v1/bookings/end", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "IDLE");
    assert!(sessions.is_empty());

    send(&app, "GET", "/v1/bookings/current", Some(&token), None).await;
    assert!(sessions.is_empty());
}
