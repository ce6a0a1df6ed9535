mod support;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use auth::{AppState, routes::create_router};
use support::{Harness, PASSWORD};

fn router(h: &Harness) -> Router {
    create_router(AppState {
        service: h.service.clone(),
        db_pool: None,
    })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
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
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn register_and_login(app: &Router, email: &str, role: &str) -> (String, String) {
    let (status, user) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": PASSWORD,
            "full_name": "Test Person",
            "role": role,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, login) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": email, "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    (
        user["id"].as_str().unwrap().to_string(),
        login["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_health_endpoint() {
    let h = Harness::new();
    let (status, body) = send(&router(&h), "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_hides_password_hash() {
    let h = Harness::new();
    let app = router(&h);

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": "Sam@Example.org",
            "password": PASSWORD,
            "full_name": "Sam Senior",
            "role": "senior",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "sam@example.org");
    assert_eq!(body["role"], "senior");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_rejects_unknown_role_and_duplicates() {
    let h = Harness::new();
    let app = router(&h);
    register_and_login(&app, "sam@example.org", "senior").await;

    let registration = |email: &str, role: &str| {
        json!({
            "email": email,
            "password": PASSWORD,
            "full_name": "Someone",
            "role": role,
        })
    };

    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(registration("nurse@example.org", "nurse")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(registration("SAM@example.org", "caregiver")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    let h = Harness::new();
    let app = router(&h);

    let (status, body) = send(&app, "GET", "/auth/session", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Access denied");

    let (status, body) = send(&app, "GET", "/auth/session", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Access denied");
}

#[tokio::test]
async fn test_session_and_logout() {
    let h = Harness::new();
    let app = router(&h);
    let (user_id, token) = register_and_login(&app, "sam@example.org", "senior").await;

    let (status, body) = send(&app, "GET", "/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id.as_str());

    let (status, body) = send(&app, "GET", "/auth/sessions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert!(body[0].get("token_hash").is_none());

    let (status, _) = send(&app, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let h = Harness::new();
    let app = router(&h);
    register_and_login(&app, "sam@example.org", "senior").await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "sam@example.org", "password": "Wr0ng!pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid credentials");
}

#[tokio::test]
async fn test_password_change_revokes_sessions() {
    let h = Harness::new();
    let app = router(&h);
    let (_, token) = register_and_login(&app, "sam@example.org", "senior").await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/password",
        Some(&token),
        Some(json!({"current_password": PASSWORD, "new_password": "Tul1ps&Daisies"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked_sessions"], 1);

    let (status, _) = send(&app, "GET", "/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_relationship_lifecycle_over_http() {
    let h = Harness::new();
    let app = router(&h);
    let (_, carol) = register_and_login(&app, "carol@example.org", "caregiver").await;
    let (sam_id, sam) = register_and_login(&app, "sam@example.org", "senior").await;

    let (status, request) = send(
        &app,
        "POST",
        "/relationships",
        Some(&carol),
        Some(json!({"patient_id": sam_id, "notes": "daughter"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");
    let request_id = request["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        "/relationships",
        Some(&carol),
        Some(json!({"patient_id": sam_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, pending) = send(&app, "GET", "/patients/me/requests", Some(&sam), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    // only the patient may answer
    let respond_uri = format!("/relationships/{request_id}/respond");
    let (status, _) = send(
        &app,
        "POST",
        &respond_uri,
        Some(&carol),
        Some(json!({"decision": "approved"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        &respond_uri,
        Some(&sam),
        Some(json!({"decision": "approved"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");

    let (status, patients) =
        send(&app, "GET", "/caregivers/me/patients", Some(&carol), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patients[0]["id"], sam_id.as_str());

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/relationships/{request_id}"),
        Some(&sam),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "removed");

    let (_, patients) = send(&app, "GET", "/caregivers/me/patients", Some(&carol), None).await;
    assert!(patients.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_decision_is_rejected() {
    let h = Harness::new();
    let app = router(&h);
    let (_, carol) = register_and_login(&app, "carol@example.org", "caregiver").await;
    let (sam_id, sam) = register_and_login(&app, "sam@example.org", "senior").await;

    let (_, request) = send(
        &app,
        "POST",
        "/relationships",
        Some(&carol),
        Some(json!({"patient_id": sam_id})),
    )
    .await;
    let request_id = request["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/relationships/{request_id}/respond"),
        Some(&sam),
        Some(json!({"decision": "maybe"})),
    )
    .await;
    assert!(status.is_client_error());

    let (_, pending) = send(&app, "GET", "/patients/me/requests", Some(&sam), None).await;
    assert_eq!(pending[0]["status"], "pending");
}
