//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::{ConnectInfo, Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use axum_extra::{TypedHeader, headers::UserAgent};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{AuthError, AuthResult},
    guard::Caller,
    middleware::{SessionToken, auth_middleware},
    models::{ClientMeta, Decision, LoginCredentials, RegisterUser, UserSummary},
    state::AppState,
};

/// Request for a caregiver's access request
#[derive(Deserialize)]
pub struct AccessRequestBody {
    pub patient_id: Uuid,
    pub notes: Option<String>,
}

/// Request for answering an access request
#[derive(Deserialize)]
pub struct RespondRequest {
    pub decision: Decision,
}

/// Request for changing the caller's password
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(current_session))
        .route("/auth/sessions", get(list_sessions))
        .route("/auth/password", post(change_password))
        .route("/relationships", post(request_access))
        .route("/relationships/:id/respond", post(respond_to_request))
        .route("/relationships/:id", delete(remove_relationship))
        .route("/caregivers/me/patients", get(list_caregiver_patients))
        .route("/patients/me/requests", get(list_patient_requests))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.db_pool {
        Some(pool) => common::database::health_check(pool).await.unwrap_or(false),
        None => true,
    };

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if database { "ok" } else { "degraded" },
            "service": "auth-service",
            "database": database,
        })),
    )
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUser>,
) -> AuthResult<impl IntoResponse> {
    let user = state.service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    user_agent: Option<TypedHeader<UserAgent>>,
    Json(payload): Json<LoginCredentials>,
) -> AuthResult<impl IntoResponse> {
    let meta = ClientMeta {
        ip_address: connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()),
        user_agent: user_agent.map(|TypedHeader(agent)| agent.as_str().to_string()),
    };

    let output = state.service.login(payload, meta).await?;
    Ok((StatusCode::OK, Json(output)))
}

/// Logout endpoint, revokes the presented token
pub async fn logout(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> AuthResult<impl IntoResponse> {
    state.service.logout(&token).await?;
    info!("User {} logged out", caller.user_id);

    Ok(Json(json!({"message": "Logged out successfully"})))
}

/// Returns the user the token belongs to
pub async fn current_session(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AuthResult<impl IntoResponse> {
    let user = state
        .service
        .credentials()
        .find_user(caller.user_id)
        .await?
        .ok_or(AuthError::SessionNotFound)?;

    Ok(Json(user))
}

/// Lists the caller's active sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AuthResult<impl IntoResponse> {
    let sessions = state.service.sessions().list_for_user(caller.user_id).await?;
    Ok(Json(sessions))
}

/// Changes the caller's password and signs out every session
pub async fn change_password(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<ChangePasswordRequest>,
) -> AuthResult<impl IntoResponse> {
    let revoked = state
        .service
        .change_password(caller.user_id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(Json(json!({
        "message": "Password changed, please sign in again",
        "revoked_sessions": revoked,
    })))
}

/// Caregiver asks for access to a senior's records
pub async fn request_access(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<AccessRequestBody>,
) -> AuthResult<impl IntoResponse> {
    let relationship = state
        .service
        .relationships()
        .request_access(caller.user_id, payload.patient_id, payload.notes)
        .await?;

    Ok((StatusCode::CREATED, Json(relationship)))
}

/// Patient approves or rejects a pending request
pub async fn respond_to_request(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RespondRequest>,
) -> AuthResult<impl IntoResponse> {
    let relationship = state
        .service
        .relationships()
        .respond_to_request(id, caller.user_id, payload.decision)
        .await?;

    Ok(Json(relationship))
}

/// Either party ends an approved relationship
pub async fn remove_relationship(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> AuthResult<impl IntoResponse> {
    let relationship = state
        .service
        .relationships()
        .remove_relationship(id, caller.user_id)
        .await?;

    Ok(Json(relationship))
}

/// Patients the calling caregiver has approved access to
pub async fn list_caregiver_patients(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AuthResult<impl IntoResponse> {
    let patients: Vec<UserSummary> = state
        .service
        .relationships()
        .list_patients_for_caregiver(caller.user_id)
        .await?
        .iter()
        .map(UserSummary::from)
        .collect();

    Ok(Json(patients))
}

/// Pending requests addressed to the calling patient
pub async fn list_patient_requests(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AuthResult<impl IntoResponse> {
    let requests = state
        .service
        .relationships()
        .list_pending_requests_for_patient(caller.user_id)
        .await?;

    Ok(Json(requests))
}
