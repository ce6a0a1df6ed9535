//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use auth::{middleware::SessionToken, models::Capability};

use crate::{
    error::{ApiError, ApiResult},
    middleware::bearer_middleware,
    models::{AlertsResponse, ReadingQuery},
    state::AppState,
    vitals,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/patients/:id/vitals", get(get_vitals))
        .route("/patients/:id/alerts", get(get_alerts))
        .route_layer(middleware::from_fn(bearer_middleware));

    Router::new()
        .route("/health", get(health_check))
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
            "service": "api-service",
        })),
    )
}

/// Current (or point-in-time) vital signs of a patient
pub async fn get_vitals(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    Path(patient_id): Path<Uuid>,
    WithRejection(Query(query), _): WithRejection<Query<ReadingQuery>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let caller = state
        .guard
        .authorize(&token, patient_id, Capability::Read)
        .await?;

    let reading = vitals::simulate(patient_id, query.at.unwrap_or_else(Utc::now));
    info!("User {} read vitals of patient {}", caller.user_id, patient_id);

    Ok(Json(reading))
}

/// Threshold alerts for a patient's reading
pub async fn get_alerts(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    Path(patient_id): Path<Uuid>,
    WithRejection(Query(query), _): WithRejection<Query<ReadingQuery>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let caller = state
        .guard
        .authorize(&token, patient_id, Capability::Read)
        .await?;

    let reading = vitals::simulate(patient_id, query.at.unwrap_or_else(Utc::now));
    let alerts = vitals::alerts_for(&reading);
    info!(
        "User {} read {} alerts of patient {}",
        caller.user_id,
        alerts.len(),
        patient_id
    );

    Ok(Json(AlertsResponse {
        patient_id,
        recorded_at: reading.recorded_at,
        vitals: reading,
        alerts,
    }))
}
