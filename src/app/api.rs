use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use super::composer::Services;
use crate::error::MissionControlError;
use crate::mission::Mission;
use crate::queues::{StartOutcome, StatusReport, StopOutcome};
use crate::registry::MissionSummary;

pub fn router(services: Arc<Services>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/missions", get(list_missions))
        .route("/missions/{id}", get(get_mission))
        .route("/schedule/start-mission/{id}", post(start_mission))
        .route("/schedule/stop-mission", post(stop_mission))
        .route("/schedule/status", get(mission_status))
        .with_state(services)
}

/// Error rendered as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    fn not_found(id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("Mission {} not found", id))
    }
}

impl From<MissionControlError> for ApiError {
    fn from(err: MissionControlError) -> Self {
        let status = match &err {
            MissionControlError::MissionNotFound(_) => StatusCode::NOT_FOUND,
            MissionControlError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            MissionControlError::QueueFull { .. } | MissionControlError::QueueDisconnected { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %err, status = status.as_u16(), "Request failed");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct MissionList {
    pub missions: Vec<MissionSummary>,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Registry problems show up as an empty list.
pub async fn list_missions(State(services): State<Arc<Services>>) -> Json<MissionList> {
    let missions = services.registry.list_missions().await.unwrap_or_default();
    debug!(count = missions.len(), "Listing missions");
    Json(MissionList { missions })
}

pub async fn get_mission(
    State(services): State<Arc<Services>>,
    Path(id): Path<String>,
) -> Result<Json<Mission>, ApiError> {
    services
        .registry
        .get_mission_by_key(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(&id))
}

pub async fn start_mission(
    State(services): State<Arc<Services>>,
    Path(id): Path<String>,
) -> Result<Json<StartOutcome>, ApiError> {
    match services.scheduler.start_mission(&id).await? {
        outcome @ StartOutcome::Started { .. } => Ok(Json(outcome)),
        StartOutcome::Busy { current } => Err(ApiError::new(
            StatusCode::CONFLICT,
            format!("Mission {} is already running", current),
        )),
        StartOutcome::NotFound { .. } => Err(ApiError::not_found(&id)),
    }
}

pub async fn stop_mission(
    State(services): State<Arc<Services>>,
) -> Result<Json<StopOutcome>, ApiError> {
    Ok(Json(services.scheduler.stop_mission().await?))
}

pub async fn mission_status(
    State(services): State<Arc<Services>>,
) -> Result<Json<StatusReport>, ApiError> {
    Ok(Json(services.scheduler.mission_status().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_error_body_has_detail() {
        let response = ApiError::from(MissionControlError::Timeout("no reply".into())).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["detail"], "Operation timed out: no reply");
    }

    #[test]
    fn test_status_mapping() {
        let not_found = ApiError::from(MissionControlError::MissionNotFound("4".into()));
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);

        let full = ApiError::from(MissionControlError::QueueFull {
            queue: "start_mission",
        });
        assert_eq!(full.status, StatusCode::SERVICE_UNAVAILABLE);

        let storage = ApiError::from(MissionControlError::Storage("disk".into()));
        assert_eq!(storage.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
