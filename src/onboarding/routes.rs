//! REST endpoints for onboarding progress.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::DatabaseError;

use super::command::parse_done;
use super::manager::OnboardingManager;
use super::report::MarkOutcome;

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub manager: Arc<OnboardingManager>,
}

/// Failure of an onboarding endpoint.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Storage(DatabaseError),
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        Self::Storage(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Self::Storage(e) => {
                tracing::error!(error = %e, "Onboarding store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": e.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

/// Parse an optional JSON body. An empty body yields the default.
fn optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid body: {e}")))
}

/// `done` accepts a JSON boolean or the chat-command spellings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DoneFlag {
    Bool(bool),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
struct MarkStepBody {
    done: Option<DoneFlag>,
}

#[derive(Debug, Default, Deserialize)]
struct DummyDataBody {
    dataset: Option<String>,
    size: Option<String>,
}

/// GET /api/onboarding/{user}/checklist
async fn get_checklist(
    State(state): State<OnboardingRouteState>,
    Path(user): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let view = state.manager.get_checklist(&user).await?;
    Ok(Json(json!({
        "user_id": view.user_id,
        "items": view.items,
        "completed": view.completed(),
        "total": view.total(),
        "text": view.to_string(),
    })))
}

/// POST /api/onboarding/{user}/steps/{step_id}
///
/// Body `{"done": true}`; a missing body or flag marks the step done.
/// Unknown step ids answer 404 with the available ids.
async fn mark_step(
    State(state): State<OnboardingRouteState>,
    Path((user, step_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let body: MarkStepBody = optional_body(&body)?;
    let done = match body.done {
        None => true,
        Some(DoneFlag::Bool(b)) => b,
        Some(DoneFlag::Text(s)) => parse_done(&s),
    };

    let outcome = state.manager.mark_step(&user, &step_id, done).await?;
    let text = outcome.to_string();
    let response = match &outcome {
        MarkOutcome::Marked { .. } => {
            let mut value = serde_json::to_value(&outcome)
                .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
            value["text"] = json!(text);
            Json(value).into_response()
        }
        MarkOutcome::UnknownStep { available, .. } => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": text, "available": available })),
        )
            .into_response(),
    };
    Ok(response)
}

/// POST /api/onboarding/{user}/sandbox
async fn request_sandbox(
    State(state): State<OnboardingRouteState>,
    Path(user): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ticket = state.manager.request_sandbox_access(&user).await?;
    Ok(Json(json!({
        "user_id": ticket.user_id,
        "ticket_id": ticket.ticket_id,
        "text": ticket.to_string(),
    })))
}

/// POST /api/onboarding/{user}/dummy-data
///
/// Body `{"dataset": "...", "size": "..."}`, both optional.
async fn request_dummy_data(
    State(state): State<OnboardingRouteState>,
    Path(user): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let body: DummyDataBody = optional_body(&body)?;
    let receipt = state
        .manager
        .request_dummy_data(&user, body.dataset.as_deref(), body.size.as_deref())
        .await?;
    Ok(Json(json!({
        "user_id": receipt.user_id,
        "request_id": receipt.request_id,
        "dataset": receipt.dataset,
        "size": receipt.size,
        "text": receipt.to_string(),
    })))
}

/// GET /api/onboarding/{user}/history
async fn get_history(
    State(state): State<OnboardingRouteState>,
    Path(user): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let history = state.manager.history(&user).await?;
    Ok(Json(json!({
        "user_id": crate::onboarding::model::normalize_user_id(&user),
        "history": history,
    })))
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: OnboardingRouteState) -> Router {
    Router::new()
        .route("/api/onboarding/{user}/checklist", get(get_checklist))
        .route("/api/onboarding/{user}/steps/{step_id}", post(mark_step))
        .route("/api/onboarding/{user}/sandbox", post(request_sandbox))
        .route("/api/onboarding/{user}/dummy-data", post(request_dummy_data))
        .route("/api/onboarding/{user}/history", get(get_history))
        .with_state(state)
}
