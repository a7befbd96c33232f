//! HTTP surface: health, help, feedback, tool invocation, plus the
//! onboarding routes.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::context::ToolContext;
use crate::knowledge::ToolMetrics;
use crate::onboarding::{OnboardingManager, OnboardingRouteState, onboarding_routes};
use crate::tools::{ToolError, ToolRegistry};

/// Header naming the chat user on whose behalf a tool is called.
pub const USER_HEADER: &str = "x-user-id";

/// Feature names and one-line descriptions, in display order.
pub const FEATURES: &[(&str, &str)] = &[
    (
        "Onboarding",
        "Guide new joiners with a week-1 checklist, sandbox + dummy data.",
    ),
    (
        "Resources",
        "Find installers, guides, trainings. Try: resources for 'SAP GUI'.",
    ),
    ("Acronyms", "Explain company acronyms. Try: what is 'SFSF'?"),
    (
        "Who to ask",
        "Find the person/owner for a topic. Try: who handles dummy data?",
    ),
    ("Policy Q&A", "Grounded answers with citations (RAG-lite)."),
    (
        "Work feedback",
        "Paste code/docs/slides and say: review this for a Junior Engineer.",
    ),
    ("Feedback on bot", "Thumbs up/down + notes."),
];

/// The `/help` text shown in chat.
pub fn render_help() -> String {
    let mut lines = vec!["Here's what I can do:\n".to_string()];
    lines.extend(
        FEATURES
            .iter()
            .map(|(name, description)| format!("• {name} — {description}")),
    );
    lines.push(
        "\nTips: say \"I just joined\" to start onboarding, or type /help anytime.".to_string(),
    );
    lines.join("\n")
}

/// Shared state for the top-level routes.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<OnboardingManager>,
    pub tools: Arc<ToolRegistry>,
    pub metrics: Arc<ToolMetrics>,
}

fn feature_names() -> Vec<&'static str> {
    FEATURES.iter().map(|(name, _)| *name).collect()
}

/// GET /health
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "features": feature_names(),
        "tool_calls": state.metrics.tool_calls(),
        "tools": state.tools.list(),
        "store": state.manager.backend_name(),
    }))
}

/// GET /api/help
async fn help() -> impl IntoResponse {
    let features: serde_json::Map<String, serde_json::Value> = FEATURES
        .iter()
        .map(|(name, description)| (name.to_string(), json!(description)))
        .collect();
    Json(json!({ "features": features, "text": render_help() }))
}

#[derive(Debug, Default, Deserialize)]
struct FeedbackBody {
    rating: Option<serde_json::Value>,
    #[serde(default)]
    message: String,
    session_id: Option<String>,
}

/// POST /api/feedback
///
/// Feedback is recorded in the log only. An unreadable body is still
/// acknowledged, recorded as empty feedback.
async fn feedback(body: Bytes) -> Response {
    let body: FeedbackBody = if body.iter().all(u8::is_ascii_whitespace) {
        FeedbackBody::default()
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Malformed feedback body");
            FeedbackBody::default()
        })
    };

    let id = Uuid::new_v4();
    tracing::info!(
        feedback_id = %id,
        session_id = body.session_id.as_deref().unwrap_or("unknown"),
        rating = ?body.rating,
        message = %body.message,
        "Feedback received"
    );
    Json(json!({ "message": "Thank you for your feedback!", "id": id })).into_response()
}

/// GET /api/tools
async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "tools": state.tools.tool_definitions() }))
}

fn tool_error_response(err: ToolError) -> Response {
    let status = match &err {
        ToolError::NotFound { .. } => StatusCode::NOT_FOUND,
        ToolError::InvalidParameters { .. } => StatusCode::BAD_REQUEST,
        ToolError::ExecutionFailed { .. } | ToolError::Storage(_) | ToolError::Knowledge(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

/// POST /api/tools/{name}
///
/// The body is the tool's parameter object (empty means `{}`). The
/// `x-user-id` header names the caller for tools that default to it.
async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let params = if body.iter().all(u8::is_ascii_whitespace) {
        json!({})
    } else {
        match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(value) => value,
            Err(e) => {
                return tool_error_response(ToolError::InvalidParameters {
                    name,
                    reason: e.to_string(),
                });
            }
        }
    };

    let ctx = match headers.get(USER_HEADER).and_then(|v| v.to_str().ok()) {
        Some(user) => ToolContext::for_user(user),
        None => ToolContext::default(),
    };

    match state.tools.execute(&name, params, &ctx).await {
        Ok(output) => Json(output).into_response(),
        Err(e) => tool_error_response(e),
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let onboarding = onboarding_routes(OnboardingRouteState {
        manager: Arc::clone(&state.manager),
    });

    Router::new()
        .route("/health", get(health))
        .route("/api/help", get(help))
        .route("/api/feedback", post(feedback))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/{name}", post(call_tool))
        .with_state(state)
        .merge(onboarding)
        .layer(ServiceBuilder::new().layer(cors))
}
