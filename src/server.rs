//! HTTP server assembly: routes, CORS, body limit, error mapping.

use std::any::Any;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::conversation::{ConversationOrchestrator, ConversationRouteState, conversation_routes};
use crate::error::{Error, ValidationError};
use crate::leads::{LeadRouteState, LeadSink, lead_routes};

/// Build the full application router.
pub fn build_router(
    orchestrator: Arc<ConversationOrchestrator>,
    sink: Arc<LeadSink>,
    max_body_bytes: usize,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health))
        .merge(conversation_routes(ConversationRouteState { orchestrator }))
        .merge(lead_routes(LeadRouteState { sink }))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(preflight_no_content))
                .layer(cors)
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        )
}

/// Empty preflight responses go out as 204.
async fn preflight_no_content(request: Request, next: Next) -> Response {
    let is_options = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if is_options && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

/// Report a handler panic as `Error::Internal`.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    };
    Error::Internal(detail).into_response()
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "trades-intake"
    }))
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Error::Validation(ValidationError::MissingInput) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "No prompt or messages" }),
            ),
            Error::Validation(ValidationError::MalformedBody(detail)) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Malformed request body", "detail": detail }),
            ),
            Error::Upstream(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Upstream error", "detail": e.detail() }),
            ),
            Error::Storage(e) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "Failed to log lead with images.", "detail": e.to_string() }),
            ),
            Error::Config(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": e.to_string() }),
            ),
            Error::Internal(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Server error", "detail": detail }),
            ),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (status, Json(body)).into_response()
    }
}
