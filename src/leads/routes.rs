//! HTTP endpoint for lead submission.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::info;

use super::sink::{LeadSink, SinkResponse};
use crate::conversation::ConversationStage;
use crate::error::{Error, ValidationError};

/// Shared state for lead routes.
#[derive(Clone)]
pub struct LeadRouteState {
    pub sink: Arc<LeadSink>,
}

/// POST /api/log
async fn submit_lead(State(state): State<LeadRouteState>, body: Bytes) -> Result<Response, Error> {
    let body: Value = if body.iter().all(u8::is_ascii_whitespace) {
        json!({})
    } else {
        serde_json::from_slice(&body).map_err(|e| ValidationError::MalformedBody(e.to_string()))?
    };

    info!(stage = ?ConversationStage::Submitted, sink = %state.sink.describe(), "Lead submission received");

    let response = match state.sink.submit(body).await? {
        SinkResponse::Stored(receipt) => {
            let urls = receipt.urls();
            Json(json!({
                "ok": receipt.accepted,
                "photoLinks": urls,
                "references": urls,
            }))
            .into_response()
        }
        SinkResponse::Forwarded(reply) => Json(reply).into_response(),
    };
    Ok(response)
}

async fn post_only() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "POST only" })),
    )
}

/// Build the lead submission routes.
pub fn lead_routes(state: LeadRouteState) -> Router {
    Router::new()
        .route(
            "/api/log",
            post(submit_lead).fallback(post_only),
        )
        .with_state(state)
}
